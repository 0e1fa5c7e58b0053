//! Error types for Dreammixer.

use thiserror::Error;

/// Main error type for mixer operations.
#[derive(Error, Debug)]
pub enum MixerError {
    #[error("failed to fetch source '{locator}': {source}")]
    Fetch {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode source '{locator}': {reason}")]
    Decode { locator: String, reason: String },

    #[error("audio output never became ready after {attempts} activation attempts")]
    ActivationTimeout { attempts: u32 },

    #[error("unknown or inactive channel: {0}")]
    UnknownChannel(String),

    #[error("audio backend error: {0}")]
    Backend(String),

    #[error("audio output is suspended and could not be resumed")]
    Suspended,
}

/// Result type alias for mixer operations.
pub type Result<T> = std::result::Result<T, MixerError>;
