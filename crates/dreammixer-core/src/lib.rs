//! Dreammixer Core - Foundation types for the ambient sound mixer
//!
//! This crate provides the fundamental types used throughout Dreammixer:
//! - Error taxonomy and `Result` alias
//! - Volume percentages and effective-gain math
//! - A clock abstraction so time-dependent logic is testable without sleeping

pub mod clock;
pub mod error;
pub mod volume;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{MixerError, Result};
pub use volume::{effective_gain, Volume};
