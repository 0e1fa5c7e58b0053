//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dreammixer_core::Volume;

use crate::activation::RetryPolicy;

/// Tunables for the mixer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory that source locators resolve under.
    pub asset_root: PathBuf,
    /// Volume a channel gets when toggled on from zero.
    pub default_toggle_volume: Volume,
    /// Master volume at engine construction.
    pub master_default: Volume,
    /// Ramp applied to ordinary gain changes.
    pub gain_ramp: Duration,
    /// Fade-out ramp before a stop tears the transport down.
    pub stop_ramp: Duration,
    pub activation_retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            default_toggle_volume: Volume::new(20),
            master_default: Volume::new(70),
            gain_ramp: Duration::from_millis(50),
            stop_ramp: Duration::from_millis(80),
            activation_retry: RetryPolicy::default(),
        }
    }
}
