//! Audio activation.
//!
//! Browsers and mobile hosts refuse to open an audio output path outside a
//! user gesture, and may suspend a running one at any time. The activation
//! manager owns the output-path handle: it constructs the backend on the
//! first gesture (retrying on a bounded backoff schedule), reports state
//! for the snapshot, and resumes a suspended path on demand. The engine
//! consults it before every audible operation and never bypasses it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use dreammixer_core::{Clock, MixerError, Result};

use crate::backend::{OutputBackend, OutputState};

/// Lifecycle of the shared output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationState {
    /// No gesture seen yet; no output path exists.
    Uninitialized,
    /// Gesture seen, construction failed at least once, retry pending.
    Activating,
    Ready,
    /// The host paused the output path.
    Suspended,
    /// Construction attempts exhausted; no channel can play until restart.
    Failed,
}

/// Bounded retry schedule for output-path construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Constructs the output path; called inside the first user gesture.
pub type BackendFactory = Box<dyn FnMut() -> Result<Box<dyn OutputBackend>>>;

pub struct ActivationManager {
    factory: BackendFactory,
    backend: Option<Box<dyn OutputBackend>>,
    state: ActivationState,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    attempts: u32,
    next_attempt_at: Option<Duration>,
    gesture_seen: bool,
}

impl ActivationManager {
    pub fn new(factory: BackendFactory, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            factory,
            backend: None,
            state: ActivationState::Uninitialized,
            policy,
            clock,
            attempts: 0,
            next_attempt_at: None,
            gesture_seen: false,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ActivationState::Ready
    }

    /// The output path, once ready.
    pub fn output_mut(&mut self) -> Option<&mut dyn OutputBackend> {
        if self.state == ActivationState::Ready {
            self.backend.as_mut().map(|b| &mut **b as &mut dyn OutputBackend)
        } else {
            None
        }
    }

    /// First user interaction. One-shot: later gestures are no-ops, just
    /// as the original unlock listeners de-register after first firing.
    pub fn on_user_gesture(&mut self) {
        if self.gesture_seen {
            return;
        }
        self.gesture_seen = true;
        info!("first user gesture, unlocking audio output");
        self.try_activate();
    }

    /// Drive pending work: construction retries and suspension detection.
    pub fn poll(&mut self) {
        match self.state {
            ActivationState::Activating => {
                if let Some(due) = self.next_attempt_at {
                    if self.clock.now() >= due {
                        self.try_activate();
                    }
                }
            }
            ActivationState::Ready => {
                let suspended = self
                    .backend
                    .as_ref()
                    .is_some_and(|b| b.state() == OutputState::Suspended);
                if suspended {
                    warn!("audio output suspended by host");
                    self.state = ActivationState::Suspended;
                }
            }
            _ => {}
        }
    }

    /// Resume a suspended output path. Called by the engine before the next
    /// audible operation.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != ActivationState::Suspended {
            return Ok(());
        }
        let backend = self
            .backend
            .as_mut()
            .ok_or(MixerError::Suspended)?;
        backend.resume()?;
        self.state = ActivationState::Ready;
        Ok(())
    }

    fn try_activate(&mut self) {
        self.attempts += 1;
        match (self.factory)() {
            Ok(backend) => {
                self.backend = Some(backend);
                self.state = ActivationState::Ready;
                self.next_attempt_at = None;
                info!(attempts = self.attempts, "audio output path ready");
            }
            Err(e) => {
                if self.attempts >= self.policy.max_attempts {
                    self.state = ActivationState::Failed;
                    self.next_attempt_at = None;
                    let timeout = MixerError::ActivationTimeout {
                        attempts: self.attempts,
                    };
                    error!("activation failed permanently: {timeout} (last error: {e})");
                } else {
                    self.state = ActivationState::Activating;
                    self.next_attempt_at = Some(self.clock.now() + self.policy.backoff);
                    warn!(
                        attempt = self.attempts,
                        max = self.policy.max_attempts,
                        "audio output construction failed, will retry: {e}"
                    );
                }
            }
        }
    }
}
