//! The output-path seam.
//!
//! The engine never talks to the audio device directly; it goes through
//! [`OutputBackend`], the single shared output path, and the per-channel
//! [`Voice`] handles it hands out. The real implementation lives in
//! [`crate::cpal_backend`]; tests use [`crate::testing::FakeOutput`].

use std::time::Duration;

use dreammixer_core::Result;

use crate::source::DecodedSource;

/// Whether the shared output path is currently producing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    /// The host paused output (backgrounding, device switch). Playback
    /// resumes only after an explicit [`OutputBackend::resume`].
    Suspended,
}

/// One looping playback slot on the output path.
///
/// Gain changes are linear ramps applied in the mix callback rather than
/// instantaneous jumps, so raising, lowering, or zeroing a voice never
/// produces an audible click.
///
/// Handles live on the engine thread; `cpal::Stream` is not `Send`, so
/// neither trait here requires it. Cross-thread communication with the
/// audio callback is the implementation's business.
pub trait Voice {
    /// Begin looped playback at the current gain. Idempotent.
    fn start(&mut self);

    /// Ramp gain to `target` over `ramp`. Valid in any state; a target of
    /// zero does not halt the transport.
    fn set_gain(&mut self, target: f32, ramp: Duration);

    /// Ramp gain to zero over `ramp`, then halt the transport. Idempotent;
    /// a stop issued during an earlier stop's ramp is last-writer-wins.
    fn stop(&mut self, ramp: Duration);

    /// Whether a stop's ramp has completed and the transport is halted.
    fn is_stopped(&self) -> bool;
}

/// The single shared output path. Constructed once by the activation
/// manager inside a user gesture; only the engine may create voices on it.
pub trait OutputBackend {
    /// Register a new looping voice for `source`, initially at gain zero
    /// and not started.
    fn create_voice(&mut self, source: DecodedSource) -> Box<dyn Voice>;

    fn state(&self) -> OutputState;

    /// Ask the host to resume a suspended output path.
    fn resume(&mut self) -> Result<()>;
}
