//! The real output path: a cpal stream mixing all voices.
//!
//! One output stream for the whole mixer. Voices are slots in a shared
//! table; the audio callback walks the table each buffer, advancing every
//! started voice through its looped source with per-frame linear gain
//! ramping, and sums the result. Voice handles on the engine thread mutate
//! the same table behind a short-held mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{info, warn};

use dreammixer_core::{MixerError, Result};

use crate::backend::{OutputBackend, OutputState, Voice};
use crate::source::DecodedSource;

/// Mixing state for one voice, owned by the audio callback.
struct VoiceSlot {
    samples: Arc<[f32]>,
    src_channels: u16,
    /// Fractional frame position into the source.
    position: f64,
    /// Source frames per output frame (naive rate conversion).
    step: f64,
    gain: f32,
    gain_target: f32,
    /// Output frames remaining in the current ramp.
    ramp_frames: u32,
    started: bool,
    /// Halt the transport once the ramp reaches its target (stop-with-fade).
    halt_at_ramp_end: bool,
    halted: bool,
}

impl VoiceSlot {
    fn new(source: DecodedSource, out_rate: u32) -> Self {
        Self {
            step: f64::from(source.sample_rate) / f64::from(out_rate),
            samples: source.samples,
            src_channels: source.channels,
            position: 0.0,
            gain: 0.0,
            gain_target: 0.0,
            ramp_frames: 0,
            started: false,
            halt_at_ramp_end: false,
            halted: false,
        }
    }

    fn begin_ramp(&mut self, target: f32, ramp: Duration, out_rate: u32) {
        self.gain_target = target.clamp(0.0, 1.0);
        if self.started {
            self.ramp_frames = (ramp.as_secs_f64() * f64::from(out_rate)) as u32;
            if self.ramp_frames == 0 {
                self.gain = self.gain_target;
            }
        } else {
            // Nothing audible yet, jump straight to the target.
            self.gain = self.gain_target;
            self.ramp_frames = 0;
        }
    }

    /// Advance one output frame; returns the (left, right) contribution.
    fn next_frame(&mut self) -> (f32, f32) {
        if !self.started || self.halted {
            return (0.0, 0.0);
        }

        if self.ramp_frames > 0 {
            self.gain += (self.gain_target - self.gain) / self.ramp_frames as f32;
            self.ramp_frames -= 1;
        } else {
            self.gain = self.gain_target;
            if self.halt_at_ramp_end {
                self.halted = true;
                self.started = false;
                self.position = 0.0;
                return (0.0, 0.0);
            }
        }

        if self.src_channels == 0 {
            return (0.0, 0.0);
        }
        let frames = self.samples.len() / self.src_channels as usize;
        if frames == 0 {
            return (0.0, 0.0);
        }
        let frame = self.position as usize % frames;
        let base = frame * self.src_channels as usize;
        let (l, r) = if self.src_channels >= 2 {
            (self.samples[base], self.samples[base + 1])
        } else {
            let s = self.samples[base];
            (s, s)
        };

        self.position += self.step;
        if self.position >= frames as f64 {
            self.position -= frames as f64;
        }

        (l * self.gain, r * self.gain)
    }
}

/// State shared between the engine thread and the audio callback.
struct Shared {
    voices: Mutex<Vec<VoiceSlot>>,
    suspended: AtomicBool,
}

/// Handle to one slot in the shared voice table.
pub struct CpalVoice {
    index: usize,
    shared: Arc<Shared>,
    out_rate: u32,
}

impl Voice for CpalVoice {
    fn start(&mut self) {
        let mut voices = self.shared.voices.lock();
        let slot = &mut voices[self.index];
        slot.started = true;
        slot.halted = false;
        slot.halt_at_ramp_end = false;
    }

    fn set_gain(&mut self, target: f32, ramp: Duration) {
        let mut voices = self.shared.voices.lock();
        let slot = &mut voices[self.index];
        slot.halt_at_ramp_end = false;
        slot.begin_ramp(target, ramp, self.out_rate);
    }

    fn stop(&mut self, ramp: Duration) {
        let mut voices = self.shared.voices.lock();
        let slot = &mut voices[self.index];
        if slot.halted {
            return;
        }
        if !slot.started {
            slot.halted = true;
            slot.gain = 0.0;
            slot.gain_target = 0.0;
            return;
        }
        slot.begin_ramp(0.0, ramp, self.out_rate);
        slot.halt_at_ramp_end = true;
    }

    fn is_stopped(&self) -> bool {
        let voices = self.shared.voices.lock();
        voices[self.index].halted
    }
}

/// The cpal-backed output path.
pub struct CpalOutput {
    shared: Arc<Shared>,
    stream: cpal::Stream,
    sample_rate: u32,
}

impl CpalOutput {
    /// Open the default output device and start the mix stream.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| MixerError::Backend("no default output device".to_string()))?;
        let config = device
            .default_output_config()
            .map_err(|e| MixerError::Backend(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let out_channels = config.channels() as usize;
        let stream_config: cpal::StreamConfig = config.into();

        let shared = Arc::new(Shared {
            voices: Mutex::new(Vec::new()),
            suspended: AtomicBool::new(false),
        });

        let cb_shared = Arc::clone(&shared);
        let err_shared = Arc::clone(&shared);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut voices = cb_shared.voices.lock();
                    for frame in data.chunks_mut(out_channels) {
                        let mut left = 0.0f32;
                        let mut right = 0.0f32;
                        for slot in voices.iter_mut() {
                            let (l, r) = slot.next_frame();
                            left += l;
                            right += r;
                        }
                        frame[0] = left.clamp(-1.0, 1.0);
                        if out_channels > 1 {
                            frame[1] = right.clamp(-1.0, 1.0);
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = 0.0;
                        }
                    }
                },
                move |err| {
                    warn!("output stream error, marking suspended: {err}");
                    err_shared.suspended.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| MixerError::Backend(e.to_string()))?;

        stream
            .play()
            .map_err(|e| MixerError::Backend(e.to_string()))?;

        info!(sample_rate, out_channels, "audio output path running");

        Ok(Self {
            shared,
            stream,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl OutputBackend for CpalOutput {
    fn create_voice(&mut self, source: DecodedSource) -> Box<dyn Voice> {
        let mut voices = self.shared.voices.lock();
        let index = voices.len();
        voices.push(VoiceSlot::new(source, self.sample_rate));
        Box::new(CpalVoice {
            index,
            shared: Arc::clone(&self.shared),
            out_rate: self.sample_rate,
        })
    }

    fn state(&self) -> OutputState {
        if self.shared.suspended.load(Ordering::SeqCst) {
            OutputState::Suspended
        } else {
            OutputState::Running
        }
    }

    fn resume(&mut self) -> Result<()> {
        self.stream.play().map_err(|e| {
            warn!("failed to resume output stream: {e}");
            MixerError::Suspended
        })?;
        self.shared.suspended.store(false, Ordering::SeqCst);
        info!("audio output path resumed");
        Ok(())
    }
}
