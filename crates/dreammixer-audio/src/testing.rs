//! Test doubles for the engine seams.
//!
//! Shared between this crate's unit tests and the integration-test crate:
//! a recording output backend, and a load dispatcher whose completions are
//! delivered by hand so async load ordering is fully deterministic.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use dreammixer_core::{MixerError, Result};

use crate::backend::{OutputBackend, OutputState, Voice};
use crate::source::{DecodedSource, LoadComplete, LoadDispatcher, LoadRequest};

/// A short silent source for tests.
pub fn silent_source() -> DecodedSource {
    DecodedSource {
        samples: vec![0.0f32; 64].into(),
        channels: 2,
        sample_rate: 48000,
    }
}

/// Everything a fake voice has been told.
#[derive(Debug, Clone, Default)]
pub struct VoiceRecord {
    pub started: bool,
    pub starts: u32,
    pub gain: f32,
    pub last_ramp: Duration,
    /// A stop ramp is in flight; the test finishes it via
    /// [`FakeControl::finish_ramps`].
    pub stopping: bool,
    pub stopped: bool,
}

struct FakeShared {
    voices: Mutex<Vec<VoiceRecord>>,
    suspended: AtomicBool,
    resume_calls: AtomicU32,
    fail_resume: AtomicBool,
}

/// Recording implementation of [`OutputBackend`].
pub struct FakeOutput {
    shared: Arc<FakeShared>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(FakeShared {
                voices: Mutex::new(Vec::new()),
                suspended: AtomicBool::new(false),
                resume_calls: AtomicU32::new(0),
                fail_resume: AtomicBool::new(false),
            }),
        }
    }

    /// An inspection/control handle the test keeps after handing the
    /// backend itself to the activation manager.
    pub fn control(&self) -> FakeControl {
        FakeControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for FakeOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for FakeOutput {
    fn create_voice(&mut self, _source: DecodedSource) -> Box<dyn Voice> {
        let mut voices = self.shared.voices.lock();
        let index = voices.len();
        voices.push(VoiceRecord::default());
        Box::new(FakeVoice {
            index,
            shared: Arc::clone(&self.shared),
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
        self.shared.resume_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_resume.load(Ordering::SeqCst) {
            return Err(MixerError::Suspended);
        }
        self.shared.suspended.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Test-side handle to a [`FakeOutput`].
#[derive(Clone)]
pub struct FakeControl {
    shared: Arc<FakeShared>,
}

impl FakeControl {
    /// Simulate the host suspending the output path.
    pub fn suspend(&self) {
        self.shared.suspended.store(true, Ordering::SeqCst);
    }

    pub fn set_fail_resume(&self, fail: bool) {
        self.shared.fail_resume.store(fail, Ordering::SeqCst);
    }

    pub fn resume_calls(&self) -> u32 {
        self.shared.resume_calls.load(Ordering::SeqCst)
    }

    pub fn voice_count(&self) -> usize {
        self.shared.voices.lock().len()
    }

    pub fn voice(&self, index: usize) -> VoiceRecord {
        self.shared.voices.lock()[index].clone()
    }

    /// Complete all in-flight stop ramps, as if their fade-out elapsed.
    pub fn finish_ramps(&self) {
        for rec in self.shared.voices.lock().iter_mut() {
            if rec.stopping {
                rec.stopping = false;
                rec.stopped = true;
                rec.started = false;
            }
        }
    }
}

struct FakeVoice {
    index: usize,
    shared: Arc<FakeShared>,
}

impl Voice for FakeVoice {
    fn start(&mut self) {
        let mut voices = self.shared.voices.lock();
        let rec = &mut voices[self.index];
        if rec.started && !rec.stopping {
            return;
        }
        rec.started = true;
        rec.starts += 1;
        rec.stopping = false;
        rec.stopped = false;
    }

    fn set_gain(&mut self, target: f32, ramp: Duration) {
        let mut voices = self.shared.voices.lock();
        let rec = &mut voices[self.index];
        rec.gain = target;
        rec.last_ramp = ramp;
        rec.stopping = false;
    }

    fn stop(&mut self, ramp: Duration) {
        let mut voices = self.shared.voices.lock();
        let rec = &mut voices[self.index];
        if rec.stopped {
            return;
        }
        rec.gain = 0.0;
        rec.last_ramp = ramp;
        if rec.started {
            rec.stopping = true;
        } else {
            rec.stopped = true;
        }
    }

    fn is_stopped(&self) -> bool {
        self.shared.voices.lock()[self.index].stopped
    }
}

/// [`LoadDispatcher`] whose requests sit until the test completes them.
pub struct ManualDispatcher {
    pending: Arc<Mutex<Vec<LoadRequest>>>,
}

impl LoadDispatcher for ManualDispatcher {
    fn dispatch(&mut self, request: LoadRequest) {
        self.pending.lock().push(request);
    }
}

/// Test-side handle to a [`ManualDispatcher`].
pub struct ManualLoadControl {
    pending: Arc<Mutex<Vec<LoadRequest>>>,
    completions: Sender<LoadComplete>,
}

impl ManualLoadControl {
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Complete every pending load successfully with a silent source.
    pub fn complete_all(&self) {
        for request in self.pending.lock().drain(..) {
            let _ = self.completions.send(LoadComplete {
                channel_id: request.channel_id,
                generation: request.generation,
                result: Ok(silent_source()),
            });
        }
    }

    /// Complete the oldest pending load with `result`.
    pub fn complete_next(&self, result: Result<DecodedSource>) {
        let request = self.pending.lock().remove(0);
        let _ = self.completions.send(LoadComplete {
            channel_id: request.channel_id,
            generation: request.generation,
            result,
        });
    }
}

/// Build a manual dispatcher plus its control handle.
pub fn manual_loader(completions: Sender<LoadComplete>) -> (ManualDispatcher, ManualLoadControl) {
    let pending = Arc::new(Mutex::new(Vec::new()));
    (
        ManualDispatcher {
            pending: Arc::clone(&pending),
        },
        ManualLoadControl {
            pending,
            completions,
        },
    )
}
