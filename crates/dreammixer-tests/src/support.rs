//! Shared harness: an engine wired to fakes over the builtin catalog.

use std::sync::Arc;

use crossbeam_channel::unbounded;
use dreammixer_audio::testing::{manual_loader, FakeControl, FakeOutput, ManualLoadControl};
use dreammixer_audio::{
    ActivationManager, BackendFactory, EngineConfig, MixerEngine, OutputBackend, RetryPolicy,
    SoundCatalog,
};
use dreammixer_core::{ManualClock, MixerError};

pub struct Harness {
    pub engine: MixerEngine,
    pub output: FakeControl,
    pub loads: ManualLoadControl,
    pub clock: ManualClock,
}

/// Engine over the full builtin catalog, fakes at every seam, activated.
pub fn activated() -> Harness {
    let mut h = unactivated();
    h.engine.on_user_gesture();
    h
}

pub fn unactivated() -> Harness {
    let (tx, rx) = unbounded();
    let (dispatcher, loads) = manual_loader(tx);
    let clock = ManualClock::new();
    let output = FakeOutput::new();
    let control = output.control();
    let mut backend = Some(Box::new(output) as Box<dyn OutputBackend>);
    let factory: BackendFactory = Box::new(move || {
        backend
            .take()
            .ok_or_else(|| MixerError::Backend("already built".to_string()))
    });
    let activation = ActivationManager::new(
        factory,
        RetryPolicy::default(),
        Arc::new(clock.clone()),
    );
    let engine = MixerEngine::new(
        &SoundCatalog::builtin(),
        EngineConfig::default(),
        activation,
        Box::new(dispatcher),
        rx,
    );
    Harness {
        engine,
        output: control,
        loads,
        clock,
    }
}
