//! The mixer engine.
//!
//! Owns every channel node and the master volume, and is the only way the
//! presentation layer touches playback. All operations run on the caller's
//! thread; async work (source loads, fade-out ramps, activation retries)
//! is observed by calling [`MixerEngine::pump`] from the UI tick.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, info, warn};

use dreammixer_core::{effective_gain, MixerError, SystemClock, Volume};

use crate::activation::{ActivationManager, ActivationState, BackendFactory};
use crate::backend::OutputBackend;
use crate::catalog::SoundCatalog;
use crate::channel::{ChannelNode, NodeState};
use crate::config::EngineConfig;
use crate::cpal_backend::CpalOutput;
use crate::snapshot::{ChannelView, MixerSnapshot};
use crate::source::{
    FileSourceLoader, LoadComplete, LoadDispatcher, LoadRequest, ThreadedLoader,
};

/// An operation deferred until the output path is ready.
#[derive(Debug)]
enum Intent {
    Toggle(String),
    SetVolume(String, Volume),
}

pub struct MixerEngine {
    channels: Vec<ChannelNode>,
    master: Volume,
    activation: ActivationManager,
    dispatcher: Box<dyn LoadDispatcher>,
    completions: Receiver<LoadComplete>,
    /// Intents issued before activation, replayed in order once ready.
    pending: VecDeque<Intent>,
    config: EngineConfig,
}

impl MixerEngine {
    /// Build an engine over explicit seams. Tests inject fakes here; the
    /// app uses [`MixerEngine::with_system_audio`].
    pub fn new(
        catalog: &SoundCatalog,
        config: EngineConfig,
        activation: ActivationManager,
        dispatcher: Box<dyn LoadDispatcher>,
        completions: Receiver<LoadComplete>,
    ) -> Self {
        let channels = catalog.entries().iter().map(ChannelNode::from_entry).collect();
        let master = config.master_default;
        info!(
            channels = catalog.len(),
            master = %master,
            "mixer engine constructed"
        );
        Self {
            channels,
            master,
            activation,
            dispatcher,
            completions,
            pending: VecDeque::new(),
            config,
        }
    }

    /// Build an engine wired to the default audio device and filesystem
    /// sources. The output path itself still waits for the first gesture.
    pub fn with_system_audio(catalog: &SoundCatalog, config: EngineConfig) -> Self {
        let (tx, rx) = unbounded();
        let dispatcher = Box::new(ThreadedLoader::new(Arc::new(FileSourceLoader), tx));
        let factory: BackendFactory = Box::new(|| {
            CpalOutput::new().map(|out| Box::new(out) as Box<dyn OutputBackend>)
        });
        let activation = ActivationManager::new(
            factory,
            config.activation_retry,
            Arc::new(SystemClock::new()),
        );
        Self::new(catalog, config, activation, dispatcher, rx)
    }

    /// Forward the first user interaction to the activation manager and
    /// replay anything the user asked for before audio was unlocked.
    pub fn on_user_gesture(&mut self) {
        let was_ready = self.activation.is_ready();
        self.activation.on_user_gesture();
        if !was_ready && self.activation.is_ready() {
            self.flush_pending();
        }
    }

    /// Toggle a channel on or off.
    ///
    /// On: volume becomes the remembered value, or the default when the
    /// channel sat at zero. Off: playback stops but the stored volume is
    /// preserved for the next toggle. Unknown and placeholder ids are
    /// logged no-ops.
    pub fn toggle(&mut self, id: &str) {
        let Some(idx) = self.usable_channel(id) else {
            return;
        };
        if !self.ensure_output(Intent::Toggle(id.to_string())) {
            return;
        }

        if self.channels[idx].playing() {
            self.stop_channel(idx);
        } else {
            let stored = self.channels[idx].volume();
            let volume = if stored.is_audible() {
                stored
            } else {
                self.config.default_toggle_volume
            };
            self.channels[idx].set_volume(volume);
            self.start_channel(idx);
        }
    }

    /// Set a channel's volume.
    ///
    /// Zero stops the channel (mute-by-slider); any positive value starts
    /// it if it wasn't playing. This is deliberately different from
    /// [`MixerEngine::toggle`], which pauses while remembering the volume.
    pub fn set_volume(&mut self, id: &str, percent: u8) {
        let Some(idx) = self.usable_channel(id) else {
            return;
        };
        let volume = Volume::new(percent);
        if !self.ensure_output(Intent::SetVolume(id.to_string(), volume)) {
            return;
        }

        self.channels[idx].set_volume(volume);
        if !volume.is_audible() {
            if self.channels[idx].playing() {
                self.stop_channel(idx);
            }
        } else if !self.channels[idx].playing() {
            self.start_channel(idx);
        } else {
            let gain = effective_gain(volume, self.master);
            let ramp = self.config.gain_ramp;
            if let Some(voice) = self.channels[idx].voice_mut() {
                voice.set_gain(gain, ramp);
            }
        }
    }

    /// Set the master volume and re-apply effective gain to every playing
    /// channel. Stored channel volumes are untouched.
    pub fn set_master_volume(&mut self, percent: u8) {
        self.master = Volume::new(percent);
        debug!(master = %self.master, "master volume changed");
        let master = self.master;
        let ramp = self.config.gain_ramp;
        for node in &mut self.channels {
            if node.playing() {
                let gain = effective_gain(node.volume(), master);
                if let Some(voice) = node.voice_mut() {
                    voice.set_gain(gain, ramp);
                }
            }
        }
    }

    /// The panic button: stop every channel and clear every stored volume.
    /// Unlike toggling channels off one by one, volumes do not survive.
    pub fn stop_all(&mut self) {
        info!("stopping all channels");
        self.pending.clear();
        let ramp = self.config.stop_ramp;
        for node in &mut self.channels {
            if node.playing() {
                node.set_playing(false);
                node.bump_generation();
                if let Some(voice) = node.voice_mut() {
                    voice.stop(ramp);
                    node.mark_stopping();
                }
            }
            node.set_volume(Volume::ZERO);
        }
    }

    /// A read-only view of the whole mixer.
    pub fn snapshot(&self) -> MixerSnapshot {
        let channels: Vec<ChannelView> = self
            .channels
            .iter()
            .map(|node| ChannelView {
                id: node.id().to_string(),
                display_name: node.display_name().to_string(),
                volume: node.volume(),
                playing: node.playing(),
                available: node.is_usable(),
            })
            .collect();
        let playing_count = channels.iter().filter(|c| c.playing).count();
        MixerSnapshot {
            channels,
            master_volume: self.master,
            activation: self.activation.state(),
            playing_count,
        }
    }

    /// Drive async progress: activation retries, suspension detection,
    /// load completions, and fade-out ramps that have finished. Call this
    /// once per UI tick.
    pub fn pump(&mut self) {
        let was_ready = self.activation.is_ready();
        self.activation.poll();
        if !was_ready && self.activation.is_ready() {
            self.flush_pending();
        }

        while let Ok(complete) = self.completions.try_recv() {
            self.apply_completion(complete);
        }

        // Channels whose load finished earlier but had no output path yet,
        // and channels a stale load failure knocked back to Unloaded while
        // the user still wants them playing (a fresh load is dispatched).
        if self.activation.is_ready() {
            for idx in 0..self.channels.len() {
                let node = &self.channels[idx];
                if node.playing()
                    && matches!(node.state(), NodeState::Loaded | NodeState::Unloaded)
                {
                    self.start_channel(idx);
                }
            }
        }

        for node in &mut self.channels {
            if node.state() == NodeState::Stopping {
                let done = node
                    .voice_mut()
                    .map(|v| v.is_stopped())
                    .unwrap_or(true);
                if done {
                    // The voice stays attached so a later restart reuses
                    // its slot instead of growing the backend table.
                    node.mark_stopped();
                    debug!(channel = node.id(), "fade-out complete");
                }
            }
        }
    }

    fn apply_completion(&mut self, complete: LoadComplete) {
        let Some(idx) = self
            .channels
            .iter()
            .position(|n| n.id() == complete.channel_id)
        else {
            warn!(channel = %complete.channel_id, "load completion for unknown channel");
            return;
        };
        let should_start =
            self.channels[idx].complete_load(complete.generation, complete.result);
        if should_start && self.activation.is_ready() {
            self.start_channel(idx);
        }
    }

    /// Resolve an id to a playable channel, logging the no-op otherwise.
    fn usable_channel(&self, id: &str) -> Option<usize> {
        match self.channels.iter().position(|n| n.id() == id) {
            Some(idx) if self.channels[idx].is_usable() => Some(idx),
            Some(_) => {
                warn!(channel = id, "ignoring operation on inactive channel");
                None
            }
            None => {
                let err = MixerError::UnknownChannel(id.to_string());
                warn!("ignoring operation: {err}");
                None
            }
        }
    }

    /// Make sure the output path can carry sound, deferring `intent` if it
    /// cannot yet. Returns true when the caller may proceed.
    fn ensure_output(&mut self, intent: Intent) -> bool {
        match self.activation.state() {
            ActivationState::Ready => true,
            ActivationState::Suspended => match self.activation.resume() {
                Ok(()) => true,
                Err(e) => {
                    warn!("cannot resume output path: {e}");
                    false
                }
            },
            ActivationState::Uninitialized | ActivationState::Activating => {
                debug!(?intent, "output path not ready, deferring");
                self.pending.push_back(intent);
                false
            }
            ActivationState::Failed => {
                warn!(?intent, "output path failed, dropping operation");
                false
            }
        }
    }

    fn flush_pending(&mut self) {
        let intents: Vec<Intent> = self.pending.drain(..).collect();
        if !intents.is_empty() {
            info!(count = intents.len(), "replaying deferred operations");
        }
        for intent in intents {
            match intent {
                Intent::Toggle(id) => self.toggle(&id),
                Intent::SetVolume(id, v) => self.set_volume(&id, v.percent()),
            }
        }
    }

    /// Start (or restart) a channel at its stored volume. The output path
    /// must be ready.
    fn start_channel(&mut self, idx: usize) {
        self.channels[idx].set_playing(true);
        let gain = effective_gain(self.channels[idx].volume(), self.master);
        let gain_ramp = self.config.gain_ramp;

        match self.channels[idx].state() {
            NodeState::Unloaded => {
                let node = &mut self.channels[idx];
                // Locator is present: usable_channel filtered placeholders.
                let Some(locator) = node.locator().map(str::to_string) else {
                    return;
                };
                let path: PathBuf = self.config.asset_root.join(locator);
                let request = LoadRequest {
                    channel_id: node.id().to_string(),
                    generation: node.generation(),
                    path,
                };
                node.mark_loading();
                debug!(channel = node.id(), "dispatching source load");
                self.dispatcher.dispatch(request);
            }
            NodeState::Loading => {
                // Load in flight; its completion will start playback.
            }
            NodeState::Loaded | NodeState::Stopped | NodeState::Stopping | NodeState::Playing => {
                if self.channels[idx].voice_mut().is_none() {
                    let Some(source) = self.channels[idx].source().cloned() else {
                        warn!(channel = self.channels[idx].id(), "no decoded source to start");
                        return;
                    };
                    let Some(backend) = self.activation.output_mut() else {
                        return;
                    };
                    let voice = backend.create_voice(source);
                    self.channels[idx].attach_voice(voice);
                }
                let node = &mut self.channels[idx];
                if let Some(voice) = node.voice_mut() {
                    voice.set_gain(gain, gain_ramp);
                    voice.start();
                }
                node.mark_playing();
                debug!(channel = node.id(), gain, "channel playing");
            }
            NodeState::Failed => {
                warn!(channel = self.channels[idx].id(), "cannot start failed channel");
                self.channels[idx].set_playing(false);
            }
        }
    }

    /// Stop a channel with a fade-out, preserving its stored volume.
    fn stop_channel(&mut self, idx: usize) {
        let ramp = self.config.stop_ramp;
        let node = &mut self.channels[idx];
        node.set_playing(false);
        // Invalidate any in-flight load so it cannot start a zombie voice.
        node.bump_generation();
        if let Some(voice) = node.voice_mut() {
            voice.stop(ramp);
            node.mark_stopping();
        }
        debug!(channel = node.id(), "channel stopping");
    }
}
