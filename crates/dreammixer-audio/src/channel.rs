//! Per-channel playback state.
//!
//! A [`ChannelNode`] tracks one sound's transport state, its stored volume,
//! and a generation counter that invalidates in-flight async loads when the
//! user turns the sound back off before the load finishes.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use dreammixer_core::{MixerError, Volume};

use crate::backend::Voice;
use crate::catalog::{CatalogEntry, Slot};
use crate::source::DecodedSource;

/// Transport state of a channel's sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// No load attempted yet.
    Unloaded,
    /// Fetch/decode in flight.
    Loading,
    /// Decoded and ready to start.
    Loaded,
    Playing,
    /// Stop requested; fade-out ramp in flight.
    Stopping,
    Stopped,
    /// Load failed; this channel can never play. Siblings are unaffected.
    Failed,
}

/// One channel of the mixer: catalog identity plus mutable playback state.
pub struct ChannelNode {
    id: String,
    display_name: String,
    slot: Slot,
    state: NodeState,
    /// User intent: is this channel switched on? Decoupled from `state`
    /// because a load may still be in flight while the user already
    /// considers the sound "on".
    playing: bool,
    volume: Volume,
    /// Bumped on every stop; async completions carrying an older
    /// generation are stale and must not start playback.
    generation: u64,
    source: Option<DecodedSource>,
    voice: Option<Box<dyn Voice>>,
}

impl ChannelNode {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            display_name: entry.display_name.clone(),
            slot: entry.slot.clone(),
            state: NodeState::Unloaded,
            playing: false,
            volume: Volume::ZERO,
            generation: 0,
            source: None,
            voice: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate any in-flight load so its completion cannot start audio.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether this slot can be played at all (real sound, not failed).
    pub fn is_usable(&self) -> bool {
        self.slot.is_playable() && self.state != NodeState::Failed
    }

    /// The locator, if this is a real sound slot.
    pub fn locator(&self) -> Option<&str> {
        match &self.slot {
            Slot::Sound { locator } => Some(locator),
            Slot::Placeholder => None,
        }
    }

    pub fn source(&self) -> Option<&DecodedSource> {
        self.source.as_ref()
    }

    pub fn voice_mut(&mut self) -> Option<&mut Box<dyn Voice>> {
        self.voice.as_mut()
    }

    pub fn attach_voice(&mut self, voice: Box<dyn Voice>) {
        self.voice = Some(voice);
    }

    /// Mark the load as dispatched.
    pub fn mark_loading(&mut self) {
        debug_assert_eq!(self.state, NodeState::Unloaded);
        self.state = NodeState::Loading;
    }

    pub fn mark_playing(&mut self) {
        self.state = NodeState::Playing;
    }

    pub fn mark_stopping(&mut self) {
        self.state = NodeState::Stopping;
    }

    pub fn mark_stopped(&mut self) {
        self.state = NodeState::Stopped;
    }

    /// Apply a load completion.
    ///
    /// Returns `true` if the channel should now be started: the completion
    /// is current, succeeded, and the user still wants the sound on. A stale
    /// completion's start intent is abandoned, but a successfully decoded
    /// source is still cached so the next toggle does not refetch.
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<DecodedSource, MixerError>,
    ) -> bool {
        match result {
            Ok(source) => {
                if self.state == NodeState::Loading {
                    self.state = NodeState::Loaded;
                }
                self.source = Some(source);
                if generation == self.generation && self.playing {
                    true
                } else {
                    debug!(channel = %self.id, "discarding stale load completion");
                    false
                }
            }
            Err(e) => {
                if generation == self.generation {
                    error!(channel = %self.id, "source load failed, channel unusable: {e}");
                    self.state = NodeState::Failed;
                    self.playing = false;
                } else {
                    debug!(channel = %self.id, "discarding stale load failure: {e}");
                    if self.state == NodeState::Loading {
                        self.state = NodeState::Unloaded;
                    }
                }
                false
            }
        }
    }
}

impl std::fmt::Debug for ChannelNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelNode")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("playing", &self.playing)
            .field("volume", &self.volume)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn silent_source() -> DecodedSource {
        DecodedSource {
            samples: vec![0.0f32; 32].into(),
            channels: 1,
            sample_rate: 48000,
        }
    }

    fn rain() -> ChannelNode {
        ChannelNode::from_entry(&CatalogEntry::sound("rain", "Rain", "rain.mp3"))
    }

    #[test]
    fn placeholder_is_never_usable() {
        let node = ChannelNode::from_entry(&CatalogEntry::placeholder("empty1", "Empty"));
        assert!(!node.is_usable());
        assert!(node.locator().is_none());
    }

    #[test]
    fn current_load_completion_with_intent_starts() {
        let mut node = rain();
        node.mark_loading();
        node.set_playing(true);
        let start = node.complete_load(0, Ok(silent_source()));
        assert!(start);
        assert_eq!(node.state(), NodeState::Loaded);
    }

    #[test]
    fn stale_load_completion_does_not_start_but_caches_source() {
        let mut node = rain();
        node.mark_loading();
        node.set_playing(true);
        // User toggles off while the load is in flight.
        node.set_playing(false);
        node.bump_generation();

        let start = node.complete_load(0, Ok(silent_source()));
        assert!(!start);
        assert!(node.source().is_some());
        assert!(!node.playing());
    }

    #[test]
    fn current_load_failure_marks_channel_failed() {
        let mut node = rain();
        node.mark_loading();
        node.set_playing(true);
        let start = node.complete_load(
            0,
            Err(MixerError::Decode {
                locator: "rain.mp3".to_string(),
                reason: "bad header".to_string(),
            }),
        );
        assert!(!start);
        assert_eq!(node.state(), NodeState::Failed);
        assert!(!node.is_usable());
        assert!(!node.playing());
    }

    #[test]
    fn stale_load_failure_leaves_channel_usable() {
        let mut node = rain();
        node.mark_loading();
        node.bump_generation();
        node.complete_load(
            0,
            Err(MixerError::Decode {
                locator: "rain.mp3".to_string(),
                reason: "bad header".to_string(),
            }),
        );
        assert_eq!(node.state(), NodeState::Unloaded);
        assert!(node.is_usable());
    }
}
