//! Read-only mixer state for rendering and assertions.

use serde::Serialize;

use dreammixer_core::{effective_gain, Volume};

use crate::activation::ActivationState;

/// One channel as the presentation layer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelView {
    pub id: String,
    pub display_name: String,
    pub volume: Volume,
    pub playing: bool,
    /// False for placeholder slots and channels whose load failed.
    pub available: bool,
}

/// An immutable projection of the whole mixer. The only mutation path is
/// issuing new intents to the engine and taking another snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MixerSnapshot {
    pub channels: Vec<ChannelView>,
    pub master_volume: Volume,
    pub activation: ActivationState,
    pub playing_count: usize,
}

impl MixerSnapshot {
    /// Look up one channel's view by id.
    pub fn channel(&self, id: &str) -> Option<&ChannelView> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// The effective output gain a channel would have right now.
    pub fn effective_gain(&self, id: &str) -> Option<f32> {
        self.channel(id)
            .map(|c| effective_gain(c.volume, self.master_volume))
    }
}
