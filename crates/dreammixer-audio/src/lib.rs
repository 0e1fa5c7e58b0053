//! Dreammixer Audio - the ambient sound mixing engine
//!
//! Architecture:
//! - `SoundCatalog`: the fixed channel set (pure data)
//! - `ChannelNode`: per-channel transport state, stored volume, generation counter
//! - `MixerEngine`: the five public operations plus `snapshot()` and `pump()`
//! - `ActivationManager`: gesture-gated construction and resume of the output path
//! - `OutputBackend`/`Voice`: the output-path seam; `CpalOutput` is the real one
//! - `MixerSnapshot`: the read-only view the presentation layer renders from

pub mod activation;
pub mod backend;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod cpal_backend;
pub mod engine;
pub mod snapshot;
pub mod source;
pub mod testing;

pub use activation::{ActivationManager, ActivationState, BackendFactory, RetryPolicy};
pub use backend::{OutputBackend, OutputState, Voice};
pub use catalog::{CatalogEntry, Slot, SoundCatalog};
pub use channel::{ChannelNode, NodeState};
pub use config::EngineConfig;
pub use cpal_backend::CpalOutput;
pub use engine::MixerEngine;
pub use snapshot::{ChannelView, MixerSnapshot};
pub use source::{DecodedSource, FileSourceLoader, SourceLoader};
