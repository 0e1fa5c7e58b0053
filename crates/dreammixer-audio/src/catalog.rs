//! The sound catalog: the fixed set of channels the mixer offers.
//!
//! Pure data, fixed at construction. A slot is either a real sound with a
//! source locator or a reserved placeholder that can never be played, so
//! "active but locator-less" is unrepresentable.

use serde::{Deserialize, Serialize};

/// What a catalog slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// A real sound. The locator is a path relative to the asset root.
    Sound { locator: String },
    /// A reserved slot with no sound assigned.
    Placeholder,
}

impl Slot {
    /// Whether this slot can ever be played.
    pub fn is_playable(&self) -> bool {
        matches!(self, Slot::Sound { .. })
    }
}

/// One entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable channel id, e.g. `"rain"`.
    pub id: String,
    /// Human-readable name for the UI.
    pub display_name: String,
    pub slot: Slot,
}

impl CatalogEntry {
    /// A playable sound entry.
    pub fn sound(id: impl Into<String>, name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: name.into(),
            slot: Slot::Sound {
                locator: locator.into(),
            },
        }
    }

    /// A reserved placeholder entry.
    pub fn placeholder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: name.into(),
            slot: Slot::Placeholder,
        }
    }
}

/// An ordered, read-only list of catalog entries.
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    entries: Vec<CatalogEntry>,
}

impl SoundCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The built-in ambient sound set.
    pub fn builtin() -> Self {
        Self::new(vec![
            CatalogEntry::sound("fire", "Fire", "fire.mp3"),
            CatalogEntry::sound("rain", "Rain", "rain.mp3"),
            CatalogEntry::sound("whitenoise", "White Noise", "white-noise.mp3"),
            CatalogEntry::sound("river", "River", "river.mp3"),
            CatalogEntry::sound("nature", "Nature", "nature.mp3"),
            CatalogEntry::sound("wind", "Wind", "wind.mp3"),
            CatalogEntry::placeholder("empty1", "Empty"),
        ])
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
