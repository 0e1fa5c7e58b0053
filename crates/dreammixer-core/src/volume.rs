//! Volume percentages and gain math.

use serde::{Deserialize, Serialize};

/// A volume level as an integer percent in `[0, 100]`.
///
/// Sliders and stored channel volumes use percents; only the final
/// effective gain handed to the output path is a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(u8);

impl Volume {
    pub const ZERO: Volume = Volume(0);
    pub const MAX: Volume = Volume(100);

    /// Create a volume, clamping to `[0, 100]`.
    pub fn new(percent: u8) -> Self {
        Self(percent.min(100))
    }

    /// The raw percent value.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Whether this volume is audible at all.
    pub fn is_audible(self) -> bool {
        self.0 > 0
    }

    /// Linear amplitude in `[0.0, 1.0]`.
    pub fn amplitude(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::ZERO
    }
}

impl From<u8> for Volume {
    fn from(percent: u8) -> Self {
        Volume::new(percent)
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Combine an individual channel volume with the master volume into the
/// actual output gain: `(volume/100) * (master/100)`, clamped to `[0, 1]`.
pub fn effective_gain(volume: Volume, master: Volume) -> f32 {
    (volume.amplitude() * master.amplitude()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_clamps_to_100() {
        assert_eq!(Volume::new(250).percent(), 100);
        assert_eq!(Volume::new(100).percent(), 100);
        assert_eq!(Volume::new(0).percent(), 0);
    }

    #[test]
    fn effective_gain_combines_volume_and_master() {
        let gain = effective_gain(Volume::new(50), Volume::new(70));
        assert!((gain - 0.35).abs() < 1e-6);

        let gain = effective_gain(Volume::new(40), Volume::new(50));
        assert!((gain - 0.20).abs() < 1e-6);
    }

    #[test]
    fn effective_gain_bounds() {
        assert_eq!(effective_gain(Volume::ZERO, Volume::MAX), 0.0);
        assert_eq!(effective_gain(Volume::MAX, Volume::ZERO), 0.0);
        assert_eq!(effective_gain(Volume::MAX, Volume::MAX), 1.0);
    }
}
