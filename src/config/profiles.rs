//! Border profiles applied per image orientation

use serde::{Deserialize, Deserializer, Serialize};
use crate::error::{Result, BorderbatchError};
use crate::processing::Orientation;

/// Fraction of the target canvas reserved as padding on each side.
///
/// `vertical` applies above and below the image (relative to the target
/// height), `horizontal` to the left and right (relative to the target width).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderProfile {
    pub vertical: f64,
    pub horizontal: f64,
}

impl BorderProfile {
    pub const fn new(vertical: f64, horizontal: f64) -> Self {
        Self { vertical, horizontal }
    }

    /// Default profile for landscape images
    pub const fn landscape() -> Self {
        Self::new(0.05, 0.03)
    }

    /// Default profile for portrait (and square) images
    pub const fn portrait() -> Self {
        Self::new(0.005, 0.18)
    }

    /// Validate the profile; `label` names it in the error message
    pub fn validate(&self, label: &str) -> Result<()> {
        for (axis, ratio) in [("vertical", self.vertical), ("horizontal", self.horizontal)] {
            if !(0.0..0.5).contains(&ratio) {
                return Err(BorderbatchError::config(format!(
                    "{} {} border ratio must be in [0, 0.5), got {}",
                    label, axis, ratio
                )));
            }
        }
        Ok(())
    }
}

/// A profile section as written in a config file; missing ratios keep the preset
#[derive(Deserialize)]
struct PartialProfile {
    vertical: Option<f64>,
    horizontal: Option<f64>,
}

impl PartialProfile {
    fn over(self, preset: BorderProfile) -> BorderProfile {
        BorderProfile {
            vertical: self.vertical.unwrap_or(preset.vertical),
            horizontal: self.horizontal.unwrap_or(preset.horizontal),
        }
    }
}

pub(crate) fn landscape_section<'de, D>(deserializer: D) -> std::result::Result<BorderProfile, D::Error>
where
    D: Deserializer<'de>,
{
    PartialProfile::deserialize(deserializer).map(|p| p.over(BorderProfile::landscape()))
}

pub(crate) fn portrait_section<'de, D>(deserializer: D) -> std::result::Result<BorderProfile, D::Error>
where
    D: Deserializer<'de>,
{
    PartialProfile::deserialize(deserializer).map(|p| p.over(BorderProfile::portrait()))
}

/// Pick the profile matching an orientation
pub fn profile_for(
    orientation: Orientation,
    landscape: &BorderProfile,
    portrait: &BorderProfile,
) -> BorderProfile {
    match orientation {
        Orientation::Landscape => *landscape,
        Orientation::Portrait => *portrait,
    }
}
