//! Material profiles
//!
//! A material couples the motion channel's roughness gain with the timbre of
//! the grains played for it. Shape parameters are typed per waveform family,
//! so a glass profile cannot carry a `warmth` value, and are validated once
//! when the profile is built.
//!
//! The JSON form keeps the short keys used by existing material tables:
//!
//! ```json
//! { "r": 0.3, "f": 1.0, "type": "glass", "brightness": 2.0 }
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MaterialError;

// ============================================================================
// Waveform Family
// ============================================================================

/// Waveform family tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformFamily {
    /// Plain sine, no coloration
    Sine,
    /// Clear, bright, long sustain
    Glass,
    /// Ringing, long release
    Metal,
    /// Warm, low-passed texture
    Wood,
    /// Artificial, short exponential decay
    Plastic,
    /// Noisy, soft
    Fabric,
    /// Dull glass-like, rich harmonics
    Ceramic,
    /// Detuned, elastic decay
    Rubber,
}

impl WaveformFamily {
    /// Every family
    pub const ALL: [Self; 8] = [
        Self::Sine,
        Self::Glass,
        Self::Metal,
        Self::Wood,
        Self::Plastic,
        Self::Fabric,
        Self::Ceramic,
        Self::Rubber,
    ];

    /// Lowercase tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Glass => "glass",
            Self::Metal => "metal",
            Self::Wood => "wood",
            Self::Plastic => "plastic",
            Self::Fabric => "fabric",
            Self::Ceramic => "ceramic",
            Self::Rubber => "rubber",
        }
    }

    /// Parse a tag, case-insensitively
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(tag.trim()))
    }

    /// Name of the family's shape parameter, if it has one
    #[must_use]
    pub const fn parameter_name(self) -> Option<&'static str> {
        match self {
            Self::Sine => None,
            Self::Glass => Some("brightness"),
            Self::Metal => Some("resonance"),
            Self::Wood => Some("warmth"),
            Self::Plastic => Some("hardness"),
            Self::Fabric => Some("softness"),
            Self::Ceramic => Some("brittleness"),
            Self::Rubber => Some("elasticity"),
        }
    }

    /// Whether grains of this family draw from the noise source
    #[must_use]
    pub const fn is_textured(self) -> bool {
        matches!(self, Self::Glass | Self::Metal | Self::Wood | Self::Fabric)
    }
}

impl fmt::Display for WaveformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Waveform family with its shape parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialShape {
    /// Plain sine
    #[default]
    Sine,
    /// Glass; `brightness` scales the 2nd and 3rd harmonics
    Glass {
        /// Harmonic brightness
        #[serde(default = "defaults::brightness")]
        brightness: f64,
    },
    /// Metal; `resonance` scales the harmonics under the ring modulation
    Metal {
        /// Harmonic resonance
        #[serde(default = "defaults::resonance")]
        resonance: f64,
    },
    /// Wood; `warmth` scales harmonics and the sub-harmonic
    Wood {
        /// Warmth
        #[serde(default = "defaults::unit")]
        warmth: f64,
    },
    /// Plastic; `hardness` scales the 2nd harmonic
    Plastic {
        /// Hardness
        #[serde(default = "defaults::unit")]
        hardness: f64,
    },
    /// Fabric; `softness` scales the filtered friction noise
    Fabric {
        /// Softness
        #[serde(default = "defaults::unit")]
        softness: f64,
    },
    /// Ceramic; `brittleness` scales the 2nd to 4th harmonics
    Ceramic {
        /// Brittleness
        #[serde(default = "defaults::brittleness")]
        brittleness: f64,
    },
    /// Rubber; `elasticity` scales the detuned 2nd partial
    Rubber {
        /// Elasticity
        #[serde(default = "defaults::unit")]
        elasticity: f64,
    },
}

mod defaults {
    pub const fn brightness() -> f64 {
        2.0
    }

    pub const fn resonance() -> f64 {
        1.5
    }

    pub const fn brittleness() -> f64 {
        1.5
    }

    pub const fn unit() -> f64 {
        1.0
    }
}

impl MaterialShape {
    /// Shape of `family` with its default parameter
    #[must_use]
    pub const fn default_for(family: WaveformFamily) -> Self {
        match family {
            WaveformFamily::Sine => Self::Sine,
            WaveformFamily::Glass => Self::Glass { brightness: defaults::brightness() },
            WaveformFamily::Metal => Self::Metal { resonance: defaults::resonance() },
            WaveformFamily::Wood => Self::Wood { warmth: defaults::unit() },
            WaveformFamily::Plastic => Self::Plastic { hardness: defaults::unit() },
            WaveformFamily::Fabric => Self::Fabric { softness: defaults::unit() },
            WaveformFamily::Ceramic => Self::Ceramic { brittleness: defaults::brittleness() },
            WaveformFamily::Rubber => Self::Rubber { elasticity: defaults::unit() },
        }
    }

    /// Build a shape from a family tag and `(name, value)` parameter pairs.
    ///
    /// Missing parameters take the family default.
    ///
    /// # Errors
    ///
    /// [`MaterialError::UnknownFamily`] for an unrecognized tag,
    /// [`MaterialError::UnexpectedParameter`] for a parameter of another
    /// family, and [`MaterialError::InvalidParameter`] for a negative or
    /// non-finite value.
    pub fn from_params<'a, I>(tag: &str, params: I) -> Result<Self, MaterialError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let family = WaveformFamily::from_tag(tag).ok_or(MaterialError::UnknownFamily)?;
        let mut shape = Self::default_for(family);
        for (name, value) in params {
            match (family.parameter_name(), shape.parameter_mut()) {
                (Some(expected), Some(slot)) if expected == name => *slot = value,
                _ => {
                    return Err(MaterialError::UnexpectedParameter {
                        family: family.as_str(),
                    })
                }
            }
        }
        shape.validate()?;
        Ok(shape)
    }

    /// Family tag of this shape
    #[must_use]
    pub const fn family(&self) -> WaveformFamily {
        match self {
            Self::Sine => WaveformFamily::Sine,
            Self::Glass { .. } => WaveformFamily::Glass,
            Self::Metal { .. } => WaveformFamily::Metal,
            Self::Wood { .. } => WaveformFamily::Wood,
            Self::Plastic { .. } => WaveformFamily::Plastic,
            Self::Fabric { .. } => WaveformFamily::Fabric,
            Self::Ceramic { .. } => WaveformFamily::Ceramic,
            Self::Rubber { .. } => WaveformFamily::Rubber,
        }
    }

    /// Shape parameter value, `None` for sine
    #[must_use]
    pub const fn parameter(&self) -> Option<f64> {
        match *self {
            Self::Sine => None,
            Self::Glass { brightness: p }
            | Self::Metal { resonance: p }
            | Self::Wood { warmth: p }
            | Self::Plastic { hardness: p }
            | Self::Fabric { softness: p }
            | Self::Ceramic { brittleness: p }
            | Self::Rubber { elasticity: p } => Some(p),
        }
    }

    /// Shape of `family` with its parameter set to `value` (ignored for sine)
    #[must_use]
    pub fn with_parameter(family: WaveformFamily, value: f64) -> Self {
        let mut shape = Self::default_for(family);
        if let Some(slot) = shape.parameter_mut() {
            *slot = value;
        }
        shape
    }

    fn parameter_mut(&mut self) -> Option<&mut f64> {
        match self {
            Self::Sine => None,
            Self::Glass { brightness: p }
            | Self::Metal { resonance: p }
            | Self::Wood { warmth: p }
            | Self::Plastic { hardness: p }
            | Self::Fabric { softness: p }
            | Self::Ceramic { brittleness: p }
            | Self::Rubber { elasticity: p } => Some(p),
        }
    }

    /// Check the shape parameter is finite and non-negative.
    ///
    /// # Errors
    ///
    /// [`MaterialError::InvalidParameter`] naming the offending field.
    pub fn validate(&self) -> Result<(), MaterialError> {
        match (self.family().parameter_name(), self.parameter()) {
            (Some(name), Some(value)) if !value.is_finite() || value < 0.0 => {
                Err(MaterialError::InvalidParameter { name, value })
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Named-material record: motion gain, pitch scale and timbre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    /// Multiplies pointer speed into motion-channel current
    #[serde(rename = "r", alias = "roughness")]
    pub roughness: f64,
    /// Multiplies the base frequency of motion and click grains
    #[serde(rename = "f", alias = "freq_scale", default = "defaults::unit")]
    pub freq_scale: f64,
    /// Timbre
    #[serde(flatten)]
    pub shape: MaterialShape,
}

impl MaterialProfile {
    /// Create and validate a profile.
    ///
    /// # Errors
    ///
    /// [`MaterialError::InvalidScale`] for a negative or non-finite
    /// roughness or frequency scale, or the shape's own validation error.
    pub fn new(roughness: f64, freq_scale: f64, shape: MaterialShape) -> Result<Self, MaterialError> {
        let profile = Self { roughness, freq_scale, shape };
        profile.validate()?;
        Ok(profile)
    }

    /// Plain-sine profile
    #[must_use]
    pub const fn sine(roughness: f64, freq_scale: f64) -> Self {
        Self { roughness, freq_scale, shape: MaterialShape::Sine }
    }

    /// Validate scales and shape.
    ///
    /// # Errors
    ///
    /// See [`MaterialProfile::new`].
    pub fn validate(&self) -> Result<(), MaterialError> {
        for (field, value) in [("roughness", self.roughness), ("freq_scale", self.freq_scale)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MaterialError::InvalidScale { field, value });
            }
        }
        self.shape.validate()
    }

    /// Waveform family
    #[inline]
    #[must_use]
    pub const fn family(&self) -> WaveformFamily {
        self.shape.family()
    }

    /// `base_hz` scaled by this material, truncated to whole hertz
    #[must_use]
    pub fn scaled_hz(&self, base_hz: f64) -> f64 {
        libm::trunc(base_hz * self.freq_scale)
    }
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self::sine(0.3, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_tags_round_trip() {
        for family in WaveformFamily::ALL {
            assert_eq!(WaveformFamily::from_tag(family.as_str()), Some(family));
            assert_eq!(MaterialShape::default_for(family).family(), family);
        }
        assert_eq!(WaveformFamily::from_tag(" Glass "), Some(WaveformFamily::Glass));
        assert_eq!(WaveformFamily::from_tag("unknown"), None);
    }

    #[test]
    fn test_from_params() {
        let shape = MaterialShape::from_params("metal", [("resonance", 2.5)]).unwrap();
        assert_eq!(shape, MaterialShape::Metal { resonance: 2.5 });

        let shape = MaterialShape::from_params("wood", []).unwrap();
        assert_eq!(shape, MaterialShape::Wood { warmth: 1.0 });

        assert_eq!(
            MaterialShape::from_params("glass", [("warmth", 1.0)]),
            Err(MaterialError::UnexpectedParameter { family: "glass" })
        );
        assert_eq!(
            MaterialShape::from_params("sine", [("brightness", 1.0)]),
            Err(MaterialError::UnexpectedParameter { family: "sine" })
        );
        assert_eq!(
            MaterialShape::from_params("velvet", []),
            Err(MaterialError::UnknownFamily)
        );
        assert!(matches!(
            MaterialShape::from_params("fabric", [("softness", -1.0)]),
            Err(MaterialError::InvalidParameter { name: "softness", .. })
        ));
    }

    #[test]
    fn test_profile_validation() {
        assert!(MaterialProfile::new(0.4, 1.0, MaterialShape::Plastic { hardness: 1.1 }).is_ok());
        assert!(matches!(
            MaterialProfile::new(f64::NAN, 1.0, MaterialShape::Sine),
            Err(MaterialError::InvalidScale { field: "roughness", .. })
        ));
        assert!(matches!(
            MaterialProfile::new(0.4, -2.0, MaterialShape::Sine),
            Err(MaterialError::InvalidScale { field: "freq_scale", .. })
        ));
    }

    #[test]
    fn test_scaled_hz_truncates() {
        let profile = MaterialProfile::sine(0.7, 1.1);
        assert_eq!(profile.scaled_hz(35.0), 38.0);
        assert_eq!(profile.scaled_hz(220.0), 242.0);
    }
}
