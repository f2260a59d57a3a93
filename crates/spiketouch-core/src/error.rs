//! Error types for spiketouch core
//!
//! Numeric code in this crate never fails on ordinary input: currents are
//! clipped and synthesis degrades to a plain sine. The only fallible surface
//! is turning loosely-typed material descriptions into a [`MaterialShape`].
//!
//! [`MaterialShape`]: crate::audio::MaterialShape

use core::fmt;

// ============================================================================
// Material Errors
// ============================================================================

/// Errors raised while validating a material description.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialError {
    /// The waveform family tag is not one of the known families
    UnknownFamily,
    /// A shape parameter name does not belong to the selected family
    UnexpectedParameter {
        /// Family the parameter was given for
        family: &'static str,
    },
    /// A shape parameter is NaN, infinite or negative
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },
    /// Roughness or frequency scale is out of range
    InvalidScale {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFamily => write!(f, "Unknown waveform family"),
            Self::UnexpectedParameter { family } => {
                write!(f, "Unexpected shape parameter for {family} family")
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "Invalid shape parameter {name}: {value}")
            }
            Self::InvalidScale { field, value } => {
                write!(f, "Invalid {field}: {value} (must be finite and non-negative)")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MaterialError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_material_error_display() {
        let err = MaterialError::InvalidParameter { name: "brightness", value: -1.0 };
        assert_eq!(err.to_string(), "Invalid shape parameter brightness: -1");

        let err = MaterialError::UnexpectedParameter { family: "glass" };
        assert!(err.to_string().contains("glass"));
    }
}
