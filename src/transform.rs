//! Per-pixel value transforms.
//!
//! A [`ValueTransform`] maps one sampled channel component (`0..=255`) to the
//! integer written into the output document. The CLI parses transforms from
//! short text specifiers; library callers can also supply any closure via
//! [`ValueTransform::custom`].
//!
//! | Specifier      | Result                          |
//! |----------------|---------------------------------|
//! | `identity`     | `v`                             |
//! | `invert`       | `255 - v`                       |
//! | `threshold:T`  | `1` if `v >= T`, else `0`       |
//! | `linear:M,O`   | `v * M + O`                     |
//! | `quantize:L`   | `v * L / 256` (`0..L`)          |

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use crate::error::PixelGridError;

/// Integer mapping applied to every sampled channel value.
#[derive(Clone, Default)]
pub enum ValueTransform {
    /// Emit the raw component value. This is the default.
    #[default]
    Identity,
    /// Emit `255 - v`.
    Invert,
    /// Emit `1` when `v` is at least the threshold, `0` otherwise.
    Threshold(u8),
    /// Emit `v * multiplier + offset`.
    Linear {
        /// Factor applied to the component.
        multiplier: i64,
        /// Constant added after scaling.
        offset: i64,
    },
    /// Reduce the component to `levels` evenly sized buckets.
    Quantize(u16),
    /// Any caller-provided mapping.
    Custom(Arc<dyn Fn(u8) -> i64 + Send + Sync>),
}

impl ValueTransform {
    /// Wrap a closure as a transform.
    pub fn custom<F>(function: F) -> Self
    where
        F: Fn(u8) -> i64 + Send + Sync + 'static,
    {
        ValueTransform::Custom(Arc::new(function))
    }

    /// Apply the transform to one component value.
    pub fn apply(&self, value: u8) -> i64 {
        let value_wide = i64::from(value);
        match self {
            ValueTransform::Identity => value_wide,
            ValueTransform::Invert => 255 - value_wide,
            ValueTransform::Threshold(threshold) => i64::from(value >= *threshold),
            ValueTransform::Linear { multiplier, offset } => {
                value_wide.saturating_mul(*multiplier).saturating_add(*offset)
            }
            ValueTransform::Quantize(levels) => value_wide * i64::from(*levels) / 256,
            ValueTransform::Custom(function) => function(value),
        }
    }
}

impl Debug for ValueTransform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValueTransform::Identity => f.write_str("Identity"),
            ValueTransform::Invert => f.write_str("Invert"),
            ValueTransform::Threshold(threshold) => {
                f.debug_tuple("Threshold").field(threshold).finish()
            }
            ValueTransform::Linear { multiplier, offset } => f
                .debug_struct("Linear")
                .field("multiplier", multiplier)
                .field("offset", offset)
                .finish(),
            ValueTransform::Quantize(levels) => f.debug_tuple("Quantize").field(levels).finish(),
            ValueTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for ValueTransform {
    type Err = PixelGridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_lowercase();
        let (name, argument) = match trimmed.split_once(':') {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (trimmed.as_str(), None),
        };
        let invalid = || PixelGridError::InvalidTransform(value.to_string());

        match (name, argument) {
            ("identity" | "raw", None) => Ok(ValueTransform::Identity),
            ("invert" | "inverse", None) => Ok(ValueTransform::Invert),
            ("threshold", Some(argument)) => argument
                .parse::<u8>()
                .map(ValueTransform::Threshold)
                .map_err(|_| invalid()),
            ("linear", Some(argument)) => {
                let (multiplier, offset) = match argument.split_once(',') {
                    Some((multiplier, offset)) => (multiplier.trim(), offset.trim()),
                    None => (argument, "0"),
                };
                Ok(ValueTransform::Linear {
                    multiplier: multiplier.parse().map_err(|_| invalid())?,
                    offset: offset.parse().map_err(|_| invalid())?,
                })
            }
            ("quantize", Some(argument)) => match argument.parse::<u16>() {
                Ok(levels) if levels > 0 => Ok(ValueTransform::Quantize(levels)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_invert_cover_full_range() {
        for value in 0..=255u8 {
            assert_eq!(ValueTransform::Identity.apply(value), i64::from(value));
            assert_eq!(ValueTransform::Invert.apply(value), 255 - i64::from(value));
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let transform = ValueTransform::Threshold(128);
        assert_eq!(transform.apply(127), 0);
        assert_eq!(transform.apply(128), 1);
        assert_eq!(transform.apply(255), 1);
    }

    #[test]
    fn quantize_stays_below_levels() {
        let transform = ValueTransform::Quantize(4);
        assert_eq!(transform.apply(0), 0);
        assert_eq!(transform.apply(63), 0);
        assert_eq!(transform.apply(64), 1);
        assert_eq!(transform.apply(255), 3);
    }

    #[test]
    fn custom_closure_is_applied() {
        let transform = ValueTransform::custom(|v| i64::from(v) * 10);
        assert_eq!(transform.apply(7), 70);
        assert_eq!(format!("{transform:?}"), "Custom(..)");
    }

    #[test]
    fn parse_specifiers() {
        assert!(matches!("identity".parse::<ValueTransform>(), Ok(ValueTransform::Identity)));
        assert!(matches!("INVERT".parse::<ValueTransform>(), Ok(ValueTransform::Invert)));
        assert!(matches!("threshold:10".parse::<ValueTransform>(), Ok(ValueTransform::Threshold(10))));
        assert!(matches!(
            "linear:2,-5".parse::<ValueTransform>(),
            Ok(ValueTransform::Linear {
                multiplier: 2,
                offset: -5
            })
        ));
        assert!(matches!(
            "linear:3".parse::<ValueTransform>(),
            Ok(ValueTransform::Linear {
                multiplier: 3,
                offset: 0
            })
        ));
        assert!(matches!("quantize:8".parse::<ValueTransform>(), Ok(ValueTransform::Quantize(8))));
    }

    #[test]
    fn parse_rejects_bad_specifiers() {
        for specifier in ["", "threshold", "threshold:300", "quantize:0", "linear:a,b", "sqrt"] {
            assert!(
                specifier.parse::<ValueTransform>().is_err(),
                "{specifier:?} should not parse"
            );
        }
    }
}
