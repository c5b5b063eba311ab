//! Playback rate values and their display formatting.

use std::fmt;

use crate::error::{ModelError, Result};

/// Slowest rate a video may be driven at.
pub const MIN_RATE: f64 = 0.25;
/// Fastest rate a video may be driven at.
pub const MAX_RATE: f64 = 4.0;
/// Increment used by the step controls and the preset grid.
pub const RATE_STEP: f64 = 0.25;
/// Normal speed; used whenever nothing has been persisted yet.
pub const DEFAULT_RATE: f64 = 1.0;
/// Two rates closer than this are treated as the same rate.
pub const RATE_TOLERANCE: f64 = 0.01;

/// A playback-speed multiplier within `[MIN_RATE, MAX_RATE]`.
///
/// The inner value is always finite and in range. Use [`RateValue::new`] for
/// user input that must be rejected when out of range, and
/// [`RateValue::clamped`] for programmatic values that are pulled into range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct RateValue(f64);

impl RateValue {
    pub const DEFAULT: RateValue = RateValue(DEFAULT_RATE);
    pub const MIN: RateValue = RateValue(MIN_RATE);
    pub const MAX: RateValue = RateValue(MAX_RATE);

    /// Validate `rate` without altering it.
    pub fn new(rate: f64) -> Result<Self> {
        if rate.is_finite() && (MIN_RATE..=MAX_RATE).contains(&rate) {
            Ok(RateValue(rate))
        } else {
            Err(ModelError::OutOfRange { requested: rate })
        }
    }

    /// Pull `rate` into range. NaN maps to the default rate.
    pub fn clamped(rate: f64) -> Self {
        if rate.is_nan() {
            return Self::DEFAULT;
        }
        RateValue(rate.clamp(MIN_RATE, MAX_RATE))
    }

    /// Interpret a rate read back from a store or a live element.
    ///
    /// Only a positive finite number is a reading; anything else is treated
    /// as no value at all. Positive readings outside the range are clamped.
    pub fn from_observed(rate: f64) -> Option<Self> {
        (rate.is_finite() && rate > 0.0).then(|| Self::clamped(rate))
    }

    /// Parse free-form user input such as `"1.75"` or `" 2 "`.
    pub fn parse_input(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let rate = trimmed
            .parse::<f64>()
            .map_err(|_| ModelError::NotANumber(trimmed.to_string()))?;
        Self::new(rate)
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Returns the rate moved by `delta`, clamped to range.
    pub fn offset(self, delta: f64) -> Self {
        Self::clamped(self.0 + delta)
    }

    pub fn approx_eq(self, other: RateValue) -> bool {
        (self.0 - other.0).abs() <= RATE_TOLERANCE
    }
}

impl Default for RateValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for RateValue {
    type Error = ModelError;

    fn try_from(rate: f64) -> Result<Self> {
        Self::new(rate)
    }
}

impl From<RateValue> for f64 {
    fn from(rate: RateValue) -> Self {
        rate.0
    }
}

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_rate(self.0))
    }
}

/// Render a rate with two decimals and trailing zeros trimmed: `1.5`, `2`, `2.25`.
pub fn format_rate(rate: f64) -> String {
    let fixed = format!("{rate:.2}");
    if !fixed.contains('.') {
        return fixed;
    }
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_rate(1.0), "1");
        assert_eq!(format_rate(1.5), "1.5");
        assert_eq!(format_rate(2.25), "2.25");
        assert_eq!(format_rate(4.0), "4");
        assert_eq!(format_rate(0.25), "0.25");
        assert_eq!(format_rate(10.0), "10");
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(RateValue::new(0.25).is_ok());
        assert!(RateValue::new(4.0).is_ok());
        assert_eq!(
            RateValue::new(4.01),
            Err(ModelError::OutOfRange { requested: 4.01 })
        );
        assert!(RateValue::new(0.0).is_err());
        assert!(RateValue::new(f64::NAN).is_err());
        assert!(RateValue::new(f64::INFINITY).is_err());
    }

    #[test]
    fn clamped_pulls_into_range() {
        assert_eq!(RateValue::clamped(8.0).get(), MAX_RATE);
        assert_eq!(RateValue::clamped(0.1).get(), MIN_RATE);
        assert_eq!(RateValue::clamped(-3.0).get(), MIN_RATE);
        assert_eq!(RateValue::clamped(1.3).get(), 1.3);
        assert_eq!(RateValue::clamped(f64::NAN), RateValue::DEFAULT);
        assert_eq!(RateValue::clamped(f64::INFINITY).get(), MAX_RATE);
    }

    #[test]
    fn observed_readings_require_a_positive_number() {
        assert_eq!(RateValue::from_observed(1.5).map(RateValue::get), Some(1.5));
        assert_eq!(RateValue::from_observed(16.0), Some(RateValue::MAX));
        assert_eq!(RateValue::from_observed(0.0), None);
        assert_eq!(RateValue::from_observed(-1.0), None);
        assert_eq!(RateValue::from_observed(f64::NAN), None);
    }

    #[test]
    fn offset_clamps_at_bounds() {
        assert_eq!(RateValue::MAX.offset(RATE_STEP), RateValue::MAX);
        assert_eq!(RateValue::MIN.offset(-RATE_STEP), RateValue::MIN);
        assert_eq!(RateValue::DEFAULT.offset(RATE_STEP).get(), 1.25);
    }

    #[test]
    fn parse_input_handles_whitespace_and_garbage() {
        assert_eq!(RateValue::parse_input(" 1.75 ").map(RateValue::get), Ok(1.75));
        assert_eq!(
            RateValue::parse_input("fast"),
            Err(ModelError::NotANumber("fast".to_string()))
        );
        assert!(matches!(
            RateValue::parse_input("5"),
            Err(ModelError::OutOfRange { .. })
        ));
    }

    #[test]
    fn approx_eq_uses_tolerance() {
        let a = RateValue::clamped(1.5);
        assert!(a.approx_eq(RateValue::clamped(1.505)));
        assert!(!a.approx_eq(RateValue::clamped(1.52)));
    }
}
