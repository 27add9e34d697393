//! Pharmacokinetic model constants.

use crate::{Error, Result};

pub const DEFAULT_HALF_LIFE_DAYS: f64 = 4.5;
pub const DEFAULT_ESTER_FREE_FRACTION: f64 = 0.7;
pub const DEFAULT_DISTRIBUTION_FACTOR: f64 = 18.2;
pub const DEFAULT_CLEARANCE_FRACTION: f64 = 0.15;
pub const DEFAULT_BASELINE_SERUM_LEVEL: f64 = 600.0;

/// Ester concentration of the oil, used to turn a dose into an injected volume
pub const DOSE_CONCENTRATION_MG_PER_ML: f64 = 250.0;

/// Constants driving the depot / release / serum recurrence
///
/// Every constructor validates, so a `ModelConstants` value is always safe
/// to fold with: the half-life is strictly positive and every fraction is
/// within [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelConstants {
    half_life_days: f64,
    ester_free_fraction: f64,
    distribution_factor: f64,
    clearance_fraction: f64,
    baseline_serum_level: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            ester_free_fraction: DEFAULT_ESTER_FREE_FRACTION,
            distribution_factor: DEFAULT_DISTRIBUTION_FACTOR,
            clearance_fraction: DEFAULT_CLEARANCE_FRACTION,
            baseline_serum_level: DEFAULT_BASELINE_SERUM_LEVEL,
        }
    }
}

impl ModelConstants {
    pub fn new(
        half_life_days: f64,
        ester_free_fraction: f64,
        distribution_factor: f64,
        clearance_fraction: f64,
        baseline_serum_level: f64,
    ) -> Result<Self> {
        if !(half_life_days.is_finite() && half_life_days > 0.0) {
            return Err(Error::InvalidConstant(format!(
                "half-life must be a positive number of days, got {}",
                half_life_days
            )));
        }
        check_fraction("ester free fraction", ester_free_fraction)?;
        check_non_negative("distribution factor", distribution_factor)?;
        validate_clearance_fraction(clearance_fraction)?;
        check_non_negative("baseline serum level", baseline_serum_level)?;

        Ok(Self {
            half_life_days,
            ester_free_fraction,
            distribution_factor,
            clearance_fraction,
            baseline_serum_level,
        })
    }

    /// Default constants with an operator-chosen clearance fraction
    pub fn with_clearance_fraction(clearance_fraction: f64) -> Result<Self> {
        let mut constants = Self::default();
        constants.set_clearance_fraction(clearance_fraction)?;
        Ok(constants)
    }

    /// Replace the clearance fraction
    ///
    /// On error the previously accepted value stays in effect.
    pub fn set_clearance_fraction(&mut self, clearance_fraction: f64) -> Result<()> {
        validate_clearance_fraction(clearance_fraction)?;
        tracing::debug!(
            "Clearance fraction changed from {} to {}",
            self.clearance_fraction,
            clearance_fraction
        );
        self.clearance_fraction = clearance_fraction;
        Ok(())
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }

    pub fn ester_free_fraction(&self) -> f64 {
        self.ester_free_fraction
    }

    pub fn distribution_factor(&self) -> f64 {
        self.distribution_factor
    }

    pub fn clearance_fraction(&self) -> f64 {
        self.clearance_fraction
    }

    pub fn baseline_serum_level(&self) -> f64 {
        self.baseline_serum_level
    }
}

/// Check that a clearance fraction lies within [0, 1]
pub fn validate_clearance_fraction(value: f64) -> Result<()> {
    check_fraction("clearance fraction", value)
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConstant(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConstant(format!(
            "{} must be a finite, non-negative number, got {}",
            name, value
        )))
    }
}
