//! xFAT configuration types
//!
//! Every section is `#[serde(default)]` so a partial TOML file only overrides
//! what it names:
//!
//! ```toml
//! [rate]
//! min_rate = 5000
//! max_rate = 9000
//! recovery_epochs = 4
//! penalty_impact_beta = 10
//!
//! [epoch]
//! duration_secs = 604800
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, XFatError};
use crate::math::RATE_PRECISION;

/// Shortest permitted epoch: 30 minutes
pub const MIN_EPOCH_DURATION_SECS: u64 = 30 * 60;

/// Longest permitted epoch: 4 weeks
pub const MAX_EPOCH_DURATION_SECS: u64 = 4 * 7 * 24 * 3600;

/// Upper bound for `recovery_epochs` (one year of weekly epochs)
pub const MAX_RECOVERY_EPOCHS: u64 = 52;

/// Upper bound for `penalty_impact_beta`
pub const MAX_PENALTY_IMPACT_BETA: u64 = 100;

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XFatConfig {
    /// Rate bounds and recovery parameters
    #[serde(default)]
    pub rate: RateParameters,

    /// Epoch clock settings
    #[serde(default)]
    pub epoch: EpochConfig,

    /// Vote-escrow conversion settings
    #[serde(default)]
    pub lock: LockConfig,
}

impl XFatConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| XFatError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| XFatError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| XFatError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.rate.validate()?;
        self.epoch.validate()?;
        self.lock.validate()
    }
}

/// Rate bounds and recovery parameters (owner-mutable)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateParameters {
    /// Floor for every rate, in basis points
    #[serde(default = "default_min_rate")]
    pub min_rate: u64,

    /// Ceiling for every rate, in basis points
    #[serde(default = "default_max_rate")]
    pub max_rate: u64,

    /// Idle epochs needed for full recovery to `max_rate` (1-52)
    #[serde(default = "default_recovery_epochs")]
    pub recovery_epochs: u64,

    /// Divisor applied to every size impact (1-100)
    #[serde(default = "default_penalty_impact_beta")]
    pub penalty_impact_beta: u64,

    /// Reported impact half-life; the decay itself is epoch-driven
    #[serde(default = "default_decay_half_life")]
    pub decay_half_life_secs: u64,
}

fn default_min_rate() -> u64 {
    5_000
}

fn default_max_rate() -> u64 {
    9_000
}

fn default_recovery_epochs() -> u64 {
    4
}

fn default_penalty_impact_beta() -> u64 {
    10
}

fn default_decay_half_life() -> u64 {
    7 * 24 * 3600
}

impl Default for RateParameters {
    fn default() -> Self {
        Self {
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
            recovery_epochs: default_recovery_epochs(),
            penalty_impact_beta: default_penalty_impact_beta(),
            decay_half_life_secs: default_decay_half_life(),
        }
    }
}

impl RateParameters {
    pub fn validate(&self) -> Result<()> {
        validate_bounds(self.min_rate, self.max_rate)?;
        validate_recovery(self.recovery_epochs, self.penalty_impact_beta, self.decay_half_life_secs)
    }
}

pub(crate) fn validate_bounds(min_rate: u64, max_rate: u64) -> Result<()> {
    if min_rate == 0 || min_rate >= max_rate || max_rate as u128 > RATE_PRECISION {
        return Err(XFatError::InvalidParameter(format!(
            "rate bounds must satisfy 0 < min ({}) < max ({}) <= {}",
            min_rate, max_rate, RATE_PRECISION
        )));
    }
    Ok(())
}

pub(crate) fn validate_recovery(recovery_epochs: u64, beta: u64, half_life: u64) -> Result<()> {
    if !(1..=MAX_RECOVERY_EPOCHS).contains(&recovery_epochs) {
        return Err(XFatError::InvalidParameter(format!(
            "recovery_epochs {} outside [1, {}]",
            recovery_epochs, MAX_RECOVERY_EPOCHS
        )));
    }
    if !(1..=MAX_PENALTY_IMPACT_BETA).contains(&beta) {
        return Err(XFatError::InvalidParameter(format!(
            "penalty_impact_beta {} outside [1, {}]",
            beta, MAX_PENALTY_IMPACT_BETA
        )));
    }
    if half_life == 0 {
        return Err(XFatError::InvalidParameter("decay_half_life_secs must be > 0".into()));
    }
    Ok(())
}

/// Epoch clock settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochConfig {
    /// Epoch length in seconds
    #[serde(default = "default_epoch_duration")]
    pub duration_secs: u64,
}

fn default_epoch_duration() -> u64 {
    7 * 24 * 3600
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_epoch_duration(),
        }
    }
}

impl EpochConfig {
    pub fn validate(&self) -> Result<()> {
        validate_epoch_duration(self.duration_secs)
    }
}

pub(crate) fn validate_epoch_duration(duration_secs: u64) -> Result<()> {
    if !(MIN_EPOCH_DURATION_SECS..=MAX_EPOCH_DURATION_SECS).contains(&duration_secs) {
        return Err(XFatError::InvalidParameter(format!(
            "epoch duration {}s outside [{}, {}]",
            duration_secs, MIN_EPOCH_DURATION_SECS, MAX_EPOCH_DURATION_SECS
        )));
    }
    Ok(())
}

/// Vote-escrow conversion settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lock duration requested for every conversion to a locked position
    #[serde(default = "default_lock_duration")]
    pub duration_secs: u64,
}

fn default_lock_duration() -> u64 {
    4 * 365 * 24 * 3600
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_lock_duration(),
        }
    }
}

impl LockConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration_secs == 0 {
            return Err(XFatError::InvalidParameter("lock duration must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = XFatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate.max_rate, 9_000);
        assert_eq!(config.epoch.duration_secs, 604_800);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = XFatConfig::from_toml_str(
            r#"
            [rate]
            min_rate = 7000
            penalty_impact_beta = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.rate.min_rate, 7_000);
        assert_eq!(config.rate.max_rate, 9_000);
        assert_eq!(config.rate.penalty_impact_beta, 2);
        assert_eq!(config.lock, LockConfig::default());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let result = XFatConfig::from_toml_str("[rate]\nmin_rate = 9500\n");
        assert!(matches!(result, Err(XFatError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        assert!(validate_bounds(0, 9_000).is_err());
        assert!(validate_bounds(5_000, 10_001).is_err());
        assert!(validate_bounds(5_000, 10_000).is_ok());
        assert!(validate_recovery(0, 10, 1).is_err());
        assert!(validate_recovery(53, 10, 1).is_err());
        assert!(validate_recovery(4, 0, 1).is_err());
        assert!(validate_recovery(4, 101, 1).is_err());
        assert!(validate_epoch_duration(1_799).is_err());
        assert!(validate_epoch_duration(MAX_EPOCH_DURATION_SECS + 1).is_err());
        assert!(validate_epoch_duration(1_800).is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        let result = XFatConfig::from_toml_str("[rate\nmin_rate = ");
        assert!(matches!(result, Err(XFatError::Config(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = XFatConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(XFatConfig::from_toml_str(&text).unwrap(), config);
    }
}
