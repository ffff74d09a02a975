// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Player configuration
//!
//! Values are read from TOML (kebab-case keys). Every key is optional and
//! falls back to the built-in default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Convenient result alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid player config: {0}")]
    Invalid(String),
}

/// Timing and speed settings for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Spacing used when an event carries no recorded timestamp.
    pub default_interval_ms: u64,
    /// Floor for any scheduled delay.
    pub min_tick_ms: u64,
    /// Recorded gaps longer than this are shortened before speed scaling.
    pub max_gap_ms: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub initial_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 30,
            min_tick_ms: 4,
            max_gap_ms: 2_000,
            min_speed: 0.5,
            max_speed: 5.0,
            initial_speed: 1.0,
        }
    }
}

impl PlayerConfig {
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Load from an explicit path, else the per-user config file if it exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/stream-replay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stream-replay").join("config.toml"))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.min_speed.is_finite() && self.max_speed.is_finite()) {
            return Err(ConfigError::Invalid("speed bounds must be finite".into()));
        }
        if self.min_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min-speed must be positive, got {}",
                self.min_speed
            )));
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::Invalid(format!(
                "min-speed {} exceeds max-speed {}",
                self.min_speed, self.max_speed
            )));
        }
        if !(self.min_speed..=self.max_speed).contains(&self.initial_speed) {
            return Err(ConfigError::Invalid(format!(
                "initial-speed {} is outside [{}, {}]",
                self.initial_speed, self.min_speed, self.max_speed
            )));
        }
        if self.min_tick_ms == 0 {
            return Err(ConfigError::Invalid("min-tick-ms must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp a requested multiplier into range. Non-finite requests yield `None`.
    pub fn clamp_speed(&self, requested: f64) -> Option<f64> {
        requested.is_finite().then(|| requested.max(self.min_speed).min(self.max_speed))
    }

    /// Delay before an event given its recorded gap (if any) and the current speed.
    pub fn scaled_delay(&self, recorded_gap_ms: Option<u64>, speed: f64) -> Duration {
        let speed = self.clamp_speed(speed).filter(|speed| *speed > 0.0).unwrap_or(1.0);
        let base_ms = recorded_gap_ms.unwrap_or(self.default_interval_ms).min(self.max_gap_ms);
        let scaled = Duration::from_nanos((base_ms as f64 * 1_000_000.0 / speed).round() as u64);
        scaled.max(Duration::from_millis(self.min_tick_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PlayerConfig::from_toml_str("default-interval-ms = 50\nmax-speed = 8.0\n").unwrap();
        assert_eq!(config.default_interval_ms, 50);
        assert_eq!(config.max_speed, 8.0);
        assert_eq!(config.min_speed, 0.5);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_ranges() {
        assert!(matches!(
            PlayerConfig::from_toml_str("speed = 2"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PlayerConfig::from_toml_str("min-speed = 3.0\nmax-speed = 2.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PlayerConfig::from_toml_str("min-speed = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PlayerConfig::from_toml_str("initial-speed = 9.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min-tick-ms = 10").unwrap();
        let config = PlayerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.min_tick_ms, 10);
    }

    #[test]
    fn clamps_speed() {
        let config = PlayerConfig::default();
        assert_eq!(config.clamp_speed(10.0), Some(5.0));
        assert_eq!(config.clamp_speed(0.1), Some(0.5));
        assert_eq!(config.clamp_speed(2.5), Some(2.5));
        assert_eq!(config.clamp_speed(f64::NAN), None);
    }

    #[test]
    fn scaled_delay_caps_scales_and_floors() {
        let config = PlayerConfig::default();
        assert_eq!(config.scaled_delay(None, 1.0), Duration::from_millis(30));
        assert_eq!(config.scaled_delay(None, 2.0), Duration::from_millis(15));
        assert_eq!(config.scaled_delay(Some(10_000), 1.0), Duration::from_millis(2_000));
        assert_eq!(config.scaled_delay(Some(0), 1.0), Duration::from_millis(4));
        assert_eq!(config.scaled_delay(Some(10), 5.0), Duration::from_millis(4));
    }

    #[test]
    fn scaled_delay_never_divides_by_an_unclamped_speed() {
        let config = PlayerConfig::default();
        assert_eq!(config.scaled_delay(None, 0.0), Duration::from_millis(60));
        assert_eq!(config.scaled_delay(None, f64::NAN), Duration::from_millis(30));
        assert_eq!(config.scaled_delay(None, -3.0), Duration::from_millis(60));

        let unchecked = PlayerConfig {
            min_speed: 0.0,
            ..PlayerConfig::default()
        };
        assert_eq!(unchecked.scaled_delay(None, 0.0), Duration::from_millis(30));
    }
}
