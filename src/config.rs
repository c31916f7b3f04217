//! Engine configuration.
//!
//! ```toml
//! # Monday that starts abs-week 0 (quoted ISO date).
//! epoch = "1969-12-29"
//! # Rotation offset given to the first activated week of new plans.
//! default_initial_rotation = 0
//! ```
//!
//! Missing keys fall back to their defaults.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{WeekCalendar, DEFAULT_EPOCH};
use crate::error::ConfigError;
use crate::models::RotationOffset;

/// Engine-wide settings shared by all plans of a coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Calendar epoch; must be a Monday.
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,

    /// Initial rotation offset for plans created without one.
    #[serde(default)]
    pub default_initial_rotation: RotationOffset,
}

fn default_epoch() -> NaiveDate {
    DEFAULT_EPOCH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            default_initial_rotation: 0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.calendar()?;
        Ok(config)
    }

    /// Loads config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Sets the epoch.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the default initial rotation offset.
    pub fn with_default_initial_rotation(mut self, offset: RotationOffset) -> Self {
        self.default_initial_rotation = offset;
        self
    }

    /// Week calendar for the configured epoch.
    pub fn calendar(&self) -> Result<WeekCalendar, ConfigError> {
        WeekCalendar::new(self.epoch)
    }
}
