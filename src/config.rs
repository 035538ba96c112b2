//! Engine configuration.
//!
//! An [`EngineConfig`] is read from TOML. Every field has a default, so an
//! empty document yields the standard six-day week and the default
//! placement policy.
//!
//! ```toml
//! [calendar]
//! days = ["Mon", "Tue", "Wed", "Thu", "Fri"]
//!
//! [calendar.morning]
//! periods = 5
//! start = "07:00:00"
//!
//! [[calendar.fixed]]
//! day = "Mon"
//! period = 1
//! kind = "FlagCeremony"
//!
//! [policy]
//! overwrite = false
//! max_daily_periods = 2
//! cap_scope = "Day"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::{CalendarConfig, WeekCalendar};

/// Range over which the per-subject placement caps are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapScope {
    /// Whole school day.
    Day,
    /// Morning and afternoon counted separately.
    Session,
}

/// Placement rules and regeneration policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Regenerate classes that already have an active schedule instead of
    /// skipping them.
    pub overwrite: bool,
    /// Most periods of one subject within the cap scope.
    pub max_daily_periods: u8,
    /// Most periods of one subject in directly consecutive period numbers.
    pub max_consecutive: u8,
    pub cap_scope: CapScope,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            overwrite: false,
            max_daily_periods: 2,
            max_consecutive: 2,
            cap_scope: CapScope::Day,
        }
    }
}

impl SchedulingPolicy {
    /// Sets the overwrite policy.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Rejects caps that would forbid placing anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_daily_periods == 0 {
            return Err(ConfigError::Policy("max_daily_periods must be at least 1".into()));
        }
        if self.max_consecutive == 0 {
            return Err(ConfigError::Policy("max_consecutive must be at least 1".into()));
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub calendar: CalendarConfig,
    pub policy: SchedulingPolicy,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.policy.validate()?;
        WeekCalendar::new(config.calendar.clone())?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Builds the calendar described by this configuration.
    pub fn week_calendar(&self) -> Result<WeekCalendar, ConfigError> {
        Ok(WeekCalendar::new(self.calendar.clone())?)
    }
}
