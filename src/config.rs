//! Crate constants and engine configuration.
//!
//! Clinical constants default to the values used by the journal app
//! (chronic migraine at 15 attack days, MOH warning 3 days before the limit)
//! and can be overridden from JSON, e.g. when a clinician prefers a different
//! guideline.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::calendar::ReferenceCalendar;
use crate::error::AnalyticsError;

/// Application-level constants
pub const APP_NAME: &str = "migraine-analytics";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attack days per month at which a month counts as chronic migraine.
pub const CHRONIC_MIGRAINE_DAYS: u32 = 15;

/// Days before the monthly limit at which MOH risk becomes Medium.
pub const MOH_WARNING_MARGIN_DAYS: u32 = 3;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "migraine_analytics=info".into()
}

/// Engine configuration. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Offset of the reference calendar from UTC, in seconds.
    pub utc_offset_seconds: i32,
    /// First column of the calendar grid.
    pub week_start: Weekday,
    pub chronic_threshold_days: u32,
    pub moh_warning_margin_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: 0,
            week_start: Weekday::Sun,
            chronic_threshold_days: CHRONIC_MIGRAINE_DAYS,
            moh_warning_margin_days: MOH_WARNING_MARGIN_DAYS,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnalyticsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.chronic_threshold_days == 0 {
            return Err(AnalyticsError::Config(
                "chronic_threshold_days must be at least 1".into(),
            ));
        }
        self.calendar().map(|_| ())
    }

    /// Builds the reference calendar described by this config.
    pub fn calendar(&self) -> Result<ReferenceCalendar, AnalyticsError> {
        ReferenceCalendar::new(self.utc_offset_seconds, self.week_start)
    }
}
