use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PressureTrend;

/// Weather conditions captured at the start of an attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub timestamp: DateTime<Utc>,
    pub pressure_hpa: f64,
    pub pressure_trend: PressureTrend,
    pub temperature_c: f64,
    /// 0-100
    pub humidity_pct: f64,
}
