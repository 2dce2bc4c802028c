//! Stateless classification rules: MOH limits and risk levels, pain bands,
//! attack-frequency levels and weather risk flags.

use serde::{Deserialize, Serialize};

use crate::config::MOH_WARNING_MARGIN_DAYS;
use crate::models::{MedicationCategory, PressureTrend, WeatherSnapshot};

// ═══════════════════════════════════════════
// MOH risk
// ═══════════════════════════════════════════

/// Medication Overuse Headache risk, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MohRiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl MohRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Clinical default MOH limit (days per month) for a newly defined medication.
/// NSAIDs: 15. Triptans, ergotamines, opioids: 10. Anything else is untracked.
pub fn default_monthly_limit(category: MedicationCategory, is_acute: bool) -> Option<u32> {
    if !is_acute {
        return None;
    }
    match category {
        MedicationCategory::Nsaid => Some(15),
        MedicationCategory::Triptan
        | MedicationCategory::Ergotamine
        | MedicationCategory::Opioid => Some(10),
        _ => None,
    }
}

/// Risk level with the standard 3-day warning margin.
pub fn moh_risk_level(used_days: u32, limit: u32) -> MohRiskLevel {
    moh_risk_level_with_margin(used_days, limit, MOH_WARNING_MARGIN_DAYS)
}

/// `used >= limit` is High, within `margin` days of the limit is Medium,
/// any other nonzero use is Low. A zero limit means "not tracked".
pub fn moh_risk_level_with_margin(used_days: u32, limit: u32, margin: u32) -> MohRiskLevel {
    if used_days == 0 || limit == 0 {
        return MohRiskLevel::None;
    }
    if used_days >= limit {
        MohRiskLevel::High
    } else if limit - used_days <= margin {
        MohRiskLevel::Medium
    } else {
        MohRiskLevel::Low
    }
}

/// Worst individual level. Never averaged: one medication over its limit is enough.
pub fn combined_risk<I>(levels: I) -> MohRiskLevel
where
    I: IntoIterator<Item = MohRiskLevel>,
{
    levels.into_iter().max().unwrap_or_default()
}

/// Share of the monthly limit already used, capped at 1.0.
pub fn threshold_progress(used_days: u32, limit: u32) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    (f64::from(used_days) / f64::from(limit)).min(1.0)
}

// ═══════════════════════════════════════════
// Pain & frequency bands
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBand {
    Mild,
    Moderate,
    Severe,
}

impl IntensityBand {
    /// 0-3 mild, 4-6 moderate, 7 and above severe.
    pub fn from_intensity(intensity: u8) -> Self {
        match intensity {
            0..=3 => Self::Mild,
            4..=6 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

/// How strongly the monthly attack frequency affects daily life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackFrequencyLevel {
    Minimal,
    Mild,
    Moderate,
    Chronic,
}

impl AttackFrequencyLevel {
    pub fn from_attack_days(attack_days: usize) -> Self {
        match attack_days {
            0..=4 => Self::Minimal,
            5..=10 => Self::Mild,
            11..=14 => Self::Moderate,
            _ => Self::Chronic,
        }
    }
}

// ═══════════════════════════════════════════
// Weather
// ═══════════════════════════════════════════

pub const LOW_PRESSURE_HPA: f64 = 1010.0;
pub const HIGH_HUMIDITY_PCT: f64 = 80.0;
pub const HOT_TEMPERATURE_C: f64 = 35.0;
pub const COLD_TEMPERATURE_C: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherRiskFlag {
    FallingPressure,
    HighHumidity,
    ExtremeHeat,
    ExtremeCold,
}

/// Conditions in `snapshot` known to trigger migraines.
pub fn weather_risk_flags(snapshot: &WeatherSnapshot) -> Vec<WeatherRiskFlag> {
    let mut flags = Vec::new();
    if snapshot.pressure_trend == PressureTrend::Falling
        && snapshot.pressure_hpa < LOW_PRESSURE_HPA
    {
        flags.push(WeatherRiskFlag::FallingPressure);
    }
    if snapshot.humidity_pct > HIGH_HUMIDITY_PCT {
        flags.push(WeatherRiskFlag::HighHumidity);
    }
    if snapshot.temperature_c > HOT_TEMPERATURE_C {
        flags.push(WeatherRiskFlag::ExtremeHeat);
    } else if snapshot.temperature_c < COLD_TEMPERATURE_C {
        flags.push(WeatherRiskFlag::ExtremeCold);
    }
    flags
}

pub fn is_high_risk_weather(snapshot: &WeatherSnapshot) -> bool {
    !weather_risk_flags(snapshot).is_empty()
}
