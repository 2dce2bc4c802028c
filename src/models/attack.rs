use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::MedicationIntake;
use super::weather::WeatherSnapshot;

/// A single migraine episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    /// `None` while the attack is ongoing.
    pub end_time: Option<DateTime<Utc>>,
    /// VAS score, 0-10.
    pub pain_intensity: u8,
    /// Administration order as logged; not guaranteed to be chronological.
    pub medication_intakes: Vec<MedicationIntake>,
    pub weather: Option<WeatherSnapshot>,

    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub pain_locations: Vec<String>,
    #[serde(default)]
    pub pain_qualities: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub has_aura: bool,
    /// Only meaningful when `has_aura` is set.
    #[serde(default)]
    pub aura_types: Vec<String>,
}

impl AttackEvent {
    pub fn new(start_time: DateTime<Utc>, pain_intensity: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: None,
            pain_intensity,
            medication_intakes: Vec::new(),
            weather: None,
            triggers: Vec::new(),
            pain_locations: Vec::new(),
            pain_qualities: Vec::new(),
            symptoms: Vec::new(),
            has_aura: false,
            aura_types: Vec::new(),
        }
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn has_medication(&self) -> bool {
        !self.medication_intakes.is_empty()
    }

    /// Duration in seconds; ongoing attacks are measured up to `now`.
    pub fn duration_secs(&self, now: DateTime<Utc>) -> f64 {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// Duration of a completed attack; `None` while ongoing.
    pub fn completed_duration_secs(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 1000.0)
    }
}
