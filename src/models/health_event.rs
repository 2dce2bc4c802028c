use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::HealthEventType;
use super::medication::MedicationIntake;

/// A non-attack event: scheduled medication, a therapy session or a procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub id: Uuid,
    pub event_type: HealthEventType,
    pub event_date: DateTime<Utc>,
    /// Only meaningful for `HealthEventType::Medication`.
    pub medication_intakes: Vec<MedicationIntake>,
    /// Only meaningful for `HealthEventType::Therapy`.
    pub therapy_duration_seconds: Option<u32>,
    pub therapy_kind: Option<String>,
    pub procedure_name: Option<String>,
}

impl HealthEvent {
    pub fn new(event_type: HealthEventType, event_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            event_date,
            medication_intakes: Vec::new(),
            therapy_duration_seconds: None,
            therapy_kind: None,
            procedure_name: None,
        }
    }

    /// True for medication events that actually carry at least one intake.
    pub fn is_logged_medication(&self) -> bool {
        self.event_type == HealthEventType::Medication && !self.medication_intakes.is_empty()
    }
}
