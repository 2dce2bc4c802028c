use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationCategory;
use crate::analytics::classification::default_monthly_limit;

/// A medication in the user's medicine cabinet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub category: MedicationCategory,
    pub is_acute: bool,
    /// MOH threshold in days per month. `None` means the drug is not tracked.
    pub monthly_limit_days: Option<u32>,
}

impl Medication {
    /// Creates a medication with the clinical default MOH limit for its category.
    pub fn new(name: impl Into<String>, category: MedicationCategory, is_acute: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            is_acute,
            monthly_limit_days: default_monthly_limit(category, is_acute),
        }
    }

    /// A limit of zero cannot be measured against and counts as untracked.
    pub fn is_moh_tracked(&self) -> bool {
        matches!(self.monthly_limit_days, Some(limit) if limit > 0)
    }
}

/// One administration of a drug, owned by either an attack or a medication health event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationIntake {
    /// `None` when the user logged a free-text drug.
    pub medication_ref: Option<Uuid>,
    pub medication_name: Option<String>,
    pub category: MedicationCategory,
    pub dosage: f64,
    pub unit: String,
    pub time_taken: DateTime<Utc>,
}

impl MedicationIntake {
    pub fn for_medication(
        medication: &Medication,
        dosage: f64,
        unit: &str,
        time_taken: DateTime<Utc>,
    ) -> Self {
        Self {
            medication_ref: Some(medication.id),
            medication_name: Some(medication.name.clone()),
            category: medication.category,
            dosage,
            unit: unit.into(),
            time_taken,
        }
    }

    /// Name used for display breakdowns; the definition's name wins over the free-text label.
    pub fn display_name<'a>(&'a self, medications: &'a [Medication]) -> Option<&'a str> {
        self.medication_ref
            .and_then(|id| medications.iter().find(|m| m.id == id))
            .map(|m| m.name.as_str())
            .or(self.medication_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_applies_default_limit() {
        let nsaid = Medication::new("Ibuprofen", MedicationCategory::Nsaid, true);
        assert_eq!(nsaid.monthly_limit_days, Some(15));
        assert!(nsaid.is_moh_tracked());

        let preventive = Medication::new("Topiramate", MedicationCategory::Preventive, false);
        assert!(!preventive.is_moh_tracked());
    }

    #[test]
    fn zero_limit_is_not_tracked() {
        let mut triptan = Medication::new("Rizatriptan", MedicationCategory::Triptan, true);
        triptan.monthly_limit_days = Some(0);
        assert!(!triptan.is_moh_tracked());
        triptan.monthly_limit_days = Some(1);
        assert!(triptan.is_moh_tracked());
    }

    #[test]
    fn display_name_prefers_definition() {
        let mut triptan = Medication::new("Sumatriptan", MedicationCategory::Triptan, true);
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let mut intake = MedicationIntake::for_medication(&triptan, 50.0, "mg", at);
        triptan.name = "Imigran".into();
        let cabinet = vec![triptan];
        assert_eq!(intake.display_name(&cabinet), Some("Imigran"));

        // Definition deleted: fall back to the logged label
        assert_eq!(intake.display_name(&[]), Some("Sumatriptan"));

        intake.medication_ref = None;
        intake.medication_name = None;
        assert_eq!(intake.display_name(&cabinet), None);
    }
}
