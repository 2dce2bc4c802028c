use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::aggregator::{filter_in_window, unique_days_touched};
use super::statistics::{mean, to_u32, HistorySnapshot, StatisticsEngine};
use crate::calendar::DateWindow;
use crate::models::{AttackEvent, HealthEventType};

/// Default span compared on each side of the first treatment.
pub const TREATMENT_WINDOW_DAYS: u32 = 30;

/// Attack burden before vs after the first treatment of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentCorrelation {
    pub event_type: HealthEventType,
    pub treatment_start: DateTime<Utc>,
    pub before: DateWindow,
    pub after: DateWindow,
    pub before_attack_days: u32,
    pub after_attack_days: u32,
    pub before_average_intensity: f64,
    pub after_average_intensity: f64,
}

impl TreatmentCorrelation {
    /// Positive when the treatment was followed by fewer attack days.
    pub fn attack_days_reduction(&self) -> i64 {
        i64::from(self.before_attack_days) - i64::from(self.after_attack_days)
    }

    pub fn intensity_reduction(&self) -> f64 {
        self.before_average_intensity - self.after_average_intensity
    }

    pub fn has_improvement(&self) -> bool {
        self.attack_days_reduction() > 0 || self.intensity_reduction() > 0.0
    }
}

impl StatisticsEngine {
    /// Compares `[start - before_days, start)` with `[start, start + after_days)`,
    /// where `start` is the earliest health event of `event_type`.
    /// Returns `None` when no such event exists.
    pub fn treatment_correlation(
        &self,
        snapshot: &HistorySnapshot,
        event_type: HealthEventType,
        before_days: u32,
        after_days: u32,
    ) -> Option<TreatmentCorrelation> {
        let treatment_start = snapshot
            .health_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .map(|e| e.event_date)
            .min()?;

        // Spans past the representable range clamp to its ends
        let before = DateWindow::new(
            treatment_start
                .checked_sub_signed(Duration::days(i64::from(before_days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            treatment_start,
        );
        let after = DateWindow::new(
            treatment_start,
            treatment_start
                .checked_add_signed(Duration::days(i64::from(after_days)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );

        let (before_attack_days, before_average_intensity) =
            self.attack_burden(&snapshot.attacks, &before);
        let (after_attack_days, after_average_intensity) =
            self.attack_burden(&snapshot.attacks, &after);

        tracing::debug!(
            event_type = %event_type,
            start = %treatment_start,
            before_attack_days,
            after_attack_days,
            "Computed treatment correlation"
        );

        Some(TreatmentCorrelation {
            event_type,
            treatment_start,
            before,
            after,
            before_attack_days,
            after_attack_days,
            before_average_intensity,
            after_average_intensity,
        })
    }

    /// (attack days, mean intensity) for attacks starting in `window`.
    fn attack_burden(&self, attacks: &[AttackEvent], window: &DateWindow) -> (u32, f64) {
        let by_start = |a: &AttackEvent| Some(a.start_time);
        let days = unique_days_touched(attacks, window, by_start, self.calendar()).len();
        let intensity = mean(
            filter_in_window(attacks, window, by_start)
                .iter()
                .map(|a| f64::from(a.pain_intensity)),
        );
        (to_u32(days), intensity)
    }
}
