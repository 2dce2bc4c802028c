use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregator::{count_in_window, filter_in_window, unique_days_touched};
use super::classification::{
    combined_risk, moh_risk_level_with_margin, threshold_progress, AttackFrequencyLevel,
    MohRiskLevel,
};
use crate::calendar::{DateWindow, ReferenceCalendar, YearMonth};
use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::models::{AttackEvent, HealthEvent, HealthEventType, Medication, MedicationIntake};

// ═══════════════════════════════════════════
// Inputs
// ═══════════════════════════════════════════

/// Immutable copy of the journal handed to the engine by the storage layer.
/// The engine only reads it; callers snapshot before invoking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub attacks: Vec<AttackEvent>,
    pub health_events: Vec<HealthEvent>,
    pub medications: Vec<Medication>,
}

impl HistorySnapshot {
    pub fn get_medication(&self, id: &Uuid) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == *id)
    }
}

/// An intake together with the instant it is counted on.
///
/// Intakes are dated by their parent record, not by `time_taken`: the attack
/// start for acute use, the event date for preventive use. A dose taken after
/// midnight during an attack that began the evening before belongs to the
/// attack's day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedIntake<'a> {
    pub intake: &'a MedicationIntake,
    pub counted_at: DateTime<Utc>,
}

/// Intakes logged during attacks (acute context), dated by attack start.
pub fn acute_intakes(attacks: &[AttackEvent]) -> Vec<DatedIntake<'_>> {
    attacks
        .iter()
        .flat_map(|a| {
            a.medication_intakes.iter().map(move |intake| DatedIntake {
                intake,
                counted_at: a.start_time,
            })
        })
        .collect()
}

/// Intakes logged through medication health events (preventive context),
/// dated by the event.
pub fn preventive_intakes(health_events: &[HealthEvent]) -> Vec<DatedIntake<'_>> {
    health_events
        .iter()
        .filter(|e| e.event_type == HealthEventType::Medication)
        .flat_map(|e| {
            e.medication_intakes.iter().map(move |intake| DatedIntake {
                intake,
                counted_at: e.event_date,
            })
        })
        .collect()
}

// ═══════════════════════════════════════════
// Outputs
// ═══════════════════════════════════════════

/// Monthly use of one medication against its MOH limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationUsage {
    pub medication_id: Uuid,
    pub medication_name: String,
    pub used_days: u32,
    pub used_count: u32,
    pub limit_days: Option<u32>,
    pub risk_level: MohRiskLevel,
    /// 0.0-1.0 share of the limit; 0.0 when untracked.
    pub threshold_progress: f64,
}

/// Every number shown for one month. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStatistics {
    pub month: YearMonth,
    pub window: DateWindow,

    /// False when no attack started in the month; distinguishes a 0 average from no data.
    pub has_attack_data: bool,
    pub attack_days: u32,
    pub total_attacks: u32,
    pub average_intensity: f64,
    pub average_duration_secs: f64,
    pub ongoing_attacks: u32,
    pub is_chronic: bool,
    pub frequency_level: AttackFrequencyLevel,

    pub acute_medication_days: u32,
    pub acute_medication_count: u32,
    pub preventive_medication_days: u32,
    pub preventive_medication_count: u32,
    /// Plain sums of the acute and preventive figures.
    pub total_medication_days: u32,
    pub total_medication_count: u32,
    /// Days on which both acute and preventive intakes were logged.
    /// Counted once per source in the totals above.
    pub overlapping_medication_days: Vec<NaiveDate>,

    pub therapy_count: u32,
    pub procedure_count: u32,

    pub moh_risk: MohRiskLevel,
    pub medication_usage: Vec<MedicationUsage>,
}

impl DerivedStatistics {
    pub fn has_acute_medication(&self) -> bool {
        self.acute_medication_count > 0
    }

    pub fn has_preventive_medication(&self) -> bool {
        self.preventive_medication_count > 0
    }

    pub fn has_therapy(&self) -> bool {
        self.therapy_count > 0
    }

    pub fn has_procedure(&self) -> bool {
        self.procedure_count > 0
    }
}

// ═══════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════

/// Single source of truth for every statistic the journal displays.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    config: AnalyticsConfig,
    calendar: ReferenceCalendar,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self {
            config: AnalyticsConfig::default(),
            calendar: ReferenceCalendar::utc(),
        }
    }
}

impl StatisticsEngine {
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        let calendar = config.calendar()?;
        Ok(Self { config, calendar })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn calendar(&self) -> &ReferenceCalendar {
        &self.calendar
    }

    /// Statistics for `month`. `now` is the provisional end of ongoing attacks.
    pub fn monthly_statistics(
        &self,
        snapshot: &HistorySnapshot,
        month: YearMonth,
        now: DateTime<Utc>,
    ) -> DerivedStatistics {
        let cal = &self.calendar;
        let window = cal.month_window(month);
        let by_start = |a: &AttackEvent| Some(a.start_time);

        // Attacks
        let attacks = filter_in_window(&snapshot.attacks, &window, by_start);
        let attack_days = unique_days_touched(&snapshot.attacks, &window, by_start, cal).len();
        let total_attacks = count_in_window(&snapshot.attacks, &window, by_start);
        let average_intensity = mean(attacks.iter().map(|a| f64::from(a.pain_intensity)));
        let average_duration_secs = mean(attacks.iter().map(|a| a.duration_secs(now)));
        let ongoing_attacks = attacks.iter().filter(|a| a.is_ongoing()).count();

        // Acute and preventive medication share one dating rule with MOH
        let by_parent = |d: &DatedIntake<'_>| Some(d.counted_at);
        let acute = acute_intakes(&snapshot.attacks);
        let acute_days = unique_days_touched(&acute, &window, by_parent, cal);
        let acute_count = count_in_window(&acute, &window, by_parent);

        let preventive = preventive_intakes(&snapshot.health_events);
        let preventive_days = unique_days_touched(&preventive, &window, by_parent, cal);
        let preventive_count = count_in_window(&preventive, &window, by_parent);

        let overlapping: Vec<NaiveDate> =
            acute_days.intersection(&preventive_days).copied().collect();
        if !overlapping.is_empty() {
            tracing::warn!(
                month = %month,
                days = overlapping.len(),
                "Acute and preventive intakes logged on the same day; totals count both"
            );
        }

        let therapy_count = count_in_window(&snapshot.health_events, &window, |e| {
            (e.event_type == HealthEventType::Therapy).then_some(e.event_date)
        });
        let procedure_count = count_in_window(&snapshot.health_events, &window, |e| {
            (e.event_type == HealthEventType::Procedure).then_some(e.event_date)
        });

        let medication_usage = self.acute_usage_rows(snapshot, &acute, month, &window);
        let moh_risk = combined_risk(medication_usage.iter().map(|u| u.risk_level));

        tracing::debug!(
            month = %month,
            attacks = total_attacks,
            attack_days,
            moh_risk = moh_risk.as_str(),
            "Computed monthly statistics"
        );

        DerivedStatistics {
            month,
            window,
            has_attack_data: total_attacks > 0,
            attack_days: to_u32(attack_days),
            total_attacks: to_u32(total_attacks),
            average_intensity,
            average_duration_secs,
            ongoing_attacks: to_u32(ongoing_attacks),
            is_chronic: to_u32(attack_days) >= self.config.chronic_threshold_days,
            frequency_level: AttackFrequencyLevel::from_attack_days(attack_days),
            acute_medication_days: to_u32(acute_days.len()),
            acute_medication_count: to_u32(acute_count),
            preventive_medication_days: to_u32(preventive_days.len()),
            preventive_medication_count: to_u32(preventive_count),
            total_medication_days: to_u32(acute_days.len() + preventive_days.len()),
            total_medication_count: to_u32(acute_count + preventive_count),
            overlapping_medication_days: overlapping,
            therapy_count: to_u32(therapy_count),
            procedure_count: to_u32(procedure_count),
            moh_risk,
            medication_usage,
        }
    }

    /// One usage row per medication referenced by an acute intake in the window.
    fn acute_usage_rows(
        &self,
        snapshot: &HistorySnapshot,
        intakes: &[DatedIntake<'_>],
        month: YearMonth,
        window: &DateWindow,
    ) -> Vec<MedicationUsage> {
        let referenced: BTreeSet<Uuid> = intakes
            .iter()
            .filter(|d| window.contains(d.counted_at))
            .filter_map(|d| d.intake.medication_ref)
            .collect();

        referenced
            .iter()
            .filter_map(|id| match snapshot.get_medication(id) {
                Some(medication) => Some(self.per_medication_usage(
                    medication,
                    intakes.iter().copied(),
                    month,
                )),
                None => {
                    tracing::debug!(medication_id = %id, "Intake references unknown medication");
                    None
                }
            })
            .collect()
    }

    /// Usage of a single medication in `month`, counted from `intakes`
    /// (typically `acute_intakes(..)`). Matches the row in `monthly_statistics`.
    pub fn per_medication_usage<'a, I>(
        &self,
        medication: &Medication,
        intakes: I,
        month: YearMonth,
    ) -> MedicationUsage
    where
        I: IntoIterator<Item = DatedIntake<'a>>,
    {
        let window = self.calendar.month_window(month);
        let own: Vec<DatedIntake<'a>> = intakes
            .into_iter()
            .filter(|d| d.intake.medication_ref == Some(medication.id))
            .collect();

        let by_parent = |d: &DatedIntake<'a>| Some(d.counted_at);
        let used_days =
            to_u32(unique_days_touched(&own, &window, by_parent, &self.calendar).len());
        let used_count = to_u32(count_in_window(&own, &window, by_parent));
        let limit_days = medication
            .is_moh_tracked()
            .then_some(medication.monthly_limit_days)
            .flatten();
        let risk_level = limit_days
            .map(|limit| {
                moh_risk_level_with_margin(used_days, limit, self.config.moh_warning_margin_days)
            })
            .unwrap_or_default();

        MedicationUsage {
            medication_id: medication.id,
            medication_name: medication.name.clone(),
            used_days,
            used_count,
            limit_days,
            risk_level,
            threshold_progress: limit_days
                .map(|limit| threshold_progress(used_days, limit))
                .unwrap_or(0.0),
        }
    }

    /// Completed attack-free days before `as_of`.
    ///
    /// An attack occupies every day from its start to its end (ongoing: through
    /// `as_of`). The as-of day is checked but not counted since it has not ended:
    /// an attack on it yields 0. With no attack on or before `as_of` there is no
    /// history to bound the streak and the result is 0.
    pub fn streak_days_without_attack(
        &self,
        attacks: &[AttackEvent],
        as_of: DateTime<Utc>,
    ) -> u32 {
        let cal = &self.calendar;
        let today = cal.day_key(as_of);

        let mut occupied: BTreeSet<NaiveDate> = BTreeSet::new();
        for attack in attacks.iter().filter(|a| a.start_time <= as_of) {
            let first = cal.day_key(attack.start_time);
            let end = attack.end_time.unwrap_or(as_of).min(as_of);
            let last = cal.day_key(end).max(first);
            let mut day = first;
            while day <= last {
                occupied.insert(day);
                day += Duration::days(1);
            }
        }

        if occupied.contains(&today) {
            return 0;
        }
        match occupied.range(..today).next_back() {
            Some(last_attack_day) => {
                let gap = (today - *last_attack_day).num_days() - 1;
                u32::try_from(gap.max(0)).unwrap_or(u32::MAX)
            }
            None => 0,
        }
    }
}

/// Arithmetic mean; 0.0 for an empty input.
pub(crate) fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

pub(crate) fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicationCategory;
    use chrono::TimeZone;

    fn ts(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, m, d, h, 0, 0).unwrap()
    }

    fn march() -> YearMonth {
        YearMonth::new(2026, 3).unwrap()
    }

    fn engine() -> StatisticsEngine {
        StatisticsEngine::default()
    }

    fn attack(start: DateTime<Utc>, hours: i64, intensity: u8) -> AttackEvent {
        let mut a = AttackEvent::new(start, intensity);
        a.end_time = Some(start + Duration::hours(hours));
        a
    }

    fn medicated_attack(start: DateTime<Utc>, intensity: u8, med: &Medication) -> AttackEvent {
        let mut a = attack(start, 2, intensity);
        a.medication_intakes
            .push(MedicationIntake::for_medication(
                med,
                400.0,
                "mg",
                start + Duration::minutes(30),
            ));
        a
    }

    fn preventive_event(at: DateTime<Utc>, med: &Medication) -> HealthEvent {
        let mut e = HealthEvent::new(HealthEventType::Medication, at);
        e.medication_intakes
            .push(MedicationIntake::for_medication(med, 5.0, "mg", at));
        e
    }

    fn ibuprofen() -> Medication {
        Medication::new("Ibuprofen", MedicationCategory::Nsaid, true)
    }

    fn sumatriptan() -> Medication {
        Medication::new("Sumatriptan", MedicationCategory::Triptan, true)
    }

    fn flunarizine() -> Medication {
        Medication::new("Flunarizine", MedicationCategory::Preventive, false)
    }

    /// NSAID intake on each of `days` (1-based day of March).
    fn nsaid_days(med: &Medication, days: impl IntoIterator<Item = u32>) -> Vec<AttackEvent> {
        days.into_iter().map(|d| medicated_attack(ts(3, d, 9), 5, med)).collect()
    }

    // ───────────────────────────────────────
    // monthly_statistics
    // ───────────────────────────────────────

    #[test]
    fn march_scenario() {
        let nsaid = ibuprofen();
        let snapshot = HistorySnapshot {
            attacks: vec![
                medicated_attack(ts(3, 2, 8), 4, &nsaid),
                attack(ts(3, 2, 19), 3, 8),
                medicated_attack(ts(3, 20, 10), 6, &nsaid),
            ],
            health_events: vec![],
            medications: vec![nsaid],
        };

        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.attack_days, 2);
        assert_eq!(stats.total_attacks, 3);
        assert_eq!(stats.average_intensity, 6.0);
        assert_eq!(stats.acute_medication_days, 2);
        assert_eq!(stats.acute_medication_count, 2);
        assert!(stats.has_attack_data);
        assert!(!stats.is_chronic);
        assert_eq!(stats.moh_risk, MohRiskLevel::Low);
    }

    #[test]
    fn empty_month_is_zero_not_error() {
        let stats = engine().monthly_statistics(&HistorySnapshot::default(), march(), ts(3, 15, 0));
        assert!(!stats.has_attack_data);
        assert_eq!(stats.total_attacks, 0);
        assert_eq!(stats.average_intensity, 0.0);
        assert_eq!(stats.average_duration_secs, 0.0);
        assert_eq!(stats.moh_risk, MohRiskLevel::None);
        assert!(stats.medication_usage.is_empty());
        assert!(!stats.has_preventive_medication());
    }

    #[test]
    fn attack_at_window_end_belongs_to_next_month() {
        let snapshot = HistorySnapshot {
            attacks: vec![attack(ts(4, 1, 0), 1, 7)],
            ..Default::default()
        };
        let eng = engine();
        let in_march = eng.monthly_statistics(&snapshot, march(), ts(4, 2, 0));
        let in_april = eng.monthly_statistics(&snapshot, march().next(), ts(4, 2, 0));
        assert_eq!(in_march.total_attacks, 0);
        assert_eq!(in_april.total_attacks, 1);
    }

    #[test]
    fn ongoing_attack_uses_now_for_duration() {
        let mut ongoing = AttackEvent::new(ts(3, 10, 8), 5);
        ongoing.end_time = None;
        let snapshot = HistorySnapshot {
            attacks: vec![attack(ts(3, 5, 8), 2, 5), ongoing],
            ..Default::default()
        };
        let eng = engine();
        let early = eng.monthly_statistics(&snapshot, march(), ts(3, 10, 12));
        // (2h + 4h) / 2
        assert_eq!(early.average_duration_secs, 3.0 * 3600.0);
        assert_eq!(early.ongoing_attacks, 1);

        let later = eng.monthly_statistics(&snapshot, march(), ts(3, 10, 16));
        assert_eq!(later.average_duration_secs, 5.0 * 3600.0);
    }

    #[test]
    fn chronic_at_fifteen_attack_days() {
        let attacks: Vec<AttackEvent> = (1..=15).map(|d| attack(ts(3, d, 9), 1, 5)).collect();
        let snapshot = HistorySnapshot { attacks, ..Default::default() };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert!(stats.is_chronic);
        assert_eq!(stats.frequency_level, AttackFrequencyLevel::Chronic);

        let fewer = HistorySnapshot {
            attacks: snapshot.attacks[..14].to_vec(),
            ..Default::default()
        };
        assert!(!engine().monthly_statistics(&fewer, march(), ts(4, 1, 0)).is_chronic);
    }

    #[test]
    fn chronic_threshold_is_configurable() {
        let config = AnalyticsConfig {
            chronic_threshold_days: 2,
            ..Default::default()
        };
        let eng = StatisticsEngine::new(config).unwrap();
        let snapshot = HistorySnapshot {
            attacks: vec![attack(ts(3, 1, 9), 1, 5), attack(ts(3, 2, 9), 1, 5)],
            ..Default::default()
        };
        assert!(eng.monthly_statistics(&snapshot, march(), ts(4, 1, 0)).is_chronic);
    }

    #[test]
    fn acute_and_preventive_never_mix() {
        let nsaid = ibuprofen();
        let preventive = flunarizine();
        let snapshot = HistorySnapshot {
            attacks: vec![medicated_attack(ts(3, 5, 9), 6, &nsaid)],
            health_events: vec![
                preventive_event(ts(3, 5, 21), &preventive),
                preventive_event(ts(3, 6, 21), &preventive),
            ],
            medications: vec![nsaid, preventive],
        };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.acute_medication_days, 1);
        assert_eq!(stats.acute_medication_count, 1);
        assert_eq!(stats.preventive_medication_days, 2);
        assert_eq!(stats.preventive_medication_count, 2);
        assert_eq!(stats.total_medication_days, 3);
        assert_eq!(stats.total_medication_count, 3);
        assert_eq!(
            stats.overlapping_medication_days,
            vec![NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()]
        );
        // Preventive intakes never feed MOH
        assert_eq!(stats.medication_usage.len(), 1);
        assert_eq!(stats.medication_usage[0].medication_name, "Ibuprofen");
    }

    #[test]
    fn empty_medication_event_not_counted() {
        let snapshot = HistorySnapshot {
            health_events: vec![HealthEvent::new(HealthEventType::Medication, ts(3, 3, 8))],
            ..Default::default()
        };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.preventive_medication_days, 0);
        assert_eq!(stats.preventive_medication_count, 0);
    }

    #[test]
    fn therapy_and_procedure_counts() {
        let snapshot = HistorySnapshot {
            health_events: vec![
                HealthEvent::new(HealthEventType::Therapy, ts(3, 3, 8)),
                HealthEvent::new(HealthEventType::Therapy, ts(3, 3, 18)),
                HealthEvent::new(HealthEventType::Procedure, ts(3, 9, 8)),
                HealthEvent::new(HealthEventType::Therapy, ts(2, 27, 8)),
            ],
            ..Default::default()
        };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.therapy_count, 2);
        assert_eq!(stats.procedure_count, 1);
        assert!(stats.has_therapy());
        assert!(stats.has_procedure());
    }

    #[test]
    fn combined_risk_takes_worst_medication() {
        let nsaid = ibuprofen();
        let triptan = sumatriptan();
        let mut attacks = nsaid_days(&nsaid, 1..=16);
        attacks.push(medicated_attack(ts(3, 20, 9), 7, &triptan));
        attacks.push(medicated_attack(ts(3, 21, 9), 7, &triptan));
        let snapshot = HistorySnapshot {
            attacks,
            health_events: vec![],
            medications: vec![nsaid.clone(), triptan.clone()],
        };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));

        let row = |id: Uuid| stats.medication_usage.iter().find(|u| u.medication_id == id).unwrap();
        assert_eq!(row(nsaid.id).risk_level, MohRiskLevel::High);
        assert_eq!(row(triptan.id).risk_level, MohRiskLevel::Low);
        assert_eq!(stats.moh_risk, MohRiskLevel::High);
    }

    #[test]
    fn untracked_medication_never_raises_risk() {
        let herbal = Medication::new("Herbal pill", MedicationCategory::TcmHerbal, true);
        assert!(herbal.monthly_limit_days.is_none());
        let snapshot = HistorySnapshot {
            attacks: nsaid_days(&herbal, 1..=28),
            health_events: vec![],
            medications: vec![herbal],
        };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.medication_usage[0].used_days, 28);
        assert_eq!(stats.medication_usage[0].risk_level, MohRiskLevel::None);
        assert_eq!(stats.moh_risk, MohRiskLevel::None);
    }

    #[test]
    fn free_text_intakes_count_as_acute_but_not_for_moh() {
        let mut a = attack(ts(3, 4, 9), 2, 5);
        a.medication_intakes.push(MedicationIntake {
            medication_ref: None,
            medication_name: Some("Something from a friend".into()),
            category: MedicationCategory::Other,
            dosage: 1.0,
            unit: "pill".into(),
            time_taken: ts(3, 4, 10),
        });
        let snapshot = HistorySnapshot { attacks: vec![a], ..Default::default() };
        let stats = engine().monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        assert_eq!(stats.acute_medication_count, 1);
        assert!(stats.medication_usage.is_empty());
        assert_eq!(stats.moh_risk, MohRiskLevel::None);
    }

    #[test]
    fn intake_after_midnight_counts_on_attack_start_day() {
        let nsaid = ibuprofen();
        let start = Utc.with_ymd_and_hms(2026, 3, 31, 23, 30, 0).unwrap();
        let mut a = attack(start, 3, 6);
        a.medication_intakes.push(MedicationIntake::for_medication(
            &nsaid,
            400.0,
            "mg",
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 15, 0).unwrap(),
        ));
        let snapshot = HistorySnapshot {
            attacks: vec![a],
            health_events: vec![],
            medications: vec![nsaid.clone()],
        };
        let eng = engine();

        let in_march = eng.monthly_statistics(&snapshot, march(), ts(4, 2, 0));
        assert_eq!(in_march.acute_medication_days, 1);
        assert_eq!(in_march.acute_medication_count, 1);
        assert_eq!(in_march.medication_usage.len(), 1);
        assert_eq!(in_march.medication_usage[0].used_days, 1);
        assert_eq!(in_march.moh_risk, MohRiskLevel::Low);
        let direct = eng.per_medication_usage(&nsaid, acute_intakes(&snapshot.attacks), march());
        assert_eq!(&direct, &in_march.medication_usage[0]);

        let in_april = eng.monthly_statistics(&snapshot, march().next(), ts(4, 2, 0));
        assert_eq!(in_april.acute_medication_days, 0);
        assert_eq!(in_april.acute_medication_count, 0);
        assert!(in_april.medication_usage.is_empty());
        assert_eq!(in_april.moh_risk, MohRiskLevel::None);
    }

    #[test]
    fn zero_limit_medication_is_untracked() {
        let mut nsaid = ibuprofen();
        nsaid.monthly_limit_days = Some(0);
        let attacks = nsaid_days(&nsaid, 1..=20);
        let usage = engine().per_medication_usage(&nsaid, acute_intakes(&attacks), march());
        assert_eq!(usage.used_days, 20);
        assert_eq!(usage.limit_days, None);
        assert_eq!(usage.risk_level, MohRiskLevel::None);
        assert_eq!(usage.threshold_progress, 0.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let nsaid = ibuprofen();
        let mut ongoing = AttackEvent::new(ts(3, 30, 22), 9);
        ongoing.end_time = None;
        let mut attacks = nsaid_days(&nsaid, [2, 2, 9, 14]);
        attacks.push(ongoing);
        let snapshot = HistorySnapshot {
            attacks,
            health_events: vec![preventive_event(ts(3, 9, 8), &flunarizine())],
            medications: vec![nsaid],
        };
        let eng = engine();
        let now = ts(3, 31, 1);
        let first = eng.monthly_statistics(&snapshot, march(), now);
        let second = eng.monthly_statistics(&snapshot, march(), now);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    // ───────────────────────────────────────
    // per_medication_usage
    // ───────────────────────────────────────

    #[test]
    fn nsaid_usage_scenarios() {
        let eng = engine();
        let nsaid = ibuprofen();
        for (days, expected) in [
            (16u32, MohRiskLevel::High),
            (12, MohRiskLevel::Medium),
            (5, MohRiskLevel::Low),
            (0, MohRiskLevel::None),
        ] {
            let attacks = nsaid_days(&nsaid, 1..=days);
            let usage = eng.per_medication_usage(&nsaid, acute_intakes(&attacks), march());
            assert_eq!(usage.used_days, days);
            assert_eq!(usage.risk_level, expected, "{days} days");
        }
    }

    #[test]
    fn usage_counts_intakes_but_dedups_days() {
        let eng = engine();
        let nsaid = ibuprofen();
        let mut a = medicated_attack(ts(3, 8, 7), 6, &nsaid);
        a.medication_intakes
            .push(MedicationIntake::for_medication(&nsaid, 400.0, "mg", ts(3, 8, 15)));
        let attacks = vec![a, medicated_attack(ts(3, 9, 7), 6, &nsaid)];
        let usage = eng.per_medication_usage(&nsaid, acute_intakes(&attacks), march());
        assert_eq!(usage.used_days, 2);
        assert_eq!(usage.used_count, 3);
        assert_eq!(usage.limit_days, Some(15));
        assert!((usage.threshold_progress - 2.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn per_medication_matches_monthly_row() {
        let eng = engine();
        let nsaid = ibuprofen();
        let triptan = sumatriptan();
        let mut attacks = nsaid_days(&nsaid, [1, 3, 3, 7, 12, 12, 13, 31]);
        attacks.extend(nsaid_days(&triptan, [4, 5, 6, 7, 8, 9, 10]));
        let snapshot = HistorySnapshot {
            attacks,
            health_events: vec![],
            medications: vec![nsaid.clone(), triptan.clone()],
        };
        let stats = eng.monthly_statistics(&snapshot, march(), ts(4, 1, 0));
        for med in [&nsaid, &triptan] {
            let direct = eng.per_medication_usage(med, acute_intakes(&snapshot.attacks), march());
            let row = stats
                .medication_usage
                .iter()
                .find(|u| u.medication_id == med.id)
                .unwrap();
            assert_eq!(&direct, row);
        }
    }

    #[test]
    fn usage_outside_month_ignored() {
        let eng = engine();
        let nsaid = ibuprofen();
        let attacks = vec![
            medicated_attack(ts(2, 28, 9), 5, &nsaid),
            medicated_attack(ts(3, 1, 9), 5, &nsaid),
        ];
        let usage = eng.per_medication_usage(&nsaid, acute_intakes(&attacks), march());
        assert_eq!(usage.used_days, 1);
    }

    // ───────────────────────────────────────
    // streak_days_without_attack
    // ───────────────────────────────────────

    #[test]
    fn streak_stops_at_attack_day() {
        let as_of = ts(3, 20, 12);
        let attacks = vec![attack(ts(3, 15, 9), 2, 5), attack(ts(3, 10, 9), 2, 5)];
        assert_eq!(engine().streak_days_without_attack(&attacks, as_of), 4);
    }

    #[test]
    fn streak_zero_when_attack_today() {
        let attacks = vec![attack(ts(3, 20, 1), 1, 5)];
        assert_eq!(engine().streak_days_without_attack(&attacks, ts(3, 20, 12)), 0);
    }

    #[test]
    fn streak_zero_without_history() {
        assert_eq!(engine().streak_days_without_attack(&[], ts(3, 20, 12)), 0);
        // Attacks after as-of are not history yet
        let future = vec![attack(ts(3, 25, 9), 1, 5)];
        assert_eq!(engine().streak_days_without_attack(&future, ts(3, 20, 12)), 0);
    }

    #[test]
    fn multi_day_attack_occupies_every_day() {
        // Starts on the 14th, ends on the 16th
        let attacks = vec![attack(ts(3, 14, 20), 40, 7)];
        assert_eq!(engine().streak_days_without_attack(&attacks, ts(3, 20, 12)), 3);
    }

    #[test]
    fn ongoing_attack_breaks_streak() {
        let mut ongoing = AttackEvent::new(ts(3, 18, 22), 7);
        ongoing.end_time = None;
        assert_eq!(engine().streak_days_without_attack(&[ongoing], ts(3, 20, 12)), 0);
    }

    #[test]
    fn streak_unaffected_by_input_order() {
        let as_of = ts(3, 20, 12);
        let mut attacks = vec![attack(ts(3, 10, 9), 1, 5), attack(ts(3, 15, 9), 1, 5)];
        let forward = engine().streak_days_without_attack(&attacks, as_of);
        attacks.reverse();
        assert_eq!(engine().streak_days_without_attack(&attacks, as_of), forward);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
        assert_eq!(mean([2.0, 4.0]), 3.0);
    }
}
