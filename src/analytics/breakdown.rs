//! Secondary breakdowns shown on the analytics screen, and the period report
//! that bundles them for an arbitrary window.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::aggregator::{count_in_window, filter_in_window, unique_days_touched};
use super::classification::{is_high_risk_weather, IntensityBand};
use super::statistics::{mean, to_u32, HistorySnapshot, StatisticsEngine};
use crate::calendar::{DateWindow, ReferenceCalendar};
use crate::models::{
    AttackEvent, HealthEvent, HealthEventType, Medication, MedicationCategory, MedicationIntake,
};

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Duration figures over completed attacks. Ongoing attacks are only counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStatistics {
    pub completed_count: u32,
    pub ongoing_count: u32,
    pub average_secs: f64,
    pub longest_secs: Option<f64>,
    pub shortest_secs: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityDistribution {
    pub mild: u32,
    pub moderate: u32,
    pub severe: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub weekday: Weekday,
    pub attacks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: MedicationCategory,
    pub count: u32,
    /// 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationCount {
    pub name: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationBreakdown {
    pub total_uses: u32,
    /// Sorted by count descending, then category order.
    pub categories: Vec<CategoryShare>,
    /// Sorted by count descending, then name.
    pub top_medications: Vec<MedicationCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyKindCount {
    pub kind: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapyStatistics {
    pub therapy_count: u32,
    pub kinds: Vec<TherapyKindCount>,
    /// Mean session length; sessions without a recorded duration count as zero.
    pub average_duration_secs: f64,
}

impl TherapyStatistics {
    /// Rounded to the nearest minute.
    pub fn average_duration_minutes(&self) -> u32 {
        (self.average_duration_secs / 60.0).round() as u32
    }
}

/// How often a free-text label (trigger, symptom, pain location...) was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFrequency {
    pub label: String,
    pub count: u32,
    /// 0-100. The base differs per breakdown, see the producing function.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraStatistics {
    pub total_attacks: u32,
    pub attacks_with_aura: u32,
    /// Percentages are shares of `attacks_with_aura`.
    pub aura_types: Vec<LabelFrequency>,
}

impl AuraStatistics {
    pub fn aura_percentage(&self) -> f64 {
        percentage(self.attacks_with_aura, self.total_attacks)
    }
}

/// Days with a logged medication event against the days in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationAdherence {
    pub total_days: u32,
    pub medication_days: u32,
    pub missed_days: u32,
}

impl MedicationAdherence {
    pub fn adherence_percentage(&self) -> f64 {
        percentage(self.medication_days, self.total_days)
    }
}

/// Everything the analytics screen shows for one window, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub window: DateWindow,
    pub has_attack_data: bool,
    pub total_attacks: u32,
    pub attack_days: u32,
    pub average_intensity: f64,
    pub durations: DurationStatistics,
    pub intensity: IntensityDistribution,
    pub hourly: [u32; 24],
    pub weekdays: Vec<WeekdayCount>,
    pub triggers: Vec<LabelFrequency>,
    pub pain_locations: Vec<LabelFrequency>,
    pub pain_qualities: Vec<LabelFrequency>,
    pub symptoms: Vec<LabelFrequency>,
    pub aura: AuraStatistics,
    /// Attacks whose recorded weather had at least one risk flag.
    pub high_risk_weather_attacks: u32,
    pub acute_medication_days: u32,
    pub acute_medication: MedicationBreakdown,
    pub preventive_medication_days: u32,
    pub preventive_medication: MedicationBreakdown,
    pub medication_adherence: MedicationAdherence,
    pub therapy: TherapyStatistics,
    pub procedure_count: u32,
}

// ═══════════════════════════════════════════
// Breakdowns
// ═══════════════════════════════════════════

pub fn duration_statistics<'a, I>(attacks: I) -> DurationStatistics
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let mut ongoing_count = 0usize;
    let mut durations = Vec::new();
    for attack in attacks {
        match attack.completed_duration_secs() {
            Some(secs) => durations.push(secs),
            None => ongoing_count += 1,
        }
    }

    DurationStatistics {
        completed_count: to_u32(durations.len()),
        ongoing_count: to_u32(ongoing_count),
        average_secs: mean(durations.iter().copied()),
        longest_secs: durations.iter().copied().reduce(f64::max),
        shortest_secs: durations.iter().copied().reduce(f64::min),
    }
}

pub fn intensity_distribution<'a, I>(attacks: I) -> IntensityDistribution
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let mut dist = IntensityDistribution::default();
    for attack in attacks {
        match IntensityBand::from_intensity(attack.pain_intensity) {
            IntensityBand::Mild => dist.mild += 1,
            IntensityBand::Moderate => dist.moderate += 1,
            IntensityBand::Severe => dist.severe += 1,
        }
    }
    dist
}

/// Attack starts per local hour, index 0 = 00:00-00:59.
pub fn hourly_distribution<'a, I>(attacks: I, calendar: &ReferenceCalendar) -> [u32; 24]
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let mut hours = [0u32; 24];
    for attack in attacks {
        let hour = calendar.hour_of(attack.start_time) as usize;
        hours[hour % 24] += 1;
    }
    hours
}

/// Attack starts per weekday, seven entries beginning at the calendar's week start.
pub fn weekday_distribution<'a, I>(attacks: I, calendar: &ReferenceCalendar) -> Vec<WeekdayCount>
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let mut counts = [0u32; 7];
    for attack in attacks {
        let column = calendar.weekday_column(calendar.day_key(attack.start_time)) as usize;
        counts[column % 7] += 1;
    }

    let mut weekday = calendar.week_start();
    let mut out = Vec::with_capacity(7);
    for n in counts {
        out.push(WeekdayCount { weekday, attacks: n });
        weekday = weekday.succ();
    }
    out
}

/// Category shares and most used medications among `intakes`.
/// Free-text intakes count under their own label; unnamed ones only count toward categories.
pub fn medication_breakdown<'a, I>(intakes: I, medications: &[Medication]) -> MedicationBreakdown
where
    I: IntoIterator<Item = &'a MedicationIntake>,
{
    let mut total = 0u32;
    let mut by_category: BTreeMap<MedicationCategory, u32> = BTreeMap::new();
    let mut by_name: BTreeMap<String, u32> = BTreeMap::new();

    for intake in intakes {
        total += 1;
        *by_category.entry(intake.category).or_default() += 1;
        if let Some(name) = intake.display_name(medications) {
            *by_name.entry(name.to_string()).or_default() += 1;
        }
    }

    let mut categories: Vec<CategoryShare> = by_category
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    let mut top_medications: Vec<MedicationCount> = by_name
        .into_iter()
        .map(|(name, count)| MedicationCount {
            name,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    top_medications.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    MedicationBreakdown {
        total_uses: total,
        categories,
        top_medications,
    }
}

pub fn therapy_statistics<'a, I>(health_events: I) -> TherapyStatistics
where
    I: IntoIterator<Item = &'a HealthEvent>,
{
    let mut count = 0u32;
    let mut total_secs = 0u64;
    let mut by_kind: BTreeMap<&str, u32> = BTreeMap::new();

    for event in health_events
        .into_iter()
        .filter(|e| e.event_type == HealthEventType::Therapy)
    {
        count += 1;
        total_secs += u64::from(event.therapy_duration_seconds.unwrap_or(0));
        if let Some(kind) = event.therapy_kind.as_deref() {
            *by_kind.entry(kind).or_default() += 1;
        }
    }

    let mut kinds: Vec<TherapyKindCount> = by_kind
        .into_iter()
        .map(|(kind, n)| TherapyKindCount {
            kind: kind.to_string(),
            count: n,
            percentage: percentage(n, count),
        })
        .collect();
    kinds.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));

    TherapyStatistics {
        therapy_count: count,
        kinds,
        average_duration_secs: if count == 0 {
            0.0
        } else {
            total_secs as f64 / f64::from(count)
        },
    }
}

// ═══════════════════════════════════════════
// Label frequencies
// ═══════════════════════════════════════════

/// Counts each label at most once per attack. Blank labels are skipped.
fn tally<'a, I, F>(attacks: I, labels: F) -> (BTreeMap<&'a str, u32>, u32)
where
    I: IntoIterator<Item = &'a AttackEvent>,
    F: Fn(&'a AttackEvent) -> &'a [String],
{
    let mut counts: BTreeMap<&'a str, u32> = BTreeMap::new();
    let mut attacks_seen = 0u32;
    for attack in attacks {
        attacks_seen += 1;
        let distinct: BTreeSet<&str> = labels(attack)
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        for label in distinct {
            *counts.entry(label).or_default() += 1;
        }
    }
    (counts, attacks_seen)
}

/// Sorted by count descending, then label.
fn rank_labels(counts: BTreeMap<&str, u32>, base: u32) -> Vec<LabelFrequency> {
    let mut ranked: Vec<LabelFrequency> = counts
        .into_iter()
        .map(|(label, count)| LabelFrequency {
            label: label.to_string(),
            count,
            percentage: percentage(count, base),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked
}

fn share_of_labels<'a, I, F>(attacks: I, labels: F) -> Vec<LabelFrequency>
where
    I: IntoIterator<Item = &'a AttackEvent>,
    F: Fn(&'a AttackEvent) -> &'a [String],
{
    let (counts, _) = tally(attacks, labels);
    let total = counts.values().sum();
    rank_labels(counts, total)
}

/// Triggers; percentages are shares of all trigger mentions.
pub fn trigger_frequency<'a, I>(attacks: I) -> Vec<LabelFrequency>
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    share_of_labels(attacks, |a| a.triggers.as_slice())
}

/// Pain locations; percentages are shares of all location mentions.
pub fn pain_location_frequency<'a, I>(attacks: I) -> Vec<LabelFrequency>
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    share_of_labels(attacks, |a| a.pain_locations.as_slice())
}

pub fn pain_quality_frequency<'a, I>(attacks: I) -> Vec<LabelFrequency>
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    share_of_labels(attacks, |a| a.pain_qualities.as_slice())
}

/// Symptoms; percentages are shares of attacks, so they need not sum to 100.
pub fn symptom_frequency<'a, I>(attacks: I) -> Vec<LabelFrequency>
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let (counts, attacks_seen) = tally(attacks, |a| a.symptoms.as_slice());
    rank_labels(counts, attacks_seen)
}

pub fn aura_statistics<'a, I>(attacks: I) -> AuraStatistics
where
    I: IntoIterator<Item = &'a AttackEvent>,
{
    let attacks: Vec<&AttackEvent> = attacks.into_iter().collect();
    let (counts, attacks_with_aura) = tally(
        attacks.iter().copied().filter(|a| a.has_aura),
        |a| a.aura_types.as_slice(),
    );
    AuraStatistics {
        total_attacks: to_u32(attacks.len()),
        attacks_with_aura,
        aura_types: rank_labels(counts, attacks_with_aura),
    }
}

/// Calendar days in `window` covered by a medication event with at least one intake.
pub fn medication_adherence(
    health_events: &[HealthEvent],
    window: &DateWindow,
    calendar: &ReferenceCalendar,
) -> MedicationAdherence {
    let total_days = u32::try_from((window.end - window.start).num_days().max(0))
        .unwrap_or(u32::MAX);
    let dosed = |e: &HealthEvent| e.is_logged_medication().then_some(e.event_date);
    let medication_days = to_u32(unique_days_touched(health_events, window, dosed, calendar).len());
    MedicationAdherence {
        total_days,
        medication_days,
        missed_days: total_days.saturating_sub(medication_days),
    }
}

fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) * 100.0 / f64::from(total)
    }
}

// ═══════════════════════════════════════════
// Period report
// ═══════════════════════════════════════════

impl StatisticsEngine {
    /// All breakdowns for attacks starting and health events dated in `window`.
    pub fn period_report(
        &self,
        snapshot: &HistorySnapshot,
        window: DateWindow,
    ) -> PeriodReport {
        let cal = self.calendar();
        if window.is_empty() {
            tracing::warn!(
                from = %window.start,
                to = %window.end,
                "Period report requested for an empty window"
            );
        }
        let attacks = filter_in_window(&snapshot.attacks, &window, |a| Some(a.start_time));
        let events = filter_in_window(&snapshot.health_events, &window, |e| Some(e.event_date));

        let medicated: Vec<&AttackEvent> =
            attacks.iter().copied().filter(|a| a.has_medication()).collect();
        let dosed: Vec<&HealthEvent> =
            events.iter().copied().filter(|e| e.is_logged_medication()).collect();

        let acute = medicated.iter().flat_map(|a| a.medication_intakes.iter());
        let preventive = dosed.iter().flat_map(|e| e.medication_intakes.iter());

        let total_attacks = attacks.len();
        let ongoing = attacks.iter().filter(|a| a.is_ongoing()).count();
        tracing::debug!(
            from = %window.start,
            to = %window.end,
            attacks = total_attacks,
            ongoing,
            "Computed period report"
        );

        PeriodReport {
            window,
            has_attack_data: total_attacks > 0,
            total_attacks: to_u32(total_attacks),
            attack_days: to_u32(
                unique_days_touched(&attacks, &window, |a| Some(a.start_time), cal).len(),
            ),
            average_intensity: mean(attacks.iter().map(|a| f64::from(a.pain_intensity))),
            durations: duration_statistics(attacks.iter().copied()),
            intensity: intensity_distribution(attacks.iter().copied()),
            hourly: hourly_distribution(attacks.iter().copied(), cal),
            weekdays: weekday_distribution(attacks.iter().copied(), cal),
            triggers: trigger_frequency(attacks.iter().copied()),
            pain_locations: pain_location_frequency(attacks.iter().copied()),
            pain_qualities: pain_quality_frequency(attacks.iter().copied()),
            symptoms: symptom_frequency(attacks.iter().copied()),
            aura: aura_statistics(attacks.iter().copied()),
            high_risk_weather_attacks: to_u32(
                attacks
                    .iter()
                    .filter(|a| a.weather.as_ref().is_some_and(is_high_risk_weather))
                    .count(),
            ),
            acute_medication_days: to_u32(
                unique_days_touched(&medicated, &window, |a| Some(a.start_time), cal).len(),
            ),
            acute_medication: medication_breakdown(acute, &snapshot.medications),
            preventive_medication_days: to_u32(
                unique_days_touched(&dosed, &window, |e| Some(e.event_date), cal).len(),
            ),
            preventive_medication: medication_breakdown(preventive, &snapshot.medications),
            medication_adherence: medication_adherence(&snapshot.health_events, &window, cal),
            therapy: therapy_statistics(events.iter().copied()),
            procedure_count: to_u32(count_in_window(&events, &window, |e| {
                (e.event_type == HealthEventType::Procedure).then_some(e.event_date)
            })),
        }
    }
}
