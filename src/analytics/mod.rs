//! Clinical analytics over a journal snapshot.
//!
//! `aggregator` has no clinical meaning; `classification` holds the rules;
//! everything else goes through `StatisticsEngine` so every screen reads
//! the same numbers.

pub mod aggregator;
pub mod breakdown;
pub mod calendar_grid;
pub mod classification;
pub mod correlation;
pub mod statistics;

pub use breakdown::{
    aura_statistics, duration_statistics, hourly_distribution, intensity_distribution,
    medication_adherence, medication_breakdown, pain_location_frequency, pain_quality_frequency,
    symptom_frequency, therapy_statistics, trigger_frequency, weekday_distribution,
    AuraStatistics, DurationStatistics, IntensityDistribution, LabelFrequency,
    MedicationAdherence, MedicationBreakdown, PeriodReport, TherapyStatistics, WeekdayCount,
};
pub use calendar_grid::{CalendarCursor, CalendarProjector, DayDescriptor, GRID_CELLS};
pub use classification::{
    combined_risk, default_monthly_limit, moh_risk_level, weather_risk_flags, AttackFrequencyLevel,
    IntensityBand, MohRiskLevel, WeatherRiskFlag,
};
pub use correlation::{TreatmentCorrelation, TREATMENT_WINDOW_DAYS};
pub use statistics::{
    acute_intakes, preventive_intakes, DatedIntake, DerivedStatistics, HistorySnapshot,
    MedicationUsage, StatisticsEngine,
};
