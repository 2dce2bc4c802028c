pub mod analytics; // Statistics, breakdowns, correlation, calendar grid
pub mod calendar; // Reference calendar, month windows
pub mod config;
pub mod error;
pub mod models;

use tracing_subscriber::EnvFilter;

pub use analytics::{
    CalendarCursor, CalendarProjector, DayDescriptor, DerivedStatistics, HistorySnapshot,
    MedicationUsage, MohRiskLevel, PeriodReport, StatisticsEngine, TreatmentCorrelation,
};
pub use calendar::{DateWindow, ReferenceCalendar, YearMonth};
pub use config::AnalyticsConfig;
pub use error::AnalyticsError;

/// Installs the fmt subscriber, filtered by `RUST_LOG` or the crate default.
/// Later calls leave the first subscriber in place.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}
