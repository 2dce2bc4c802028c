use thiserror::Error;

/// Errors raised while parsing records or building engine configuration.
/// Engine computations themselves never fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("UTC offset out of range: {0} seconds")]
    InvalidUtcOffset(i32),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
