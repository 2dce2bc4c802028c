//! Reference calendar shared by every computation in the crate.
//!
//! All day keys, month windows, weekdays and hours are derived through one
//! `ReferenceCalendar` (a fixed UTC offset plus a week start). Two timestamps
//! collapse to the same day key exactly when they fall on the same local day
//! in that offset.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

// ═══════════════════════════════════════════
// DateWindow
// ═══════════════════════════════════════════

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// ═══════════════════════════════════════════
// YearMonth
// ═══════════════════════════════════════════

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    first_day: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, AnalyticsError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or(AnalyticsError::InvalidMonth { year, month })
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days(i64::from(self.day_count()) - 1)
    }

    pub fn day_count(&self) -> u32 {
        match self.month() {
            2 if NaiveDate::from_ymd_opt(self.year(), 2, 29).is_some() => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn next(&self) -> Self {
        Self {
            first_day: self.first_day + Duration::days(i64::from(self.day_count())),
        }
    }

    pub fn previous(&self) -> Self {
        Self::from_date(self.first_day - Duration::days(1))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day.year() == self.year() && day.month() == self.month()
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

// ═══════════════════════════════════════════
// ReferenceCalendar
// ═══════════════════════════════════════════

/// Fixed-offset calendar used for every day/month computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceCalendar {
    offset: FixedOffset,
    week_start: Weekday,
}

impl Default for ReferenceCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReferenceCalendar {
    /// UTC calendar with Sunday-first weeks.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            week_start: Weekday::Sun,
        }
    }

    pub fn new(utc_offset_seconds: i32, week_start: Weekday) -> Result<Self, AnalyticsError> {
        let offset = FixedOffset::east_opt(utc_offset_seconds)
            .ok_or(AnalyticsError::InvalidUtcOffset(utc_offset_seconds))?;
        Ok(Self { offset, week_start })
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn utc_offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Calendar day key: the local date of `ts`.
    pub fn day_key(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// First instant of `day` in this calendar, as UTC.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_naive =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc_naive)
    }

    pub fn month_of(&self, ts: DateTime<Utc>) -> YearMonth {
        YearMonth::from_date(self.day_key(ts))
    }

    /// `[first instant of month, first instant of next month)`.
    pub fn month_window(&self, month: YearMonth) -> DateWindow {
        DateWindow::new(
            self.start_of_day(month.first_day()),
            self.start_of_day(month.next().first_day()),
        )
    }

    pub fn weekday_of(&self, ts: DateTime<Utc>) -> Weekday {
        self.day_key(ts).weekday()
    }

    pub fn hour_of(&self, ts: DateTime<Utc>) -> u32 {
        ts.with_timezone(&self.offset).hour()
    }

    /// Column of `day` in a week that begins on `week_start` (0-6).
    pub fn weekday_column(&self, day: NaiveDate) -> u32 {
        (day.weekday().num_days_from_monday() + 7 - self.week_start.num_days_from_monday()) % 7
    }
}
