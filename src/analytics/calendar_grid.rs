//! Month grid projection for the journal's calendar heat map.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::aggregator::group_by_calendar_day;
use super::classification::IntensityBand;
use super::statistics::{to_u32, StatisticsEngine};
use crate::calendar::{ReferenceCalendar, YearMonth};
use crate::models::{AttackEvent, HealthEvent, HealthEventType};

/// Six weeks of seven days.
pub const GRID_CELLS: usize = 42;

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDescriptor {
    pub date: NaiveDate,
    /// False for leading days of the previous month and trailing days of the next.
    pub in_month: bool,
    pub is_today: bool,
    pub attack_count: u32,
    /// Highest intensity among attacks starting that day.
    pub max_pain_intensity: Option<u8>,
    pub intensity_band: Option<IntensityBand>,
    pub health_event_types: BTreeSet<HealthEventType>,
}

impl DayDescriptor {
    pub fn has_attack(&self) -> bool {
        self.attack_count > 0
    }
}

/// Projects attacks and health events onto calendar days.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarProjector {
    calendar: ReferenceCalendar,
}

impl CalendarProjector {
    pub fn new(calendar: ReferenceCalendar) -> Self {
        Self { calendar }
    }

    /// First day shown in the grid of `month`.
    pub fn grid_start(&self, month: YearMonth) -> NaiveDate {
        let lead = self.calendar.weekday_column(month.first_day());
        month.first_day() - Duration::days(i64::from(lead))
    }

    /// Always `GRID_CELLS` descriptors, the first column on the calendar's week start.
    pub fn days_in_month(
        &self,
        month: YearMonth,
        attacks: &[AttackEvent],
        health_events: &[HealthEvent],
        today: NaiveDate,
    ) -> Vec<DayDescriptor> {
        let attacks_by_day = group_by_calendar_day(attacks, |a| Some(a.start_time), &self.calendar);
        let events_by_day =
            group_by_calendar_day(health_events, |e| Some(e.event_date), &self.calendar);

        let start = self.grid_start(month);
        (0..GRID_CELLS as i64)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let day_attacks = attacks_by_day.get(&date).map(Vec::as_slice).unwrap_or(&[]);
                let max_pain_intensity = day_attacks.iter().map(|a| a.pain_intensity).max();

                DayDescriptor {
                    date,
                    in_month: month.contains(date),
                    is_today: date == today,
                    attack_count: to_u32(day_attacks.len()),
                    max_pain_intensity,
                    intensity_band: max_pain_intensity.map(IntensityBand::from_intensity),
                    health_event_types: events_by_day
                        .get(&date)
                        .map(|events| events.iter().map(|e| e.event_type).collect())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    pub fn max_pain_intensity(&self, day: NaiveDate, attacks: &[AttackEvent]) -> Option<u8> {
        attacks
            .iter()
            .filter(|a| self.calendar.day_key(a.start_time) == day)
            .map(|a| a.pain_intensity)
            .max()
    }

    pub fn health_event_types_on(
        &self,
        day: NaiveDate,
        health_events: &[HealthEvent],
    ) -> BTreeSet<HealthEventType> {
        health_events
            .iter()
            .filter(|e| self.calendar.day_key(e.event_date) == day)
            .map(|e| e.event_type)
            .collect()
    }
}

impl StatisticsEngine {
    pub fn calendar_projector(&self) -> CalendarProjector {
        CalendarProjector::new(*self.calendar())
    }
}

/// Month currently displayed by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCursor {
    month: YearMonth,
}

impl CalendarCursor {
    pub fn new(month: YearMonth) -> Self {
        Self { month }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn previous_month(&mut self) {
        self.month = self.month.previous();
    }

    pub fn move_to_today(&mut self, today: NaiveDate) {
        self.month = YearMonth::from_date(today);
    }
}
