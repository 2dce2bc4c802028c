use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar::{DateWindow, ReferenceCalendar};

/// Calendar days (in `calendar`) touched by items whose selected date lies in `window`.
/// Items without a date are skipped.
pub fn unique_days_touched<T, F>(
    events: &[T],
    window: &DateWindow,
    date_selector: F,
    calendar: &ReferenceCalendar,
) -> BTreeSet<NaiveDate>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    events
        .iter()
        .filter_map(&date_selector)
        .filter(|ts| window.contains(*ts))
        .map(|ts| calendar.day_key(ts))
        .collect()
}

/// Number of items whose selected date lies in `window`. No deduplication.
pub fn count_in_window<T, F>(events: &[T], window: &DateWindow, date_selector: F) -> usize
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    events
        .iter()
        .filter_map(&date_selector)
        .filter(|ts| window.contains(*ts))
        .count()
}

/// Buckets items by calendar day; each bucket is ordered by timestamp ascending.
pub fn group_by_calendar_day<'a, T, F>(
    events: &'a [T],
    date_selector: F,
    calendar: &ReferenceCalendar,
) -> BTreeMap<NaiveDate, Vec<&'a T>>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    let mut dated: Vec<(DateTime<Utc>, &T)> = events
        .iter()
        .filter_map(|e| date_selector(e).map(|ts| (ts, e)))
        .collect();
    // Stable sort keeps logged order for identical timestamps
    dated.sort_by_key(|(ts, _)| *ts);

    let mut grouped: BTreeMap<NaiveDate, Vec<&T>> = BTreeMap::new();
    for (ts, event) in dated {
        grouped.entry(calendar.day_key(ts)).or_default().push(event);
    }
    grouped
}

/// Items whose selected date lies in `window`, in input order.
pub fn filter_in_window<'a, T, F>(
    events: &'a [T],
    window: &DateWindow,
    date_selector: F,
) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    events
        .iter()
        .filter(|e| date_selector(e).is_some_and(|ts| window.contains(ts)))
        .collect()
}
