//! Wall-clock arithmetic in the single operating timezone.
//!
//! Slots are stored as a local date plus a reference time bucket. Every
//! comparison against "now" goes through these helpers so there is exactly
//! one place that decides how local times map to instants.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolves a local wall-clock time to an instant.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Times inside a spring-forward gap are shifted forward by one hour.
pub fn local_to_utc(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

pub fn local_date(tz: &Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Whole minutes from `now` until `target`; negative once `target` has passed.
pub fn minutes_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    (target - now).num_minutes()
}

pub fn hours_until(now: DateTime<Utc>, target: DateTime<Utc>) -> f64 {
    (target - now).num_seconds() as f64 / 3600.0
}
