//! Calendar arithmetic on zoned timestamps.
//!
//! Review intervals and recurrence steps are expressed in calendar units, so
//! they are applied to the local date and the wall-clock time of day is kept.
//! Adding "one day" across a DST change therefore lands at the same local
//! time the next day, not 24 elapsed hours later.

use chrono::{DateTime, Days, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Add `days` calendar days to `at`, keeping the local time of day.
///
/// Returns `None` when the result is outside chrono's supported range.
pub fn add_days<Tz: TimeZone>(at: &DateTime<Tz>, days: u64) -> Option<DateTime<Tz>> {
    let naive = at.naive_local();
    let date = naive.date().checked_add_days(Days::new(days))?;
    Some(resolve_local(&at.timezone(), date.and_time(naive.time())))
}

/// Add `months` calendar months to `at`, keeping the local time of day.
///
/// A day of month that does not exist in the target month is clamped to the
/// last day of that month (Jan 31 + 1 month is Feb 28 or Feb 29).
pub fn add_months<Tz: TimeZone>(at: &DateTime<Tz>, months: u32) -> Option<DateTime<Tz>> {
    let naive = at.naive_local();
    let date = naive.date().checked_add_months(Months::new(months))?;
    Some(resolve_local(&at.timezone(), date.and_time(naive.time())))
}

/// Calendar date of a stored UTC instant, as seen from `tz`.
pub fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Map a wall-clock time back to an instant in `tz`.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Times inside a gap (clocks springing forward) move to the first wall-clock
/// time after the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt;
    }
    let mut candidate = naive;
    // No real zone has a gap longer than a day.
    for _ in 0..96 {
        candidate += Duration::minutes(15);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt;
        }
    }
    tz.from_utc_datetime(&naive)
}
