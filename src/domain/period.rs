/// Calendar period arithmetic shared across the engine
///
/// Goal periods and weekly summaries must agree on boundaries, so both go
/// through these functions. Weeks start on Monday; a Sunday reference maps
/// back six days, never forward. All functions are pure and idempotent.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::domain::PeriodType;

/// Midnight at the start of the given day, in UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The last representable instant of the given day, in UTC
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}

/// The Monday on or before the given date
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(offset)
}

/// First day of the month containing the given date
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // from_ymd_opt cannot fail for day 1 of an existing month
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Last day of the month containing the given date
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_of_next) => first_of_next - Duration::days(1),
        None => date,
    }
}

/// Compute the inclusive bounds of the period containing a reference instant
///
/// Daily: midnight to last instant of the reference day. Weekly: Monday
/// midnight to Sunday last instant. Monthly: first to last day of month.
pub fn period_bounds(
    reference: DateTime<Utc>,
    period: PeriodType,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = reference.date_naive();
    match period {
        PeriodType::Daily => (start_of_day(date), end_of_day(date)),
        PeriodType::Weekly => {
            let monday = week_start(date);
            (start_of_day(monday), end_of_day(monday + Duration::days(6)))
        }
        PeriodType::Monthly => (start_of_day(month_start(date)), end_of_day(month_end(date))),
    }
}
