//! Yearly recurrence helpers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rrule::RRuleSet;

/// RRULE value repeating on the month and day of `date`, every year.
pub fn yearly_rule(date: NaiveDate) -> String {
    format!("FREQ=YEARLY;BYMONTH={};BYMONTHDAY={}", date.month(), date.day())
}

/// Next anniversary of `birthday` strictly after `after`.
///
/// February 29th only recurs in leap years.
pub fn next_occurrence(birthday: NaiveDate, after: DateTime<Utc>) -> Option<NaiveDate> {
    let rrule_str = format!(
        "DTSTART:{}T000000Z\nRRULE:{}",
        birthday.format("%Y%m%d"),
        yearly_rule(birthday)
    );
    let rrule_set: RRuleSet = rrule_str.parse().ok()?;

    let tz: rrule::Tz = Utc.into();
    let result = rrule_set.after(after.with_timezone(&tz)).all(1);
    result.dates.first().map(|dt| dt.date_naive())
}
