//! Managed event decoding using the icalendar crate's parser.

use chrono::{Datelike, NaiveDate};
use icalendar::parser::{Component, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use super::EventCodec;
use crate::error::{BdayCalError, BdayCalResult};
use crate::identity::Identifier;

/// The parts of a managed entry the reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub identifier: Identifier,
    pub birthday: NaiveDate,
    pub summary: Option<String>,
}

impl EventCodec {
    /// Decode a fetched calendar resource.
    ///
    /// Returns `Ok(None)` for entries that are not ours: other component
    /// types, or events without the managed category. Fails when the
    /// resource does not hold exactly one calendar object, or when a managed
    /// event lacks its UID, start date or yearly recurrence.
    pub fn decode(&self, href: &str, content: &str) -> BdayCalResult<Option<DecodedEvent>> {
        let decode_error = |reason: String| BdayCalError::Decode {
            href: href.to_string(),
            reason,
        };

        let unfolded = unfold(content);
        let calendar = read_calendar(&unfolded).map_err(|e| decode_error(e.to_string()))?;

        // Timezone definitions travel alongside the object they describe
        let objects: Vec<&Component> = calendar
            .components
            .iter()
            .filter(|c| c.name != "VTIMEZONE")
            .collect();
        if objects.len() != 1 {
            return Err(decode_error(format!(
                "unexpected number of calendar components: {} (expected: 1)",
                objects.len()
            )));
        }

        let vevent = objects[0];
        if vevent.name != "VEVENT" || !self.matches_category(vevent) {
            return Ok(None);
        }

        let identifier = vevent
            .find_prop("UID")
            .map(|p| p.val.as_ref().trim().to_string())
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| decode_error("missing UID".into()))?;

        let start = vevent
            .find_prop("DTSTART")
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .map(to_date)
            .ok_or_else(|| decode_error("missing or invalid DTSTART".into()))?;

        let rrule = vevent
            .find_prop("RRULE")
            .map(|p| p.val.to_string())
            .ok_or_else(|| decode_error("missing RRULE".into()))?;
        let birthday = birthday_from_rule(start, &rrule).map_err(decode_error)?;

        let summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());

        Ok(Some(DecodedEvent {
            identifier: Identifier::from(identifier),
            birthday,
            summary,
        }))
    }

    /// CATEGORIES may appear several times, each a comma separated list.
    fn matches_category(&self, vevent: &Component) -> bool {
        vevent
            .properties
            .iter()
            .filter(|p| p.name == "CATEGORIES")
            .flat_map(|p| p.val.as_ref().split(','))
            .any(|c| c.trim() == self.category)
    }
}

fn to_date(dpt: DatePerhapsTime) -> NaiveDate {
    match dpt {
        DatePerhapsTime::Date(d) => d,
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => dt.date_naive(),
            CalendarDateTime::Floating(naive) => naive.date(),
            CalendarDateTime::WithTimezone { date_time, .. } => date_time.date(),
        },
    }
}

/// Birth date of a stored event: the DTSTART date, moved onto the rule's
/// BYMONTH/BYMONTHDAY when those name a different day.
fn birthday_from_rule(start: NaiveDate, rrule: &str) -> Result<NaiveDate, String> {
    let mut freq = None;
    let mut month = None;
    let mut day = None;

    for part in rrule.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => freq = Some(value.trim().to_ascii_uppercase()),
            "BYMONTH" => month = value.trim().parse::<u32>().ok(),
            "BYMONTHDAY" => day = value.trim().parse::<u32>().ok(),
            _ => {}
        }
    }

    if freq.as_deref() != Some("YEARLY") {
        return Err(format!("not a yearly recurrence: {rrule}"));
    }

    match (month, day) {
        (Some(month), Some(day)) if (month, day) != (start.month(), start.day()) => {
            NaiveDate::from_ymd_opt(start.year(), month, day)
                // Feb 29th rule on a non-leap start year
                .or_else(|| NaiveDate::from_ymd_opt(2000, month, day))
                .ok_or_else(|| format!("invalid BYMONTH/BYMONTHDAY in {rrule}"))
        }
        _ => Ok(start),
    }
}
