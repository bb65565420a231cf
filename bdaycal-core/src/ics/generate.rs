//! Birthday event generation.

use chrono::Utc;
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use super::EventCodec;
use super::recurrence::yearly_rule;
use crate::contact::Contact;
use crate::error::{BdayCalError, BdayCalResult};
use crate::identity::identify;

impl EventCodec {
    /// Generate the .ics resource for a contact's birthday.
    ///
    /// The UID is the contact's identifier, so the next run recognizes the
    /// resource without any stored mapping.
    pub fn encode(&self, contact: &Contact) -> BdayCalResult<String> {
        let summary = self.event.generate_summary(contact);
        let description = self.event.generate_description(contact);

        let mut cal = Calendar::new();

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(identify(contact).as_str());
        ics_event.summary(&summary);
        ics_event.description(&description);

        // DTSTAMP - required by RFC 5545
        ics_event.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

        // All-day event on the birth date, repeated on the same month/day
        let mut dtstart = Property::new("DTSTART", contact.birthday.format("%Y%m%d").to_string());
        dtstart.append_parameter(ValueType::Date);
        ics_event.append_property(dtstart);
        ics_event.add_property("RRULE", yearly_rule(contact.birthday));

        ics_event.add_property("CATEGORIES", &self.category);
        // Birthdays never block free/busy lookups
        ics_event.add_property("TRANSP", "TRANSPARENT");
        ics_event.add_property("STATUS", "CONFIRMED");

        if let Some(before) = self.event.alarm {
            let before = chrono::Duration::from_std(before)
                .map_err(|e| BdayCalError::IcsGenerate(format!("alarm duration: {e}")))?;
            let mut alarm = Alarm::display(&description, Trigger::before_start(before));
            alarm.add_property("SUMMARY", &summary);
            ics_event.alarm(alarm);
        }

        let ics_event = ics_event.done();
        cal.push(ics_event);
        let cal = cal.done();

        Ok(self.strip_ics_bloat(&cal.to_string()))
    }

    /// Clean up ICS output from the icalendar crate
    /// - Replace PRODID with the configured one
    /// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545)
    fn strip_ics_bloat(&self, ics: &str) -> String {
        let mut result = String::with_capacity(ics.len());
        let mut in_valarm = false;

        for line in ics.lines() {
            if line.starts_with("PRODID:") {
                result.push_str("PRODID:");
                result.push_str(&self.prod_id);
                result.push_str("\r\n");
                continue;
            }

            if line == "BEGIN:VALARM" {
                in_valarm = true;
            } else if line == "END:VALARM" {
                in_valarm = false;
            }

            if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
                continue;
            }

            result.push_str(line);
            result.push_str("\r\n");
        }

        result
    }
}
