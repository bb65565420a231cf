//! Birthday event templates.

use std::fmt::Write;
use std::time::Duration;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::{deserialize_opt_duration, serialize_opt_duration};
use crate::contact::Contact;
use crate::error::{BdayCalError, BdayCalResult};

const FIRST_NAME: &str = "~first-name~";
const LAST_NAME: &str = "~last-name~";
const DISPLAY_NAME: &str = "~display-name~";
const BIRTHDAY: &str = "~birthday~";

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

fn default_summary() -> String {
    format!("\u{1F382} {DISPLAY_NAME}")
}

fn default_description() -> String {
    format!("Birthday: {BIRTHDAY}")
}

fn default_date_format() -> String {
    FALLBACK_DATE_FORMAT.to_string()
}

/// `[event]` section.
///
/// `summary` and `description` are templates; the placeholders
/// `~first-name~`, `~last-name~`, `~display-name~` and `~birthday~` are
/// replaced with the contact's values. `date_format` is a strftime string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_summary")]
    pub summary: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Reminder fired this long before the event, e.g. `1d`.
    #[serde(
        default,
        deserialize_with = "deserialize_opt_duration",
        serialize_with = "serialize_opt_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub alarm: Option<Duration>,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            summary: default_summary(),
            description: default_description(),
            date_format: default_date_format(),
            alarm: None,
        }
    }
}

impl EventConfig {
    pub fn generate_summary(&self, contact: &Contact) -> String {
        self.replace(&self.summary, contact)
    }

    pub fn generate_description(&self, contact: &Contact) -> String {
        self.replace(&self.description, contact)
    }

    /// Format a date with `date_format`.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            // Time fields in a date-only format; validated at load time
            return date.format(FALLBACK_DATE_FORMAT).to_string();
        }
        out
    }

    fn replace(&self, template: &str, contact: &Contact) -> String {
        template
            .replace(FIRST_NAME, &contact.first_name)
            .replace(LAST_NAME, &contact.last_name)
            .replace(DISPLAY_NAME, &contact.display_name)
            .replace(BIRTHDAY, &self.format_date(contact.birthday))
    }

    pub(super) fn validate(self) -> BdayCalResult<Self> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(BdayCalError::Config(format!(
                "event.date_format '{}' is not a valid strftime format",
                self.date_format
            )));
        }

        let sample = NaiveDate::from_ymd_opt(2000, 1, 31).unwrap_or_default();
        let mut out = String::new();
        if write!(out, "{}", sample.format(&self.date_format)).is_err() {
            return Err(BdayCalError::Config(format!(
                "event.date_format '{}' uses fields a date does not have",
                self.date_format
            )));
        }

        if self.alarm == Some(Duration::ZERO) {
            return Err(BdayCalError::Config(
                "event.alarm must be longer than zero; omit it to disable the reminder".into(),
            ));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact::new(
            "Firstname",
            "Lastname",
            "FirstLast",
            NaiveDate::from_ymd_opt(1980, 12, 1).unwrap(),
        )
    }

    #[test]
    fn test_templates_replace_all_placeholders() {
        let config = EventConfig {
            summary: "\u{1F382} ~first-name~ ~last-name~".to_string(),
            description: "Birthday: ~birthday~ (~display-name~)".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            alarm: None,
        };

        assert_eq!(config.generate_summary(&contact()), "\u{1F382} Firstname Lastname");
        assert_eq!(
            config.generate_description(&contact()),
            "Birthday: 1980-12-01 (FirstLast)"
        );
    }

    #[test]
    fn test_placeholder_may_repeat() {
        let config = EventConfig {
            summary: "~first-name~/~first-name~".to_string(),
            ..EventConfig::default()
        };
        assert_eq!(config.generate_summary(&contact()), "Firstname/Firstname");
    }

    #[test]
    fn test_custom_date_format() {
        let config = EventConfig {
            date_format: "%d.%m.%Y".to_string(),
            ..EventConfig::default()
        };
        assert_eq!(config.generate_description(&contact()), "Birthday: 01.12.1980");
    }

    #[test]
    fn test_validate_rejects_broken_format() {
        let config = EventConfig {
            date_format: "%Y-%Q".to_string(),
            ..EventConfig::default()
        };
        assert!(matches!(config.validate(), Err(BdayCalError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_time_fields() {
        let config = EventConfig {
            date_format: "%Y-%m-%d %H:%M".to_string(),
            ..EventConfig::default()
        };
        assert!(matches!(config.validate(), Err(BdayCalError::Config(_))));
    }

    #[test]
    fn test_format_date_falls_back_on_time_fields() {
        let config = EventConfig {
            date_format: "%H:%M".to_string(),
            ..EventConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(1980, 12, 1).unwrap();
        assert_eq!(config.format_date(date), "1980-12-01");
    }
}
