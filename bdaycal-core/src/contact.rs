//! Contact facts as delivered by the contact source.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A person from the address book with a known birth date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub birthday: NaiveDate,
}

impl Contact {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        display_name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Contact {
            first_name: first_name.into(),
            last_name: last_name.into(),
            display_name: display_name.into(),
            birthday,
        }
    }

    /// "First Last", skipping empty parts.
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name.trim().is_empty() {
            write!(f, "{}", self.full_name())
        } else {
            write!(f, "{}", self.display_name)
        }
    }
}
