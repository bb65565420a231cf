//! Deterministic event identity.
//!
//! A birthday event is keyed by a name-based UUID (v5) so that the same
//! contact maps to the same remote resource on every run, in every process,
//! without any local mapping table. Two contacts whose normalized first and
//! last names are equal share one identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contact::Contact;

/// Namespace for name-based birthday identifiers.
const BIRTHDAY_NAMESPACE: Uuid = Uuid::from_u128(0x6b2c_51f3_0e8a_4d6f_9a41_7d3c_b0e2_1f58);

/// Separator between normalized name parts (ASCII unit separator).
const NAME_SEPARATOR: char = '\u{1f}';

/// Opaque key shared by a contact and its managed event (the event's UID).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier(value.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identifier of a contact's birthday event.
pub fn identify(contact: &Contact) -> Identifier {
    let key = format!(
        "{}{}{}",
        normalize(&contact.first_name),
        NAME_SEPARATOR,
        normalize(&contact.last_name)
    );
    let uuid = Uuid::new_v5(&BIRTHDAY_NAMESPACE, key.as_bytes());
    Identifier(uuid.hyphenated().to_string())
}

/// Trim, case-fold and collapse inner whitespace runs.
fn normalize(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
