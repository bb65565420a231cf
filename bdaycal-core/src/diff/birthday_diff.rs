use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::diff::DiffKind;
use crate::identity::Identifier;
use crate::remote::ManagedEvent;

/// One planned operation for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayDiff {
    pub kind: DiffKind,
    pub identifier: Identifier,
    /// The stored event, for deletes and replaces.
    pub existing: Option<ManagedEvent>,
    /// The current contact, for creates and replaces.
    pub contact: Option<Contact>,
}

impl fmt::Display for BirthdayDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.label(), self.birthday())
    }
}

impl BirthdayDiff {
    /// Compare a stored event with the current contact for one identifier.
    pub fn get_diff(
        identifier: Identifier,
        existing: Option<ManagedEvent>,
        contact: Option<Contact>,
    ) -> Option<BirthdayDiff> {
        match (existing, contact) {
            (None, Some(contact)) => Some(Self::create(identifier, contact)),
            (Some(existing), None) => Some(Self::delete(identifier, existing)),
            (Some(existing), Some(contact)) if Self::is_changed(&existing, &contact) => {
                Some(Self::replace(identifier, existing, contact))
            }
            _ => None,
        }
    }

    /// Birthdays are compared as full dates, year included, so correcting a
    /// birth year also rewrites the event (its description shows the date).
    pub fn is_changed(existing: &ManagedEvent, contact: &Contact) -> bool {
        existing.birthday != contact.birthday
    }

    pub fn create(identifier: Identifier, contact: Contact) -> BirthdayDiff {
        BirthdayDiff {
            kind: DiffKind::Create,
            identifier,
            existing: None,
            contact: Some(contact),
        }
    }

    pub fn delete(identifier: Identifier, existing: ManagedEvent) -> BirthdayDiff {
        BirthdayDiff {
            kind: DiffKind::Delete,
            identifier,
            existing: Some(existing),
            contact: None,
        }
    }

    pub fn replace(
        identifier: Identifier,
        existing: ManagedEvent,
        contact: Contact,
    ) -> BirthdayDiff {
        BirthdayDiff {
            kind: DiffKind::Replace,
            identifier,
            existing: Some(existing),
            contact: Some(contact),
        }
    }

    /// Human readable name: the contact if known, else the stored summary.
    pub fn label(&self) -> String {
        if let Some(contact) = &self.contact {
            return contact.to_string();
        }
        self.existing
            .as_ref()
            .and_then(|e| e.summary.clone())
            .unwrap_or_else(|| self.identifier.to_string())
    }

    /// The birthday the remote will hold afterwards (or held, for deletes).
    pub fn birthday(&self) -> NaiveDate {
        match (&self.contact, &self.existing) {
            (Some(contact), _) => contact.birthday,
            (None, Some(existing)) => existing.birthday,
            (None, None) => NaiveDate::default(),
        }
    }

    /// Stored birthday for replaces.
    pub fn previous_birthday(&self) -> Option<NaiveDate> {
        match self.kind {
            DiffKind::Replace => self.existing.as_ref().map(|e| e.birthday),
            _ => None,
        }
    }
}
