//! Reconciliation plan computation.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::contact::Contact;
use crate::diff::BirthdayDiff;
use crate::identity::{Identifier, identify};
use crate::remote::ManagedEvent;

/// Operations that make the collection match the contact set.
///
/// The three lists are disjoint by identifier and sorted by it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub to_delete: Vec<BirthdayDiff>,
    pub to_replace: Vec<BirthdayDiff>,
    pub to_create: Vec<BirthdayDiff>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_replace.is_empty() && self.to_create.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_replace.len() + self.to_create.len()
    }

    /// All diffs in apply order: deletes, replaces, creates.
    pub fn diffs(&self) -> impl Iterator<Item = &BirthdayDiff> {
        self.to_delete
            .iter()
            .chain(&self.to_replace)
            .chain(&self.to_create)
    }

    pub fn delete_ids(&self) -> BTreeSet<&Identifier> {
        self.to_delete.iter().map(|d| &d.identifier).collect()
    }

    pub fn replace_ids(&self) -> BTreeSet<&Identifier> {
        self.to_replace.iter().map(|d| &d.identifier).collect()
    }

    pub fn create_ids(&self) -> BTreeSet<&Identifier> {
        self.to_create.iter().map(|d| &d.identifier).collect()
    }

    fn is_disjoint(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.diffs().all(|d| seen.insert(&d.identifier))
    }
}

/// Compare the contact set with the snapshot.
///
/// Pure: no I/O, and the result does not depend on input order beyond the
/// documented collision rule (of two contacts or two stored events sharing an
/// identifier, the later one wins).
pub fn plan(contacts: &[Contact], snapshot: &[ManagedEvent]) -> ReconciliationPlan {
    let mut current_by_identifier: HashMap<Identifier, &Contact> = HashMap::new();
    for contact in contacts {
        if let Some(previous) = current_by_identifier.insert(identify(contact), contact) {
            warn!(
                kept = %contact.full_name(),
                dropped = %previous.full_name(),
                "contacts share a name; only one birthday event is kept"
            );
        }
    }

    let mut existing_by_identifier: HashMap<&Identifier, &ManagedEvent> = HashMap::new();
    for event in snapshot {
        if let Some(previous) = existing_by_identifier.insert(&event.identifier, event) {
            warn!(
                identifier = %event.identifier,
                kept = %event.location,
                ignored = %previous.location,
                "duplicate birthday events in collection"
            );
        }
    }

    let mut plan = ReconciliationPlan::default();

    // Stored events whose contact is gone
    for (identifier, existing) in &existing_by_identifier {
        if !current_by_identifier.contains_key(*identifier) {
            let diff = BirthdayDiff::delete((*identifier).clone(), (*existing).clone());
            plan.to_delete.push(diff);
        }
    }

    // New contacts, and contacts whose birthday changed
    for (identifier, contact) in &current_by_identifier {
        let contact = (*contact).clone();
        match existing_by_identifier.get(identifier) {
            None => plan.to_create.push(BirthdayDiff::create(identifier.clone(), contact)),
            Some(existing) if BirthdayDiff::is_changed(existing, &contact) => {
                let diff = BirthdayDiff::replace(identifier.clone(), (*existing).clone(), contact);
                plan.to_replace.push(diff);
            }
            Some(_) => {}
        }
    }

    let by_identifier = |a: &BirthdayDiff, b: &BirthdayDiff| a.identifier.cmp(&b.identifier);
    plan.to_delete.sort_by(by_identifier);
    plan.to_replace.sort_by(by_identifier);
    plan.to_create.sort_by(by_identifier);

    debug_assert!(plan.is_disjoint(), "reconciliation plan sets overlap");

    plan
}
