//! Execution of a reconciliation plan against the remote store.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::contact::Contact;
use crate::diff::{BirthdayDiff, ReconciliationPlan};
use crate::error::BdayCalResult;
use crate::ics::EventCodec;
use crate::identity::Identifier;
use crate::remote::{RemoteStore, event_href};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// One remote call that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFailure {
    pub identifier: Identifier,
    pub operation: Operation,
    pub href: String,
    pub error: String,
}

/// Outcome of every item of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub created: Vec<Identifier>,
    pub replaced: Vec<Identifier>,
    pub deleted: Vec<Identifier>,
    pub failed: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.created.len() + self.replaced.len() + self.deleted.len()
    }
}

/// Apply `plan` to `collection`: deletes first, then replaces (delete followed
/// by create for the same identifier), then creates.
///
/// A failing call is recorded in the report and the remaining items still
/// run. When the delete half of a replace fails its create is not attempted.
/// An empty plan makes no remote calls.
pub async fn apply<S: RemoteStore + ?Sized>(
    plan: &ReconciliationPlan,
    store: &S,
    collection: &str,
    codec: &EventCodec,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for diff in &plan.to_delete {
        if delete_existing(diff, store, &mut report).await {
            report.deleted.push(diff.identifier.clone());
        }
    }

    for diff in &plan.to_replace {
        if !delete_existing(diff, store, &mut report).await {
            continue;
        }
        if create(diff, store, collection, codec, &mut report).await {
            report.replaced.push(diff.identifier.clone());
        }
    }

    for diff in &plan.to_create {
        if create(diff, store, collection, codec, &mut report).await {
            report.created.push(diff.identifier.clone());
        }
    }

    if !plan.is_empty() {
        info!(
            created = report.created.len(),
            replaced = report.replaced.len(),
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "applied reconciliation plan"
        );
    }

    report
}

async fn delete_existing<S: RemoteStore + ?Sized>(
    diff: &BirthdayDiff,
    store: &S,
    report: &mut ApplyReport,
) -> bool {
    let Some(existing) = &diff.existing else {
        return true;
    };

    match store.delete(&existing.location).await {
        Ok(()) => {
            debug!(
                identifier = %diff.identifier,
                href = %existing.location,
                "deleted birthday event"
            );
            true
        }
        Err(e) => {
            error!(
                identifier = %diff.identifier,
                href = %existing.location,
                "failed to delete birthday event: {e}"
            );
            report.failed.push(ApplyFailure {
                identifier: diff.identifier.clone(),
                operation: Operation::Delete,
                href: existing.location.clone(),
                error: e.to_string(),
            });
            false
        }
    }
}

async fn create<S: RemoteStore + ?Sized>(
    diff: &BirthdayDiff,
    store: &S,
    collection: &str,
    codec: &EventCodec,
    report: &mut ApplyReport,
) -> bool {
    let href = event_href(collection, &diff.identifier);
    let Some(contact) = &diff.contact else {
        return false;
    };

    match put_event(contact, &href, store, codec).await {
        Ok(()) => {
            debug!(identifier = %diff.identifier, %href, "created birthday event for {contact}");
            true
        }
        Err(e) => {
            error!(
                identifier = %diff.identifier,
                %href,
                "failed to create birthday event for {contact}: {e}"
            );
            report.failed.push(ApplyFailure {
                identifier: diff.identifier.clone(),
                operation: Operation::Create,
                href,
                error: e.to_string(),
            });
            false
        }
    }
}

async fn put_event<S: RemoteStore + ?Sized>(
    contact: &Contact,
    href: &str,
    store: &S,
    codec: &EventCodec,
) -> BdayCalResult<()> {
    let ics = codec.encode(contact)?;
    store.put(href, ics.into_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventConfig;
    use crate::diff::plan;
    use crate::identity::identify;
    use crate::remote::ManagedEvent;
    use crate::test_support::{Call, FakeStore, contact};
    use chrono::NaiveDate;

    const COLLECTION: &str = "/cal/birthdays/";

    fn codec() -> EventCodec {
        EventCodec::new(EventConfig::default(), "Birthday", "-//test//EN")
    }

    fn managed(store: &FakeStore, contact: &Contact) -> ManagedEvent {
        let location = store.insert_event(&codec(), contact);
        ManagedEvent {
            identifier: identify(contact),
            birthday: contact.birthday,
            location,
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_empty_plan_makes_no_calls() {
        let store = FakeStore::new(COLLECTION);

        let report = apply(&ReconciliationPlan::default(), &store, COLLECTION, &codec()).await;

        assert_eq!(report, ApplyReport::default());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_orders_deletes_replaces_creates() {
        let store = FakeStore::new(COLLECTION);
        let ada = contact("Ada", "Lovelace", 1980, 1, 1);
        let bob = contact("Bob", "Builder", 1975, 6, 30);
        let carol = contact("Carol", "Danvers", 1968, 3, 1);
        let snapshot = vec![managed(&store, &ada), managed(&store, &bob)];
        let mut moved_bob = bob.clone();
        moved_bob.birthday = NaiveDate::from_ymd_opt(1975, 7, 1).unwrap();

        let plan = plan(&[moved_bob, carol.clone()], &snapshot);
        let report = apply(&plan, &store, COLLECTION, &codec()).await;

        let ada_href = event_href(COLLECTION, &identify(&ada));
        let bob_href = event_href(COLLECTION, &identify(&bob));
        let carol_href = event_href(COLLECTION, &identify(&carol));
        assert_eq!(
            store.calls(),
            vec![
                Call::Delete(ada_href.clone()),
                Call::Delete(bob_href.clone()),
                Call::Put(bob_href.clone()),
                Call::Put(carol_href.clone()),
            ]
        );
        assert_eq!(report.deleted, vec![identify(&ada)]);
        assert_eq!(report.replaced, vec![identify(&bob)]);
        assert_eq!(report.created, vec![identify(&carol)]);
        assert!(!report.has_failures());
        assert!(!store.contains(&ada_href));
        assert!(store.body(&bob_href).unwrap().contains("DTSTART;VALUE=DATE:19750701"));
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_stop_siblings() {
        let store = FakeStore::new(COLLECTION);
        let x = contact("Xavier", "X", 1960, 1, 1);
        let y = contact("Yolanda", "Y", 1961, 2, 2);
        let snapshot = vec![managed(&store, &x), managed(&store, &y)];
        let x_href = event_href(COLLECTION, &identify(&x));
        store.fail_on(&x_href);

        let report = apply(&plan(&[], &snapshot), &store, COLLECTION, &codec()).await;

        assert_eq!(report.deleted, vec![identify(&y)]);
        assert_eq!(report.failed.len(), 1);
        let failure = &report.failed[0];
        assert_eq!(failure.identifier, identify(&x));
        assert_eq!(failure.operation, Operation::Delete);
        assert_eq!(failure.href, x_href);
        assert!(store.contains(&x_href));
        assert!(!store.contains(&event_href(COLLECTION, &identify(&y))));
    }

    #[tokio::test]
    async fn test_failed_create_is_recorded() {
        let store = FakeStore::new(COLLECTION);
        let ada = contact("Ada", "Lovelace", 1980, 1, 1);
        let bob = contact("Bob", "Builder", 1975, 6, 30);
        let ada_href = event_href(COLLECTION, &identify(&ada));
        store.fail_on(&ada_href);

        let plan = plan(&[ada.clone(), bob.clone()], &[]);
        let report = apply(&plan, &store, COLLECTION, &codec()).await;

        assert_eq!(report.created, vec![identify(&bob)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].operation, Operation::Create);
        assert_eq!(report.succeeded(), 1);
    }

    #[tokio::test]
    async fn test_replace_with_failing_delete_skips_create() {
        let store = FakeStore::new(COLLECTION);
        let ada = contact("Ada", "Lovelace", 1980, 1, 1);
        let snapshot = vec![managed(&store, &ada)];
        let href = event_href(COLLECTION, &identify(&ada));
        store.fail_on(&href);
        let mut moved = ada.clone();
        moved.birthday = NaiveDate::from_ymd_opt(1980, 2, 1).unwrap();

        let report = apply(&plan(&[moved], &snapshot), &store, COLLECTION, &codec()).await;

        assert_eq!(store.calls(), vec![Call::Delete(href.clone())]);
        assert!(report.replaced.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].operation, Operation::Delete);
        assert!(store.body(&href).unwrap().contains("DTSTART;VALUE=DATE:19800101"));
    }
}
