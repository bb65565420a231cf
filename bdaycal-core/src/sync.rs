//! One reconciliation run: guard, contacts, snapshot, plan, apply.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::apply::{ApplyReport, apply};
use crate::config::AppConfig;
use crate::contact::Contact;
use crate::diff::{ReconciliationPlan, plan};
use crate::error::BdayCalResult;
use crate::guard::ensure_reachable;
use crate::ics::EventCodec;
use crate::remote::{RemoteStore, SkippedEntry, Snapshot, snapshot};
use crate::source::ContactSource;

/// Everything read before the first mutation.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub contacts: Vec<Contact>,
    pub snapshot: Snapshot,
    pub plan: ReconciliationPlan,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub contacts: usize,
    pub managed: usize,
    pub foreign: usize,
    pub skipped: Vec<SkippedEntry>,
    #[serde(flatten)]
    pub apply: ApplyReport,
}

impl SyncReport {
    /// True when nothing failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        !self.apply.has_failures() && self.skipped.is_empty()
    }
}

/// Run the read-only stages and compute the plan.
///
/// Stops at the first failing stage; nothing has been modified at that point.
pub async fn prepare<S, C>(store: &S, source: &C, config: &AppConfig) -> BdayCalResult<PreparedRun>
where
    S: RemoteStore + ?Sized,
    C: ContactSource + ?Sized,
{
    let dav = &config.dav;
    let base_address = dav.base_address()?;
    ensure_reachable(store, &base_address, dav.max_retries, dav.retry_delay).await?;

    let contacts = source.list_contacts_with_birthday().await?;
    info!(contacts = contacts.len(), "read contacts with a birthday");

    let codec = EventCodec::from_config(config);
    let snapshot = snapshot(store, &dav.cal_url, &codec, config.sync.decode_policy).await?;

    let plan = plan(&contacts, &snapshot.events);

    Ok(PreparedRun {
        contacts,
        snapshot,
        plan,
    })
}

/// Run every stage, applying the plan to the calendar collection.
pub async fn run<S, C>(store: &S, source: &C, config: &AppConfig) -> BdayCalResult<SyncReport>
where
    S: RemoteStore + ?Sized,
    C: ContactSource + ?Sized,
{
    let prepared = prepare(store, source, config).await?;

    let apply_report = if prepared.plan.is_empty() {
        info!("No birthday events to update found");
        ApplyReport::default()
    } else {
        info!(
            delete = prepared.plan.to_delete.len(),
            replace = prepared.plan.to_replace.len(),
            create = prepared.plan.to_create.len(),
            "applying reconciliation plan"
        );
        let codec = EventCodec::from_config(config);
        apply(&prepared.plan, store, &config.dav.cal_url, &codec).await
    };

    Ok(SyncReport {
        contacts: prepared.contacts.len(),
        managed: prepared.snapshot.events.len(),
        foreign: prepared.snapshot.foreign,
        skipped: prepared.snapshot.skipped,
        apply: apply_report,
    })
}
