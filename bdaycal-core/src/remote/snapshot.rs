//! Snapshot of the managed entries in a calendar collection.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ManagedEvent, RemoteStore};
use crate::config::DecodePolicy;
use crate::error::{BdayCalError, BdayCalResult};
use crate::ics::EventCodec;

/// An entry left alone because it could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub href: String,
    pub reason: String,
}

/// Managed events currently in the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub events: Vec<ManagedEvent>,
    /// Only populated under [`DecodePolicy::Skip`].
    pub skipped: Vec<SkippedEntry>,
    /// Calendar objects belonging to other categories or tools.
    pub foreign: usize,
}

/// List the collection and decode every calendar object in it, keeping the
/// events tagged with the codec's category.
///
/// Transport failures abort. Decode failures abort under
/// [`DecodePolicy::Abort`] and are collected under [`DecodePolicy::Skip`].
pub async fn snapshot<S: RemoteStore + ?Sized>(
    store: &S,
    collection: &str,
    codec: &EventCodec,
    policy: DecodePolicy,
) -> BdayCalResult<Snapshot> {
    let entries = store.list(collection).await?;
    debug!(collection, entries = entries.len(), "listed collection");

    let mut snapshot = Snapshot::default();

    for entry in entries.iter().filter(|e| e.is_calendar_object()) {
        let body = store.get(&entry.href).await?;
        let content = String::from_utf8_lossy(&body);

        match codec.decode(&entry.href, &content) {
            Ok(Some(decoded)) => snapshot.events.push(ManagedEvent {
                identifier: decoded.identifier,
                birthday: decoded.birthday,
                location: entry.href.clone(),
                summary: decoded.summary,
            }),
            Ok(None) => snapshot.foreign += 1,
            Err(BdayCalError::Decode { href, reason }) if policy == DecodePolicy::Skip => {
                warn!(%href, %reason, "skipping undecodable calendar entry");
                snapshot.skipped.push(SkippedEntry { href, reason });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        category = codec.category(),
        managed = snapshot.events.len(),
        foreign = snapshot.foreign,
        skipped = snapshot.skipped.len(),
        "took snapshot of {}",
        collection
    );

    Ok(snapshot)
}
