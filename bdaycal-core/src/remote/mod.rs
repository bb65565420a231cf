//! Remote calendar collection: the store collaborator and its snapshot.

mod snapshot;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BdayCalResult;
use crate::ics::CALENDAR_MEDIA_TYPE;
use crate::identity::Identifier;

pub use snapshot::{SkippedEntry, Snapshot, snapshot};

/// One member of a listed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DavEntry {
    pub href: String,
    pub media_type: Option<String>,
    pub is_collection: bool,
}

impl DavEntry {
    /// Calendar object resources: `text/calendar`, any parameters.
    pub fn is_calendar_object(&self) -> bool {
        !self.is_collection
            && self.media_type.as_deref().is_some_and(|media_type| {
                media_type
                    .split(';')
                    .next()
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(CALENDAR_MEDIA_TYPE))
            })
    }
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable(String),
}

/// WebDAV-like store holding the calendar collection.
///
/// `href` arguments are either absolute URLs or paths as returned by
/// [`list`](RemoteStore::list). Every call is bounded by the
/// implementation's request timeout.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(&self, collection: &str) -> BdayCalResult<Vec<DavEntry>>;

    async fn get(&self, href: &str) -> BdayCalResult<Vec<u8>>;

    async fn put(&self, href: &str, body: Vec<u8>) -> BdayCalResult<()>;

    async fn delete(&self, href: &str) -> BdayCalResult<()>;

    async fn probe(&self, base_address: &str) -> Reachability;
}

/// Remote-side view of a birthday event we manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedEvent {
    pub identifier: Identifier,
    pub birthday: NaiveDate,
    /// Where the resource lives; used to delete it.
    pub location: String,
    pub summary: Option<String>,
}

/// Build the href for an event resource in a collection.
pub fn event_href(collection: &str, identifier: &Identifier) -> String {
    let base = collection.trim_end_matches('/');
    format!("{}/{}.ics", base, identifier)
}
