//! Reachability check run before the collection is touched.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::{BdayCalError, BdayCalResult};
use crate::remote::{Reachability, RemoteStore};

/// Probe `base_address` until it answers, at most `max_retries + 1` times,
/// sleeping `retry_delay` between attempts.
///
/// Only [`RemoteStore::probe`] is called, so a failure here leaves the
/// collection unread and unmodified.
pub async fn ensure_reachable<S: RemoteStore + ?Sized>(
    store: &S,
    base_address: &str,
    max_retries: u32,
    retry_delay: Duration,
) -> BdayCalResult<()> {
    let attempts = max_retries.saturating_add(1);

    for attempt in 1..=attempts {
        match store.probe(base_address).await {
            Reachability::Reachable => {
                debug!(base_address, attempt, "remote store reachable");
                return Ok(());
            }
            Reachability::Unreachable(reason) => {
                warn!(base_address, attempt, attempts, "remote store unreachable: {reason}");
                if attempt < attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    error!(base_address, attempts, "giving up on unreachable remote store");
    Err(BdayCalError::Unreachable {
        address: base_address.to_string(),
        attempts,
    })
}
