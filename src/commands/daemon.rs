use std::sync::Arc;

use anyhow::{Context, Result};
use bdaycal_core::config::AppConfig;
use bdaycal_core::sync;
use bdaycal_dav::{CardDavSource, DavClient};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use super::connect;

/// Everything a scheduled pass needs; passes never overlap.
struct Pass {
    client: DavClient,
    source: CardDavSource,
    config: AppConfig,
    running: Mutex<()>,
}

impl Pass {
    async fn run(&self) {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("previous sync pass still running, skipping this one");
            return;
        };

        info!("starting sync pass");
        match sync::run(&self.client, &self.source, &self.config).await {
            Ok(report) => {
                for failure in &report.apply.failed {
                    warn!(
                        identifier = %failure.identifier,
                        operation = %failure.operation,
                        href = %failure.href,
                        "{}",
                        failure.error
                    );
                }
                info!(
                    contacts = report.contacts,
                    created = report.apply.created.len(),
                    replaced = report.apply.replaced.len(),
                    deleted = report.apply.deleted.len(),
                    failed = report.apply.failed.len(),
                    skipped = report.skipped.len(),
                    "sync pass finished"
                );
            }
            Err(e) => error!(stage = e.stage(), "sync pass failed: {}", e),
        }
    }
}

/// Cron job running `pass`; the schedule fires in the host's local time zone.
fn sync_job(cron: &str, pass: Arc<Pass>) -> Result<Job> {
    Job::new_async_tz(cron, chrono::Local, move |_id, _lock| {
        let pass = pass.clone();
        Box::pin(async move { pass.run().await })
    })
    .with_context(|| format!("Invalid cron expression '{}'", cron))
}

pub async fn run(config: AppConfig) -> Result<()> {
    let (client, source) = connect(&config)?;
    let cron = config.sync.cron.clone();
    let run_on_start = config.sync.run_on_start;

    let pass = Arc::new(Pass {
        client,
        source,
        config,
        running: Mutex::new(()),
    });

    let mut scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    let job = sync_job(&cron, pass.clone())?;

    scheduler.add(job).await.context("Failed to schedule sync")?;
    scheduler.start().await.context("Failed to start scheduler")?;
    info!(%cron, timezone = "local", "daemon started");

    if run_on_start {
        let pass = pass.clone();
        tokio::spawn(async move { pass.run().await });
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("shutting down");
    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdaycal_core::config::{DavConfig, EventConfig, SyncConfig};
    use std::time::Duration;

    fn pass() -> Pass {
        let config = AppConfig {
            dav: DavConfig {
                user: "dev".to_string(),
                password: "secret".to_string(),
                cal_url: "http://127.0.0.1:9/cal/".to_string(),
                card_url: "http://127.0.0.1:9/card/".to_string(),
                max_retries: 0,
                retry_delay: Duration::from_millis(1),
                timeout: Duration::from_millis(200),
            },
            event: EventConfig::default(),
            sync: SyncConfig::default(),
        };
        let (client, source) = connect(&config).unwrap();
        Pass {
            client,
            source,
            config,
            running: Mutex::new(()),
        }
    }

    #[tokio::test]
    async fn test_overlapping_pass_is_skipped() {
        let pass = pass();
        let _running = pass.running.lock().await;

        // Returns immediately instead of waiting for the lock
        tokio::time::timeout(Duration::from_secs(1), pass.run())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_pass_releases_lock() {
        let pass = pass();

        pass.run().await;

        assert!(pass.running.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_schedule_fires_in_local_time() {
        use chrono::Timelike;

        let mut scheduler = JobScheduler::new().await.unwrap();
        let job = sync_job("0 30 3 * * *", Arc::new(pass())).unwrap();
        let id = scheduler.add(job).await.unwrap();

        let next = scheduler.next_tick_for_job(id).await.unwrap().unwrap();
        let local = next.with_timezone(&chrono::Local);

        assert_eq!((local.hour(), local.minute()), (3, 30));
    }

    #[test]
    fn test_invalid_cron_is_rejected() {
        let err = sync_job("every night", Arc::new(pass())).err().unwrap();
        assert!(err.to_string().contains("every night"));
    }
}
