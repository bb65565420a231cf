//! Run behavior: managed category, decode policy, schedule.

use serde::{Deserialize, Serialize};

use crate::error::{BdayCalError, BdayCalResult};

fn default_category() -> String {
    "Birthday".to_string()
}

fn default_prod_id() -> String {
    "-//bdaycal//Birthday Calendar Generator//EN".to_string()
}

fn default_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_run_on_start() -> bool {
    true
}

/// What the snapshot does with an entry it cannot decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Abort the whole run.
    #[default]
    Abort,
    /// Leave the entry alone and report it.
    Skip,
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Category tag that scopes which remote entries belong to us.
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_prod_id")]
    pub prod_id: String,

    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Six-field cron expression (with seconds) used by the daemon.
    #[serde(default = "default_cron")]
    pub cron: String,

    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            category: default_category(),
            prod_id: default_prod_id(),
            decode_policy: DecodePolicy::default(),
            cron: default_cron(),
            run_on_start: default_run_on_start(),
        }
    }
}

impl SyncConfig {
    pub(super) fn validate(mut self) -> BdayCalResult<Self> {
        self.category = self.category.trim().to_string();
        if self.category.is_empty() {
            return Err(BdayCalError::Config("sync.category must not be empty".into()));
        }
        // CATEGORIES is a comma separated list
        if self.category.contains(',') {
            return Err(BdayCalError::Config(format!(
                "sync.category '{}' must not contain a comma",
                self.category
            )));
        }
        Ok(self)
    }
}
