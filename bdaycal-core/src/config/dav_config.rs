//! WebDAV endpoint settings.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{deserialize_duration, serialize_duration};
use crate::error::{BdayCalError, BdayCalResult};

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// `[dav]` section: credentials and the two collections involved.
#[derive(Clone, Serialize, Deserialize)]
pub struct DavConfig {
    pub user: String,
    pub password: String,
    /// Calendar collection the birthday events are written to.
    pub cal_url: String,
    /// Address book collection the contacts are read from.
    pub card_url: String,

    /// Additional probe attempts after the first one fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(
        default = "default_retry_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub retry_delay: Duration,

    /// Per-request timeout for every remote call.
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
}

impl fmt::Debug for DavConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DavConfig")
            .field("user", &self.user)
            .field("password", &"********")
            .field("cal_url", &self.cal_url)
            .field("card_url", &self.card_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DavConfig {
    /// Scheme, host and port of the calendar URL; the target of the
    /// reachability probe.
    pub fn base_address(&self) -> BdayCalResult<String> {
        let url = parse_url("cal_url", &self.cal_url)?;
        Ok(url.origin().ascii_serialization())
    }

    /// Last path segment of the calendar URL, e.g. the collection name.
    pub fn calendar_path(&self) -> &str {
        self.cal_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    pub(super) fn validate(mut self) -> BdayCalResult<Self> {
        parse_url("cal_url", &self.cal_url)?;
        parse_url("card_url", &self.card_url)?;

        // Collection URLs are joined with resource names
        if !self.cal_url.ends_with('/') {
            self.cal_url.push('/');
        }
        if !self.card_url.ends_with('/') {
            self.card_url.push('/');
        }

        Ok(self)
    }

    pub(super) fn redacted(&self) -> Self {
        DavConfig {
            password: "********".to_string(),
            ..self.clone()
        }
    }
}

fn parse_url(field: &str, value: &str) -> BdayCalResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| BdayCalError::Config(format!("dav.{field} '{value}' is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BdayCalError::Config(format!(
            "dav.{field} must be an http(s) URL, got '{value}'"
        )));
    }
    Ok(url)
}
