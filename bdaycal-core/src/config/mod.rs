//! Configuration for birthday calendar runs.
//!
//! Read from `~/.config/bdaycal/config.toml` (or an explicit path), with
//! `BDAYCAL__<SECTION>__<KEY>` environment variables layered on top.

mod dav_config;
mod event_config;
mod sync_config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BdayCalError, BdayCalResult};

pub use dav_config::DavConfig;
pub use event_config::EventConfig;
pub use sync_config::{DecodePolicy, SyncConfig};

const ENV_PREFIX: &str = "BDAYCAL";

/// Complete configuration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dav: DavConfig,

    #[serde(default)]
    pub event: EventConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn config_path() -> BdayCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BdayCalError::Config("Could not determine config directory".into()))?
            .join("bdaycal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, writing a commented template first if it is missing.
    pub fn load(path: &Path) -> BdayCalResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let builder = Config::builder().add_source(File::from(path).required(false));
        Self::build(builder).map_err(|e| match e {
            BdayCalError::Config(msg) => BdayCalError::Config(format!(
                "{msg}\n\nEdit {} and set at least [dav] user, password, cal_url and card_url.",
                path.display()
            )),
            other => other,
        })
    }

    /// Load from TOML text (environment overrides still apply).
    pub fn from_toml_str(content: &str) -> BdayCalResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> BdayCalResult<Self> {
        let config: AppConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| BdayCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BdayCalError::Config(e.to_string()))?;

        config.validate()
    }

    fn validate(self) -> BdayCalResult<Self> {
        Ok(AppConfig {
            dav: self.dav.validate()?,
            event: self.event.validate()?,
            sync: self.sync.validate()?,
        })
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        AppConfig {
            dav: self.dav.redacted(),
            ..self.clone()
        }
    }

    /// Write a config file with every option present but commented out.
    pub fn create_default_config(path: &Path) -> BdayCalResult<()> {
        let contents = "\
# bdaycal configuration

[dav]
# user = \"dav-user\"
# password = \"secret\"
# Calendar collection the birthday events are written to:
# cal_url = \"https://dav.example.org/dav/dav-user/Calendar/birthdays/\"
# Address book the contacts are read from:
# card_url = \"https://dav.example.org/dav/dav-user/Contacts/personal/\"
# max_retries = 3
# retry_delay = \"10s\"
# timeout = \"30s\"

[event]
# Placeholders: ~first-name~ ~last-name~ ~display-name~ ~birthday~
# summary = \"~display-name~\"
# description = \"Birthday: ~birthday~\"
# date_format = \"%Y-%m-%d\"
# Reminder before the event:
# alarm = \"1d\"

[sync]
# category = \"Birthday\"
# decode_policy = \"abort\"
# cron = \"0 0 3 * * *\"
# run_on_start = true
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}

fn deserialize_opt_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => humantime::parse_duration(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

fn serialize_opt_duration<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serialize_duration(duration, serializer),
        None => serializer.serialize_none(),
    }
}
