pub mod config;
pub mod daemon;
pub mod status;
pub mod sync;

use anyhow::Result;
use bdaycal_core::config::AppConfig;
use bdaycal_dav::{CardDavSource, DavClient};

pub use crate::utils::tui::Activity;

/// Calendar transport and address book for a configuration.
pub fn connect(config: &AppConfig) -> Result<(DavClient, CardDavSource)> {
    let client = DavClient::from_config(&config.dav)?;
    let source = CardDavSource::from_config(&config.dav)?;
    Ok((client, source))
}
