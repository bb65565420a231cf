use anyhow::{Result, anyhow, bail};
use bdaycal_core::config::AppConfig;
use bdaycal_core::sync;
use owo_colors::OwoColorize;

use super::{Activity, connect};
use crate::render::Render;

pub async fn run(config: &AppConfig, json: bool, strict: bool) -> Result<()> {
    let (client, source) = connect(config)?;

    let activity = Activity::start(calendar_title(config), json);
    let result = sync::run(&client, &source, config).await;
    drop(activity);

    let report = result.map_err(|e| anyhow!("Sync aborted at the {} stage: {}", e.stage(), e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", calendar_title(config));
        println!("{}", report.render());
    }

    if strict && !report.is_clean() {
        bail!(
            "{} failed and {} skipped",
            report.apply.failed.len(),
            report.skipped.len()
        );
    }

    Ok(())
}

pub fn calendar_title(config: &AppConfig) -> String {
    format!("🎂 {}", config.dav.calendar_path().bold())
}
