use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use bdaycal_core::config::AppConfig;
use bdaycal_core::ics::next_occurrence;
use bdaycal_core::sync::{self, PreparedRun};
use chrono::Utc;
use owo_colors::OwoColorize;

use super::sync::calendar_title;
use super::{Activity, connect};
use crate::render::{PlanRender, Render};

pub async fn run(config: &AppConfig, verbose: bool) -> Result<()> {
    let (client, source) = connect(config)?;

    let activity = Activity::start(calendar_title(config), false);
    let result = sync::prepare(&client, &source, config).await;
    drop(activity);

    let prepared = result.map_err(|e| anyhow!("Status failed at the {} stage: {}", e.stage(), e))?;

    println!("{}", calendar_title(config));
    println!("{}", prepared.plan.render(verbose));

    for skipped in &prepared.snapshot.skipped {
        println!("   {}", skipped.render());
    }

    if verbose {
        render_upcoming(&prepared);
    }

    Ok(())
}

/// Next occurrence of every managed birthday the plan leaves alone.
fn render_upcoming(prepared: &PreparedRun) {
    let planned: BTreeSet<_> = prepared.plan.diffs().map(|d| &d.identifier).collect();
    let now = Utc::now();

    let mut upcoming: Vec<_> = prepared
        .snapshot
        .events
        .iter()
        .filter(|e| !planned.contains(&e.identifier))
        .filter_map(|e| next_occurrence(e.birthday, now).map(|next| (next, e)))
        .collect();

    if upcoming.is_empty() {
        return;
    }

    upcoming.sort_by_key(|(next, _)| *next);

    println!();
    println!("   {}", "Upcoming:".dimmed());
    for (next, event) in upcoming {
        let label = event
            .summary
            .clone()
            .unwrap_or_else(|| event.identifier.to_string());
        println!("   {} {}", next.to_string().dimmed(), label);
    }
}
