use std::path::Path;

use anyhow::{Context, Result};
use bdaycal_core::config::AppConfig;
use owo_colors::OwoColorize;

pub fn run(path: &Path, config: &AppConfig) -> Result<()> {
    println!("{}", "Paths".bold());
    println!("  Config:  {}", path.display());
    println!();

    let effective =
        toml::to_string_pretty(&config.redacted()).context("Failed to render configuration")?;

    println!("{}", "Effective configuration".bold());
    println!("{}", effective.trim_end());

    Ok(())
}
