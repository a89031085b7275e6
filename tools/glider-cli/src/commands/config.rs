//! Show the effective configuration, or write it out.

use std::path::Path;

use anyhow::Context;
use glider_common::config::AppConfig;

pub fn run(config: &AppConfig, save: bool, path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        let written = match path {
            Some(path) => {
                config
                    .save_to(path)
                    .with_context(|| format!("Failed to write config {}", path.display()))?;
                path.to_path_buf()
            }
            None => config.save().context("Failed to write config")?,
        };
        println!();
        println!("Saved to {}", written.display());
    }
    Ok(())
}
