use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for osdeps

/// Get the osdeps config directory, creating it if needed
pub fn osdeps_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("osdeps");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the default config file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(osdeps_config_dir()?.join("osdeps.toml"))
}

/// Directory searched for `*.osdeps` files when no source is configured
pub fn default_sources_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
            home.join(".local/share")
        })
        .join("osdeps")
}
