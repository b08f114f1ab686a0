use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the gideps config directory
pub fn gideps_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("gideps");
    Ok(config_dir)
}

/// Get the default config file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(gideps_config_dir()?.join("config.toml"))
}
