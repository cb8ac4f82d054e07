//! Local state locations
//!
//! gitpix keeps three files under ~/.config/gitpix/:
//! - config.toml: target repository, link base and index sizes
//! - credentials.enc: the GitHub token, encrypted per machine
//! - gitpix.sqlite: commit detail snapshots, one per repository, so a new
//!   session starts with a warm cache

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "gitpix";

/// Directory holding all gitpix state, created on first use
pub fn gitpix_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join(APP_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// Configuration read by every command
pub fn config_path() -> Result<PathBuf> {
    Ok(gitpix_dir()?.join("config.toml"))
}

/// Snapshot database restored when a gallery opens
pub fn database_path() -> Result<PathBuf> {
    Ok(gitpix_dir()?.join("gitpix.sqlite"))
}

/// Token vault written by `gitpix auth`
pub fn credentials_path() -> Result<PathBuf> {
    Ok(gitpix_dir()?.join("credentials.enc"))
}
