use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$TASKY_HOME`, or `~/.tasky`.
pub fn tasky_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TASKY_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set (or set TASKY_HOME)")?;
    Ok(PathBuf::from(home).join(".tasky"))
}

pub fn ensure_tasky_home() -> Result<PathBuf> {
    let dir = tasky_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where the session and task snapshots live.
pub fn data_dir() -> Result<PathBuf> {
    Ok(ensure_tasky_home()?.join("data"))
}
