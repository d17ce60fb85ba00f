//! Configuration module
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Candidate settings locations, most specific first
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var("SEARCH_ORCH_SETTINGS_PATH") {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("search-orchestrator/settings.yml"));
    }
    paths
}

/// Load settings from `path`, or the first existing candidate, or defaults.
/// Environment overrides are applied last.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let found = match path {
        Some(p) => Some(p.to_path_buf()),
        None => candidate_paths().into_iter().find(|p| p.exists()),
    };

    let mut settings = match found {
        Some(p) => {
            info!("Loading settings from: {}", p.display());
            Settings::from_file(&p)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    Ok(settings)
}
