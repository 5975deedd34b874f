use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::model::RetentionPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerDeleteMode {
    /// One editor call covering every item found in the manager.
    #[default]
    Batch,
    /// One call per item, for exact per-item outcomes.
    PerItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tautulli: ServiceConfig,
    pub overseerr: ServiceConfig,
    pub radarr: ServiceConfig,
    #[serde(default)]
    pub policy: RetentionPolicy,
    #[serde(default)]
    pub trash_dirs: Vec<String>,
    #[serde(default)]
    pub refresh_cache: bool,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub manager_delete_mode: ManagerDeleteMode,
}

fn default_page_size() -> usize {
    25
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("PLEX_PURGE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("trash_dirs")
                .try_parsing(true),
        )
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    if config.page_size == 0 {
        return Err(ConfigError::Message("page_size must be at least 1".into()));
    }
    Ok(config)
}

impl AppConfig {
    /// Trash directories with glob patterns expanded and nested entries
    /// collapsed into their outermost parent.
    pub fn resolved_trash_dirs(&self) -> Vec<PathBuf> {
        let expanded = expand_patterns(&self.trash_dirs);
        non_overlapping_directories(expanded)
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

/// Expand glob patterns. Entries without glob metacharacters, and patterns
/// that match nothing, are kept verbatim so a missing directory is still
/// reported later.
fn expand_patterns(patterns: &[String]) -> Vec<String> {
    let mut result = Vec::new();
    for pattern in patterns {
        if !pattern.contains(&['*', '?', '['][..]) {
            result.push(pattern.clone());
            continue;
        }
        match glob::glob(pattern) {
            Ok(paths) => {
                let before = result.len();
                for entry in paths {
                    match entry {
                        Ok(path) if path.is_dir() => {
                            result.push(path.to_string_lossy().into_owned())
                        }
                        Ok(_) => {}
                        Err(e) => error!("Error expanding '{}': {}", pattern, e),
                    }
                }
                if result.len() == before {
                    warn!("Trash pattern '{}' matched no directories", pattern);
                }
            }
            Err(e) => error!("Invalid glob pattern '{}': {}", pattern, e),
        }
    }
    result
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        if result.iter().any(|kept| dir_path.starts_with(Path::new(kept))) {
            continue;
        }
        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}
