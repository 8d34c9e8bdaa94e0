use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BeaconError;

pub const CONFIG_FILE: &str = "config.toml";
pub const STATE_FILE: &str = "state.toml";

/// Default per-fetch timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Settings stored in <config dir>/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Base URLs tried in order for every remote source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_urls: Vec<String>,
    /// Per-fetch timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Output format: "json" or "yaml"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Project identifier written into the banner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Source path written into the banner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Where blocked deliveries are downloaded to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    /// Inline threshold used when the narrative sets none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_inline_kb: Option<f64>,
}

impl BeaconConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }
}

/// Cross-call state stored in <config dir>/state.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_project: Option<String>,
    /// Base URL of the selected project, taken from its index entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Load config from <dir>/config.toml; a missing file yields defaults
pub fn load_config(dir: &Path) -> Result<BeaconConfig, BeaconError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(BeaconConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

impl SelectionState {
    /// Read <dir>/state.toml; a missing file means nothing was selected yet
    pub fn load(dir: &Path) -> Result<Self, BeaconError> {
        let path = dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, dir: &Path) -> Result<(), BeaconError> {
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join(STATE_FILE), content)?;
        Ok(())
    }
}
