use std::path::PathBuf;

use libbeacon_core::{load_config, BeaconConfig, BeaconError, SelectionState};

use crate::cli::Cli;

/// Environment variable naming the config directory
pub const HOME_ENV: &str = "BEACON_HOME";

pub const DEFAULT_CONFIG_DIR: &str = ".beacon";

/// Resolved context for a beacon command
pub struct BeaconContext {
    pub config_dir: PathBuf,
    pub config: BeaconConfig,
    pub state: SelectionState,
}

impl BeaconContext {
    /// Resolve the config directory (flag, then env, then `.beacon` in the
    /// working directory) and load config and selection state from it
    pub fn resolve(cli: &Cli) -> Result<Self, BeaconError> {
        let config_dir = if let Some(dir) = &cli.config_dir {
            dir.clone()
        } else if let Some(dir) = std::env::var_os(HOME_ENV).filter(|d| !d.is_empty()) {
            PathBuf::from(dir)
        } else {
            std::env::current_dir()?.join(DEFAULT_CONFIG_DIR)
        };

        let config = load_config(&config_dir)?;
        let state = SelectionState::load(&config_dir)?;
        tracing::debug!(
            dir = %config_dir.display(),
            bases = config.base_urls.len(),
            "context resolved"
        );

        Ok(Self {
            config_dir,
            config,
            state,
        })
    }

    /// Explicit base URLs, then the configured ones, then the base of the
    /// selected project
    pub fn base_urls(&self, explicit: &[String]) -> Vec<String> {
        if !explicit.is_empty() {
            explicit.to_vec()
        } else if !self.config.base_urls.is_empty() {
            self.config.base_urls.clone()
        } else {
            self.state.base_url.iter().cloned().collect()
        }
    }

    /// Directory receiving download artifacts
    pub fn download_dir(&self) -> PathBuf {
        self.config
            .download_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.clone())
    }

    /// Banner project id: explicit, then the selected project, then config
    pub fn project_id(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.state.last_project.clone())
            .or_else(|| self.config.project_id.clone())
    }
}
