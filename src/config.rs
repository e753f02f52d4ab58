//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/collection-helpers/collection-helpers.toml`
//! 3. Local config: `<dir>/.collection-helpers.toml`
//! 4. Environment variables: `COLLECTION_HELPERS_*` prefix

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{BatchOptions, RangeNotification, RemovalNotification};

const APP_NAME: &str = "collection-helpers";
const ENV_PREFIX: &str = "COLLECTION_HELPERS";

/// Errors raised while loading or rendering settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment override {key}: {message}")]
    Environment { key: String, message: String },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Raw batch settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawBatchOptions {
    pub add_range: Option<RangeNotification>,
    pub remove_all: Option<RemovalNotification>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub batch: RawBatchOptions,
}

/// Unified configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Notification policies of batch operations on observable sequences
    pub batch: BatchOptions,
}

/// Get the XDG config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(format!("{}.toml", APP_NAME)))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(format!(".{}.toml", APP_NAME))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> SettingsResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            batch: BatchOptions {
                add_range: overlay.batch.add_range.unwrap_or(self.batch.add_range),
                remove_all: overlay.batch.remove_all.unwrap_or(self.batch.remove_all),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.collection-helpers.toml`
    #[instrument(level = "debug")]
    pub fn load(local_dir: Option<&Path>) -> SettingsResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "applying global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "applying local config");
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current.apply_env_overrides(None)
    }

    /// Apply `COLLECTION_HELPERS_*` environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment when given.
    fn apply_env_overrides(mut self, source: Option<HashMap<String, String>>) -> SettingsResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(source),
            )
            .build()?;

        if let Ok(val) = config.get_string("batch.add_range") {
            self.batch.add_range = val.parse::<RangeNotification>().map_err(|e| SettingsError::Environment {
                key: "batch.add_range".to_string(),
                message: format!("{e}"),
            })?;
        }
        if let Ok(val) = config.get_string("batch.remove_all") {
            self.batch.remove_all = val.parse::<RemovalNotification>().map_err(|e| SettingsError::Environment {
                key: "batch.remove_all".to_string(),
                message: format!("{e}"),
            })?;
        }

        Ok(self)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> SettingsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# collection-helpers configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/collection-helpers/collection-helpers.toml
#   Local:  <dir>/.collection-helpers.toml
#   Env:    COLLECTION_HELPERS_BATCH__ADD_RANGE, COLLECTION_HELPERS_BATCH__REMOVE_ALL

[batch]
# Notification emitted by add_range: "reset" or "range"
# add_range = "reset"

# Notification strategy of remove_all: "batched" (one reset) or "per_item"
# remove_all = "batched"
"#
        .to_string()
    }
}
