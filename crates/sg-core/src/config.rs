//! Configuration types and parsing for sqlgate.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use sg_sql::{ColumnParsePolicy, Grammar};
use std::path::{Path, PathBuf};

/// Config file names looked up in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sqlgate.yml", "sqlgate.yaml"];

/// Engine configuration from sqlgate.yml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dialect hint used when a command does not name one
    #[serde(default)]
    pub dialect: Option<String>,

    /// Directories scanned recursively for dataset definitions
    #[serde(default = "default_dataset_paths")]
    pub dataset_paths: Vec<String>,

    /// What column extraction does when SQL does not parse
    #[serde(default)]
    pub column_parse_policy: ColumnParsePolicy,

    /// Compare referenced columns against dataset allow-lists
    #[serde(default = "default_true")]
    pub enforce_columns: bool,

    /// Tolerate `SELECT *` on physical tables
    #[serde(default)]
    pub allow_wildcards: bool,
}

fn default_dataset_paths() -> Vec<String> {
    vec!["datasets".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: None,
            dataset_paths: default_dataset_paths(),
            column_parse_policy: ColumnParsePolicy::default(),
            enforce_columns: true,
            allow_wildcards: false,
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sqlgate.yml or sqlgate.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.dataset_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one dataset_paths entry must be specified".to_string(),
            });
        }

        if self.dataset_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: "dataset_paths entries cannot be empty".to_string(),
            });
        }

        if let Some(dialect) = &self.dialect {
            if dialect.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "dialect cannot be an empty string; remove it to use the default"
                        .to_string(),
                });
            }
            if Grammar::from_name(dialect).is_none() {
                log::warn!(
                    "Config dialect '{}' is not recognised, queries will parse as {}",
                    dialect,
                    Grammar::default()
                );
            }
        }

        Ok(())
    }

    /// Dataset directories resolved against the project root
    pub fn dataset_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.dataset_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Pick the dialect for a query: an explicit hint wins over the configured one
    pub fn dialect_for<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.dialect.as_deref())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
