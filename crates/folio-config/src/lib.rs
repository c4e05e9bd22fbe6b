//! Loading and saving the editor settings file.
//!
//! The file lives at `~/.config/folio/config.toml` unless `FOLIO_CONFIG`
//! names another location. Every field is optional; missing ones take the
//! editor defaults.

use folio_engine::EditorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_VAR: &str = "FOLIO_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for editor.{field} in {config_path}: {reason}")]
    InvalidValue {
        config_path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorOptions,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;
        let config = Self::parse(&content, config_path)?;
        Ok(Some(config))
    }

    /// Parses and validates `content`; `config_path` is only used in errors.
    fn parse(content: &str, config_path: &Path) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let invalid = |field: &'static str, reason: &'static str| ConfigError::InvalidValue {
            config_path: config_path.to_path_buf(),
            field,
            reason,
        };
        if config.editor.undo_max_snapshots == 0 {
            return Err(invalid(
                "undo_max_snapshots",
                "the undo history must keep at least one snapshot",
            ));
        }
        if config.editor.undo_max_total_html_len == Some(0) {
            return Err(invalid(
                "undo_max_total_html_len",
                "omit the setting to disable the limit",
            ));
        }
        Ok(config)
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    /// Editor options from the config file, or the defaults when there is none.
    pub fn load_editor_options() -> Result<EditorOptions, ConfigError> {
        Ok(Self::load()?.unwrap_or_default().editor)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        Self::resolve_config_path(std::env::var(CONFIG_PATH_VAR).ok().as_deref())
    }

    /// The override when given and non-empty (with `~` and variables
    /// expanded), else the default location.
    fn resolve_config_path(override_path: Option<&str>) -> PathBuf {
        if let Some(path) = override_path.filter(|p| !p.is_empty()) {
            return match shellexpand::full(path) {
                Ok(expanded) => PathBuf::from(expanded.as_ref()),
                Err(_) => PathBuf::from(path),
            };
        }
        let config_dir = shellexpand::tilde("~/.config/folio");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}
