//! TOML-based configuration for tabula.
//!
//! Supports a config file (tabula.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [engine]
//! default = "warehouse"
//!
//! [embedded]
//! location = "./data/reports.duckdb"
//!
//! [warehouse]
//! project = "${GCP_PROJECT}"
//! dataset = "analytics"
//! table = "events"
//! location = "EU"
//! credentials = "${GOOGLE_APPLICATION_CREDENTIALS}"
//! ```

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::WarehouseConfig;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub embedded: EmbeddedSettings,
    pub warehouse: WarehouseSettings,
}

/// Which engine runs a report when none is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Local,
    Embedded,
    Warehouse,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Local => "local",
            EngineKind::Embedded => "embedded",
            EngineKind::Warehouse => "warehouse",
        })
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(EngineKind::Local),
            "embedded" | "duckdb" => Ok(EngineKind::Embedded),
            "warehouse" | "bigquery" => Ok(EngineKind::Warehouse),
            _ => Err(format!("unknown engine: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    pub default: EngineKind,
}

/// Embedded engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddedSettings {
    /// Database file (supports ${ENV_VAR} expansion); unset means in-memory.
    pub location: Option<String>,
}

impl EmbeddedSettings {
    pub fn resolved_location(&self) -> Result<Option<String>, SettingsError> {
        self.location.as_deref().map(expand_env_vars).transpose()
    }
}

/// Warehouse engine configuration. Every field supports ${ENV_VAR} expansion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    pub project: Option<String>,
    pub dataset: Option<String>,
    pub table: Option<String>,
    pub location: Option<String>,
    pub credentials: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TABULA_CONFIG`
    /// 2. `./tabula.toml`
    /// 3. `~/.config/tabula/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("TABULA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("tabula.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tabula").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// The warehouse connection with environment variables expanded.
    pub fn warehouse_config(&self) -> Result<WarehouseConfig, SettingsError> {
        let w = &self.warehouse;
        let required = |field: &str, value: &Option<String>| -> Result<String, SettingsError> {
            match value.as_deref().map(expand_env_vars).transpose()? {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(SettingsError::InvalidConfig(format!(
                    "warehouse.{} is required",
                    field
                ))),
            }
        };
        let optional = |value: &Option<String>| value.as_deref().map(expand_env_vars).transpose();

        Ok(WarehouseConfig {
            project: required("project", &w.project)?,
            dataset: required("dataset", &w.dataset)?,
            table: required("table", &w.table)?,
            location: optional(&w.location)?,
            credentials: optional(&w.credentials)?,
        })
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            std::iter::from_fn(|| chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_')).collect()
        };
        if var_name.is_empty() {
            result.push('$');
            continue;
        }
        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
