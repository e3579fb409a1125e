//! Server configuration loading and argument validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use array_server::builtin_plugin;
use catalog_core::{CatalogError, CatalogSource};
use serde::{Deserialize, Serialize};

use crate::registry::{self, CatalogImplementation};

/// Title used when no application name is configured.
pub const DEFAULT_APP_NAME: &str = "Catalog_Server";

/// Server configuration, loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Format key: `intake` or `stac`.
    #[serde(default)]
    pub catalog_type: String,

    /// Catalog document path or URL.
    #[serde(default)]
    pub catalog_path: String,

    /// Application title.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Built-in serving plugins enabled on every data-bearing node.
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    /// Listen address.
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            catalog_type: String::new(),
            catalog_path: String::new(),
            app_name: default_app_name(),
            plugins: default_plugins(),
            listen: default_listen(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(catalog_type: impl Into<String>, catalog_path: impl Into<String>) -> Self {
        Self {
            catalog_type: catalog_type.into(),
            catalog_path: catalog_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;
        tracing::debug!(path = ?path, "Loaded server configuration");
        Ok(config)
    }
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_plugins() -> Vec<String> {
    vec![array_server::DATASET_INFO.to_string()]
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

/// Process-wide logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Also write logs to this `.log` file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Validated inputs for assembling the application.
#[derive(Clone, Debug)]
pub struct AppComponents {
    pub catalog_path: String,
    /// File stem of the catalog document.
    pub catalog_name: String,
    pub implementation: CatalogImplementation,
    pub name: String,
    pub plugins: Vec<String>,
}

/// Check the configured catalog, format key, title and plugins.
pub fn validate_arguments(config: &ServerConfig) -> std::result::Result<AppComponents, CatalogError> {
    if config.catalog_path.trim().is_empty() {
        return Err(CatalogError::config("catalog_path must be provided"));
    }
    let catalog_name = CatalogSource::parse(&config.catalog_path).stem();

    let catalog_type = config.catalog_type.to_lowercase();
    let implementations = registry::get_all_implementations()?;
    let Some(implementation) = implementations.get(&catalog_type).cloned() else {
        return Err(CatalogError::config(format!(
            "catalog_type={} is not in {:?}",
            config.catalog_type,
            implementations.keys().collect::<Vec<_>>()
        )));
    };

    let name = if config.app_name.trim().is_empty() {
        default_app_name()
    } else {
        config.app_name.clone()
    };

    for plugin in &config.plugins {
        if builtin_plugin(plugin).is_none() {
            return Err(CatalogError::config(format!(
                "unknown serving plugin '{}'",
                plugin
            )));
        }
    }

    Ok(AppComponents {
        catalog_path: config.catalog_path.clone(),
        catalog_name,
        implementation,
        name,
        plugins: config.plugins.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_yaml() {
        let config: ServerConfig =
            serde_yaml::from_str("catalog_type: stac\ncatalog_path: /data/catalog.json\n").unwrap();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.plugins, ["dataset_info"]);
        assert_eq!(config.listen, "0.0.0.0:8000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_logging_section() {
        let config: ServerConfig = serde_yaml::from_str(
            "catalog_type: intake\ncatalog_path: a.yaml\nlogging:\n  level: debug\n  format: pretty\n  log_file: /tmp/server.log\n",
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.log_file, Some(PathBuf::from("/tmp/server.log")));
    }

    #[test]
    fn test_validate_arguments() {
        let mut config = ServerConfig::new("STAC", "/data/test_stac_catalog.json");
        let components = validate_arguments(&config).unwrap();
        assert_eq!(components.catalog_name, "test_stac_catalog");
        assert_eq!(components.implementation.catalog_type(), "stac");
        assert_eq!(components.name, DEFAULT_APP_NAME);

        config.catalog_type = "thredds".into();
        let err = validate_arguments(&config).unwrap_err();
        assert!(err.to_string().contains("thredds"));

        config.catalog_type = "intake".into();
        config.plugins = vec!["tiles".into()];
        assert!(validate_arguments(&config).is_err());

        let empty = ServerConfig::new("intake", "");
        assert!(matches!(validate_arguments(&empty), Err(CatalogError::Config(_))));
    }
}
