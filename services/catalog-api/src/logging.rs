//! Process-wide tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use catalog_core::CatalogError;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Parse a level name (trace, debug, info, warn, error).
pub fn validate_level(level: &str) -> Result<tracing::Level, CatalogError> {
    tracing::Level::from_str(level.trim()).map_err(|_| {
        CatalogError::config(format!(
            "log level '{}' is not one of trace, debug, info, warn, error",
            level
        ))
    })
}

/// A log file needs an existing parent directory and a `.log` suffix.
pub fn validate_log_file(path: &Path) -> Result<(), CatalogError> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(CatalogError::config(format!(
            "log file directory {} does not exist",
            parent.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("log") {
        return Err(CatalogError::config(format!(
            "log file {} must have a .log suffix",
            path.display()
        )));
    }
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. A subscriber already installed is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CatalogError> {
    let level = validate_level(&config.level)?;

    let writer = match &config.log_file {
        Some(path) => {
            validate_log_file(path)?;
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
