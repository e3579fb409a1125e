//! Catalog API server.
//!
//! Serves every node of an Intake or STAC catalog, with dataset access for
//! the nodes that list datasets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_api::{create_app, LogFormat, ServerConfig};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog-api")]
#[command(about = "Serve an Intake or STAC catalog as HTTP endpoints")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CATALOG_API_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog format: intake or stac
    #[arg(long, env = "CATALOG_TYPE")]
    catalog_type: Option<String>,

    /// Catalog document path or URL
    #[arg(long, env = "CATALOG_PATH")]
    catalog_path: Option<String>,

    /// Application title
    #[arg(long, env = "APP_NAME")]
    app_name: Option<String>,

    /// Listen address
    #[arg(long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    /// Also write logs to this .log file
    #[arg(long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(v) = self.catalog_type {
            config.catalog_type = v;
        }
        if let Some(v) = self.catalog_path {
            config.catalog_path = v;
        }
        if let Some(v) = self.app_name {
            config.app_name = v;
        }
        if let Some(v) = self.listen {
            config.listen = v;
        }
        if let Some(v) = self.log_level {
            config.logging.level = v;
        }
        if let Some(v) = self.log_format {
            config.logging.format = v;
        }
        if self.log_file.is_some() {
            config.logging.log_file = self.log_file;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Args::parse().into_config()?;
    let app = create_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!(address = %config.listen, catalog = %config.catalog_path, "Catalog API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
