//! Assemble the HTTP application from a flattened catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use array_server::{builtin_plugin, ServingApp};
use axum::{extract::Extension, routing::get, Json, Router};
use catalog_core::CatalogEndpoint;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::{validate_arguments, AppComponents, ServerConfig};
use crate::logging::init_logging;
use crate::provider::CatalogDatasetProvider;
use crate::routers::build_catalog_router;

/// Provider name of a data-bearing root node.
pub const ROOT_PROVIDER_NAME: &str = "catalog-endpoint-provider";

#[derive(Debug, Clone, Serialize)]
struct Landing {
    title: String,
    catalog: String,
    catalog_type: String,
    endpoints: Vec<Value>,
}

/// Validate the configuration, flatten the catalog and mount every node.
///
/// Configuration and partial-implementation errors abort here, before
/// anything is served.
pub async fn create_app(config: &ServerConfig) -> Result<Router> {
    init_logging(&config.logging).context("Failed to initialize logging")?;
    let components = validate_arguments(config).context("Invalid server arguments")?;

    info!(
        catalog_type = %components.implementation.catalog_type(),
        catalog_path = %components.catalog_path,
        "Parsing catalog"
    );
    let endpoints = components
        .implementation
        .catalog_search(&components.catalog_path)
        .parse()
        .await
        .with_context(|| format!("Failed to parse catalog {}", components.catalog_path))?;
    info!(endpoints = endpoints.len(), "Catalog flattened");

    assemble(&components, endpoints)
}

/// Mount already-flattened endpoints under one router.
pub fn assemble(components: &AppComponents, endpoints: Vec<CatalogEndpoint>) -> Result<Router> {
    let landing = Landing {
        title: components.name.clone(),
        catalog: components.catalog_name.clone(),
        catalog_type: components.implementation.catalog_type().to_string(),
        endpoints: endpoints
            .iter()
            .map(|ep| {
                json!({
                    "path": ep.catalog_path(),
                    "contains_datasets": ep.contains_datasets(),
                })
            })
            .collect(),
    };

    let mut app = Router::new()
        .route("/", get(landing_handler))
        .route("/health", get(health_handler))
        .layer(Extension(Arc::new(landing)));

    let catalog_router = components.implementation.catalog_router();

    for endpoint in endpoints {
        let endpoint = Arc::new(endpoint);
        let prefix = endpoint.mount_prefix().to_string();

        if !endpoint.contains_datasets() {
            app = app.merge(build_catalog_router(catalog_router.clone(), endpoint, true));
            continue;
        }

        let resolver = components
            .implementation
            .catalog_resolver(endpoint.catalog().clone())
            .with_context(|| format!("Failed to build resolver for {}", endpoint.catalog_path()))?;
        let provider = CatalogDatasetProvider::new(endpoint.clone(), resolver);

        let provider_name = if prefix.is_empty() {
            ROOT_PROVIDER_NAME.to_string()
        } else {
            prefix.clone()
        };
        let title = format!("{}{}", components.catalog_name, prefix);
        let mut sub_app = ServingApp::new(title, provider_name, Arc::new(provider));

        for name in &components.plugins {
            let Some(plugin) = builtin_plugin(name) else {
                warn!(plugin = %name, "Unknown serving plugin, skipping");
                continue;
            };
            if let Err(e) = sub_app.register_plugin(plugin) {
                warn!(catalog_path = %endpoint.catalog_path(), error = %e, "Skipping serving plugin");
            }
        }

        sub_app.include_router(build_catalog_router(catalog_router.clone(), endpoint.clone(), false));

        let sub_router = sub_app.into_router();
        app = if prefix.is_empty() {
            app.merge(sub_router)
        } else {
            app.nest(&prefix, sub_router)
        };
        info!(catalog_path = %endpoint.catalog_path(), datasets = endpoint.dataset_ids().len(), "Mounted dataset endpoint");
    }

    Ok(app
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()))
}

/// GET /
async fn landing_handler(Extension(landing): Extension<Arc<Landing>>) -> Json<Landing> {
    Json(landing.as_ref().clone())
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
