//! Serving plugins: named routers mounted onto a serving app.

use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::ServingError;
use crate::provider::DatasetDeps;

/// A named set of dataset routes.
///
/// Routes use full paths (`/datasets/:dataset_id/...`) and read the
/// provider from a [`DatasetDeps`] request extension.
pub trait ServingPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn dataset_router(&self) -> Router;
}

/// Name of the built-in dataset metadata plugin.
pub const DATASET_INFO: &str = "dataset_info";

/// Look up a built-in plugin by name.
pub fn builtin_plugin(name: &str) -> Option<Box<dyn ServingPlugin>> {
    match name {
        DATASET_INFO => Some(Box::new(DatasetInfoPlugin)),
        _ => None,
    }
}

/// Dataset metadata routes: summary, info, variable keys and attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetInfoPlugin;

impl ServingPlugin for DatasetInfoPlugin {
    fn name(&self) -> &str {
        DATASET_INFO
    }

    fn dataset_router(&self) -> Router {
        Router::new()
            .route("/datasets/:dataset_id", get(summary_handler))
            .route("/datasets/:dataset_id/info", get(info_handler))
            .route("/datasets/:dataset_id/keys", get(keys_handler))
            .route("/datasets/:dataset_id/attrs", get(attrs_handler))
    }
}

/// GET /datasets/:dataset_id
#[instrument(skip(deps))]
async fn summary_handler(
    Extension(deps): Extension<DatasetDeps>,
    Path(dataset_id): Path<String>,
) -> Result<Json<Value>, ServingError> {
    let dataset = deps.dataset(dataset_id).await?;
    Ok(Json(dataset.summary()))
}

/// GET /datasets/:dataset_id/info
#[instrument(skip(deps))]
async fn info_handler(
    Extension(deps): Extension<DatasetDeps>,
    Path(dataset_id): Path<String>,
) -> Result<Json<Value>, ServingError> {
    let dataset = deps.dataset(dataset_id.clone()).await?;
    Ok(Json(json!({
        "id": dataset_id,
        "kind": dataset.source().kind(),
        "engine": dataset.engine(),
        "attrs": dataset.attrs(),
        "variables": dataset.variables(),
    })))
}

/// GET /datasets/:dataset_id/keys
async fn keys_handler(
    Extension(deps): Extension<DatasetDeps>,
    Path(dataset_id): Path<String>,
) -> Result<Json<Vec<String>>, ServingError> {
    let dataset = deps.dataset(dataset_id).await?;
    Ok(Json(dataset.variables().to_vec()))
}

/// GET /datasets/:dataset_id/attrs
async fn attrs_handler(
    Extension(deps): Extension<DatasetDeps>,
    Path(dataset_id): Path<String>,
) -> Result<Json<Value>, ServingError> {
    let dataset = deps.dataset(dataset_id).await?;
    Ok(Json(Value::Object(dataset.attrs().clone())))
}
