//! Request-time errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::CatalogError;
use serde_json::json;
use thiserror::Error;

/// Errors raised while serving a dataset request.
#[derive(Error, Debug)]
pub enum ServingError {
    /// The provider does not list the requested id.
    #[error("dataset '{0}' not found")]
    DatasetNotFound(String),

    /// Resolution failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A plugin with the same name is already registered.
    #[error("plugin '{0}' is already registered")]
    PluginConflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServingError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Validation(_)
                | CatalogError::TypeMismatch(_)
                | CatalogError::MissingDriver(_)
                | CatalogError::NoAssets(_)
                | CatalogError::UnsupportedEndpoint(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CatalogError::Storage(_) | CatalogError::Io(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PluginConflict(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServingError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Dataset request failed");
        } else {
            tracing::debug!(error = %self, "Dataset request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
