//! Error types for catalog traversal and dataset resolution.

use thiserror::Error;

/// Errors that can occur while loading catalogs or resolving datasets.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Bad or missing catalog source, wrong suffix, unknown format key.
    #[error("configuration error: {0}")]
    Config(String),

    /// A dataset id or format key that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A catalog entry exists but is not readable as an array dataset.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The driver an entry declares is not installed.
    #[error("missing dependency: driver '{0}' is not installed")]
    MissingDriver(String),

    /// Required open/storage metadata is absent from a descriptor.
    #[error("validation error: {0}")]
    Validation(String),

    /// A STAC item without any asset.
    #[error("no assets found in {0}")]
    NoAssets(String),

    /// The asset location uses a scheme no backend is known for.
    #[error("endpoint type '{0}' not supported, use s3, https, or a local path")]
    UnsupportedEndpoint(String),

    /// A format that lacks one of searcher, resolver or router.
    #[error("partial implementation: {0}")]
    PartialImplementation(String),

    /// The implementation registry is empty.
    #[error("no catalog implementations have been registered")]
    NoImplementations,

    /// Catalog document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Storage backend or array store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Local IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a TypeMismatch error.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create a Validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a Parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for errors scoped to one lookup (unknown id or key).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<object_store::Error> for CatalogError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => {
                Self::NotFound(format!("object {} does not exist", path))
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
