//! Format-tagged handle to a native catalog node.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::intake::IntakeCatalog;
use crate::stac::StacNode;

/// Format key of the hierarchical YAML catalog format.
pub const INTAKE: &str = "intake";

/// Format key of the JSON spatiotemporal asset catalog format.
pub const STAC: &str = "stac";

/// A native catalog node: an Intake catalog or a STAC catalog/collection.
///
/// Cloning is cheap; the node itself is shared read-only.
#[derive(Debug, Clone)]
pub enum CatalogNode {
    Intake(Arc<IntakeCatalog>),
    Stac(Arc<StacNode>),
}

impl CatalogNode {
    /// Format key of the variant.
    pub fn catalog_type(&self) -> &'static str {
        match self {
            Self::Intake(_) => INTAKE,
            Self::Stac(_) => STAC,
        }
    }

    /// Catalog name (Intake) or id (STAC).
    pub fn name(&self) -> &str {
        match self {
            Self::Intake(cat) => cat.name(),
            Self::Stac(node) => node.id(),
        }
    }

    /// Where the node was read from.
    pub fn location(&self) -> &str {
        match self {
            Self::Intake(cat) => cat.path(),
            Self::Stac(node) => node.self_href(),
        }
    }

    /// Dictionary export of the node, used by the JSON and YAML routes.
    pub fn to_dict(&self) -> Value {
        match self {
            Self::Intake(cat) => cat.to_dict(),
            Self::Stac(node) => node.to_dict(),
        }
    }

    pub fn as_intake(&self) -> Result<&Arc<IntakeCatalog>> {
        match self {
            Self::Intake(cat) => Ok(cat),
            other => Err(CatalogError::type_mismatch(format!(
                "expected an intake catalog, got a {} catalog",
                other.catalog_type()
            ))),
        }
    }

    pub fn as_stac(&self) -> Result<&Arc<StacNode>> {
        match self {
            Self::Stac(node) => Ok(node),
            other => Err(CatalogError::type_mismatch(format!(
                "expected a stac catalog or collection, got a {} catalog",
                other.catalog_type()
            ))),
        }
    }
}

impl From<IntakeCatalog> for CatalogNode {
    fn from(cat: IntakeCatalog) -> Self {
        Self::Intake(Arc::new(cat))
    }
}

impl From<StacNode> for CatalogNode {
    fn from(node: StacNode) -> Self {
        Self::Stac(Arc::new(node))
    }
}

/// Location of a catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Local(PathBuf),
    Remote(String),
}

impl CatalogSource {
    /// Classify a user-supplied path or URL.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Remote(raw.to_string())
        } else if let Some(stripped) = raw.strip_prefix("file://") {
            Self::Local(PathBuf::from(stripped))
        } else {
            Self::Local(PathBuf::from(raw))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Extension including the leading dot, or an empty string.
    pub fn suffix(&self) -> String {
        let path = match self {
            Self::Local(path) => path.clone(),
            Self::Remote(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                PathBuf::from(without_query)
            }
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }

    /// File stem, used as the catalog display name.
    pub fn stem(&self) -> String {
        let name = match self {
            Self::Local(path) => path.file_stem().and_then(|s| s.to_str()).map(String::from),
            Self::Remote(url) => Path::new(url.split(['?', '#']).next().unwrap_or(url))
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from),
        };
        name.unwrap_or_default()
    }

    /// Check the suffix and, for local sources, existence.
    pub fn validate(&self, required_suffix: &str, what: &str) -> Result<()> {
        if let Self::Local(path) = self {
            if !path.exists() {
                return Err(CatalogError::config(format!(
                    "please provide a valid {} path, could not find {}",
                    what,
                    path.display()
                )));
            }
        }
        let suffix = self.suffix();
        if suffix != required_suffix {
            return Err(CatalogError::config(format!(
                "please provide a valid {} path, file suffix must be {}, not '{}'",
                what, required_suffix, suffix
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}
