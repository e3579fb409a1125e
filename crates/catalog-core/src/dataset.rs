//! Opened, attribute-annotated datasets.

use std::fmt;
use std::sync::Arc;

use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde_json::{json, Map, Value};
use zarrs::group::Group;
use zarrs::node::{Node, NodeMetadata};
use zarrs_storage::ReadableListableStorage;

use crate::error::{CatalogError, Result};

/// Backing data of an opened dataset.
pub enum DatasetSource {
    /// A chunked hierarchy. Array data stays in the store until read.
    Zarr(ReadableListableStorage),
    /// A single self-describing file, addressed by byte range.
    File {
        store: Arc<dyn ObjectStore>,
        path: ObjectPath,
        size: u64,
    },
}

impl DatasetSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Zarr(_) => "zarr",
            Self::File { .. } => "file",
        }
    }
}

impl fmt::Debug for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zarr(_) => f.write_str("Zarr"),
            Self::File { path, size, .. } => f
                .debug_struct("File")
                .field("path", path)
                .field("size", size)
                .finish(),
        }
    }
}

/// A dataset opened from a catalog entry.
#[derive(Debug)]
pub struct Dataset {
    location: String,
    attrs: Map<String, Value>,
    variables: Vec<String>,
    open_kwargs: Map<String, Value>,
    source: DatasetSource,
}

impl Dataset {
    pub fn new(
        location: impl Into<String>,
        source: DatasetSource,
        variables: Vec<String>,
        open_kwargs: Map<String, Value>,
    ) -> Self {
        Self {
            location: location.into(),
            attrs: Map::new(),
            variables,
            open_kwargs,
            source,
        }
    }

    /// Open the root group of a Zarr hierarchy and list its arrays.
    ///
    /// Group attributes become the dataset's initial attributes.
    pub fn open_zarr(
        location: &str,
        storage: ReadableListableStorage,
        open_kwargs: Map<String, Value>,
    ) -> Result<Self> {
        let group = Group::open(storage.clone(), "/").map_err(|e| {
            CatalogError::storage(format!("failed to open zarr group at {}: {}", location, e))
        })?;
        let attrs = group.attributes().clone();

        let node = Node::open(&storage, "/").map_err(|e| {
            CatalogError::storage(format!("failed to list zarr hierarchy at {}: {}", location, e))
        })?;
        let variables = node
            .children()
            .iter()
            .filter(|child| matches!(child.metadata(), NodeMetadata::Array(_)))
            .map(|child| child.path().as_str().trim_start_matches('/').to_string())
            .collect();

        let mut dataset = Self::new(location, DatasetSource::Zarr(storage), variables, open_kwargs);
        dataset.attrs = attrs;
        Ok(dataset)
    }

    /// Location the dataset was opened from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Names of the arrays in the dataset.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn open_kwargs(&self) -> &Map<String, Value> {
        &self.open_kwargs
    }

    pub fn engine(&self) -> Option<&str> {
        self.open_kwargs.get("engine").and_then(|v| v.as_str())
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    /// JSON summary: attributes, variables and backing kind.
    pub fn summary(&self) -> Value {
        let mut summary = json!({
            "location": self.location,
            "kind": self.source.kind(),
            "attrs": self.attrs,
            "variables": self.variables,
        });
        if let DatasetSource::File { size, .. } = &self.source {
            summary["size"] = json!(size);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_dataset() -> Dataset {
        Dataset::new(
            "/data/a.nc",
            DatasetSource::File {
                store: Arc::new(object_store::memory::InMemory::new()),
                path: ObjectPath::from("a.nc"),
                size: 12,
            },
            vec![],
            Map::new(),
        )
    }

    #[test]
    fn test_attrs_roundtrip() {
        let mut ds = file_dataset();
        ds.set_attr("name", "prism");
        assert_eq!(ds.attr("name"), Some(&json!("prism")));
        assert!(ds.engine().is_none());
    }

    #[test]
    fn test_summary_includes_size_for_files() {
        let ds = file_dataset();
        let summary = ds.summary();
        assert_eq!(summary["kind"], "file");
        assert_eq!(summary["size"], 12);
        assert_eq!(summary["location"], "/data/a.nc");
    }
}
