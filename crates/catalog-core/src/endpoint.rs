//! The flattened view of one catalog-tree node.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::node::CatalogNode;

/// Format-native descriptor of one dataset (driver, engine, storage metadata).
pub type InfoDict = Map<String, Value>;

/// Path of the root node.
pub const ROOT_PATH: &str = "/";

/// One node of a flattened catalog tree.
///
/// Built once by a searcher and never mutated afterwards. `contains_datasets`
/// is derived from `dataset_ids` and cannot be set independently.
#[derive(Debug, Clone)]
pub struct CatalogEndpoint {
    catalog: CatalogNode,
    catalog_path: String,
    dataset_ids: Vec<String>,
    sub_catalogs: Vec<String>,
    dataset_info_dicts: HashMap<String, InfoDict>,
}

impl CatalogEndpoint {
    /// Create an endpoint. An empty `catalog_path` is the root and becomes `"/"`.
    pub fn new(
        catalog: CatalogNode,
        catalog_path: impl Into<String>,
        datasets: DatasetEntries,
        sub_catalogs: Vec<String>,
    ) -> Self {
        let mut catalog_path = catalog_path.into();
        if catalog_path.is_empty() {
            catalog_path = ROOT_PATH.to_string();
        }
        let DatasetEntries { ids, info } = datasets;

        Self {
            catalog,
            catalog_path,
            dataset_ids: ids,
            sub_catalogs,
            dataset_info_dicts: info,
        }
    }

    /// Native catalog node this endpoint was produced for.
    pub fn catalog(&self) -> &CatalogNode {
        &self.catalog
    }

    /// `/`-delimited position from the tree root.
    pub fn catalog_path(&self) -> &str {
        &self.catalog_path
    }

    pub fn dataset_ids(&self) -> &[String] {
        &self.dataset_ids
    }

    /// Names (not paths) of the direct child catalogs.
    pub fn sub_catalogs(&self) -> &[String] {
        &self.sub_catalogs
    }

    pub fn dataset_info_dicts(&self) -> &HashMap<String, InfoDict> {
        &self.dataset_info_dicts
    }

    pub fn dataset_info(&self, dataset_id: &str) -> Option<&InfoDict> {
        self.dataset_info_dicts.get(dataset_id)
    }

    pub fn contains_datasets(&self) -> bool {
        !self.dataset_ids.is_empty()
    }

    pub fn contains_dataset(&self, dataset_id: &str) -> bool {
        self.dataset_ids.iter().any(|id| id == dataset_id)
    }

    pub fn is_root(&self) -> bool {
        self.catalog_path == ROOT_PATH
    }

    /// Mount prefix for this node: the root maps to the empty string.
    pub fn mount_prefix(&self) -> &str {
        if self.is_root() {
            ""
        } else {
            &self.catalog_path
        }
    }

    /// Parent directory prefix, or `None` for the root.
    ///
    /// `/a/b` yields `/a/`, `/a` yields `/`.
    pub fn parent_path(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        let cut = self.catalog_path.rfind('/').map(|i| i + 1).unwrap_or(0);
        Some(&self.catalog_path[..cut])
    }
}

/// Ordered dataset ids with their descriptors, kept in lockstep.
#[derive(Debug, Clone, Default)]
pub struct DatasetEntries {
    ids: Vec<String>,
    info: HashMap<String, InfoDict>,
}

impl DatasetEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset. Returns false (and keeps the first) when the id is taken.
    pub fn push(&mut self, dataset_id: impl Into<String>, info: InfoDict) -> bool {
        let dataset_id = dataset_id.into();
        if self.info.contains_key(&dataset_id) {
            tracing::warn!(
                dataset_id = %dataset_id,
                "Duplicate dataset id in catalog node, keeping the first entry"
            );
            return false;
        }
        self.info.insert(dataset_id.clone(), info);
        self.ids.push(dataset_id);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
