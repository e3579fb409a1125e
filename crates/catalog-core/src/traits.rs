//! Role traits bound together per catalog format.

use async_trait::async_trait;

use crate::dataset::Dataset;
use crate::endpoint::{CatalogEndpoint, InfoDict};
use crate::error::Result;
use crate::node::{CatalogNode, CatalogSource};

/// Data-file extensions counted as array-readable when none are configured.
pub const DEFAULT_SUFFIXES: &[&str] = &[".nc", ".zarr"];

pub fn default_suffixes() -> Vec<String> {
    DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

/// Walks a format's native catalog graph into a flat list of endpoints.
///
/// Construction never fails. The catalog source is validated when
/// `catalog_path` or `catalog_object` is first touched.
#[async_trait]
pub trait CatalogSearcher: Send + Sync {
    /// Format key this searcher handles.
    fn catalog_type(&self) -> &'static str;

    /// Validated location of the catalog document.
    fn catalog_path(&self) -> Result<CatalogSource>;

    /// Extensions of data files recognised as array-readable.
    fn suffixes(&self) -> &[String];

    /// Root native catalog node, loaded on first call and memoized.
    async fn catalog_object(&self) -> Result<CatalogNode>;

    /// Flatten the tree rooted at `root`.
    ///
    /// Every node's endpoint follows the endpoints of all its descendants;
    /// the root's endpoint is last and has path `/`.
    fn parse_catalog(&self, root: &CatalogNode) -> Result<Vec<CatalogEndpoint>>;

    /// Load the root node and flatten it.
    async fn parse(&self) -> Result<Vec<CatalogEndpoint>> {
        let root = self.catalog_object().await?;
        self.parse_catalog(&root)
    }
}

/// Opens one named dataset of a native catalog node.
///
/// Resolution is synchronous and may block on remote IO. Nothing is cached:
/// every call re-opens the dataset.
pub trait DatasetResolver: Send + Sync {
    fn catalog_type(&self) -> &'static str;

    /// Locate, validate and open `dataset_id`.
    fn get_dataset_from_catalog(&self, dataset_id: &str) -> Result<Dataset>;

    /// Copy catalog-level attributes onto an opened dataset.
    fn write_attributes(&self, dataset: Dataset, info: &InfoDict) -> Dataset;
}

/// A searcher that can be registered for a format key.
pub trait SearcherImpl: CatalogSearcher + Sized + 'static {
    const CATALOG_TYPE: &'static str;

    fn from_path(catalog_path: &str) -> Self;
}

/// A resolver that can be registered for a format key.
pub trait ResolverImpl: DatasetResolver + Sized + 'static {
    const CATALOG_TYPE: &'static str;

    fn from_catalog(catalog: CatalogNode) -> Result<Self>;
}
