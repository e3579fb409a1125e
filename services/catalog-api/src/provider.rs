//! Dataset provider backed by one catalog endpoint and its resolver.

use std::sync::Arc;

use array_server::DatasetProvider;
use catalog_core::{CatalogEndpoint, CatalogError, Dataset, DatasetResolver};
use tracing::{debug, instrument};

/// Serves the datasets listed by one endpoint.
pub struct CatalogDatasetProvider {
    endpoint: Arc<CatalogEndpoint>,
    resolver: Arc<dyn DatasetResolver>,
}

impl CatalogDatasetProvider {
    pub fn new(endpoint: Arc<CatalogEndpoint>, resolver: Arc<dyn DatasetResolver>) -> Self {
        Self { endpoint, resolver }
    }
}

impl DatasetProvider for CatalogDatasetProvider {
    fn get_datasets(&self) -> Vec<String> {
        self.endpoint.dataset_ids().to_vec()
    }

    #[instrument(skip(self), fields(catalog_path = %self.endpoint.catalog_path()))]
    fn get_dataset(&self, dataset_id: &str) -> Result<Option<Dataset>, CatalogError> {
        if !self.endpoint.contains_dataset(dataset_id) {
            debug!("Dataset id not listed by endpoint");
            return Ok(None);
        }
        match self.resolver.get_dataset_from_catalog(dataset_id) {
            Ok(dataset) => Ok(Some(dataset)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
