//! Dataset provider seam between the serving app and catalog resolution.

use std::sync::Arc;

use catalog_core::{CatalogError, Dataset};

use crate::error::ServingError;

/// Supplies the datasets a serving app exposes.
pub trait DatasetProvider: Send + Sync + 'static {
    /// Ids of every dataset this provider serves.
    fn get_datasets(&self) -> Vec<String>;

    /// Open one dataset. `Ok(None)` when the id is not served.
    ///
    /// May block on IO; callers run it off the async executor.
    fn get_dataset(&self, dataset_id: &str) -> Result<Option<Dataset>, CatalogError>;
}

/// Provider handle shared by every route of a serving app.
#[derive(Clone)]
pub struct DatasetDeps {
    provider: Arc<dyn DatasetProvider>,
}

impl DatasetDeps {
    pub fn new(provider: Arc<dyn DatasetProvider>) -> Self {
        Self { provider }
    }

    pub fn dataset_ids(&self) -> Vec<String> {
        self.provider.get_datasets()
    }

    /// Open `dataset_id` on the blocking pool.
    pub async fn dataset(&self, dataset_id: String) -> Result<Dataset, ServingError> {
        let provider = self.provider.clone();
        let id = dataset_id.clone();
        let opened = tokio::task::spawn_blocking(move || provider.get_dataset(&id))
            .await
            .map_err(|e| ServingError::Internal(format!("dataset loader panicked: {}", e)))??;
        opened.ok_or(ServingError::DatasetNotFound(dataset_id))
    }
}
