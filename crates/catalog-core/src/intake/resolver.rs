//! Opens Intake data sources as datasets.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{info, instrument};

use super::catalog::{lookup_driver, IntakeCatalog, IntakeEntry, XARRAY_CONTAINER};
use crate::dataset::Dataset;
use crate::endpoint::InfoDict;
use crate::error::{CatalogError, Result};
use crate::node::{CatalogNode, INTAKE};
use crate::traits::{DatasetResolver, ResolverImpl};

/// Resolves dataset ids against one Intake catalog node.
pub struct IntakeToDataset {
    catalog: Arc<IntakeCatalog>,
    runtime: Option<Handle>,
}

impl IntakeToDataset {
    /// Build from a catalog file path or an already-loaded node; exactly one.
    pub fn new(catalog_path: Option<&str>, catalog: Option<CatalogNode>) -> Result<Self> {
        let catalog = match (catalog_path, catalog) {
            (Some(path), None) => Arc::new(IntakeCatalog::open(path)?),
            (None, Some(node)) => node.as_intake()?.clone(),
            (Some(_), Some(_)) => {
                return Err(CatalogError::config(
                    "provide either an intake catalog path or a catalog object, not both",
                ))
            }
            (None, None) => {
                return Err(CatalogError::config(
                    "please provide a valid input to create a catalog object, \
                     i.e. a path to a .yaml file or a loaded catalog",
                ))
            }
        };
        Ok(Self {
            catalog,
            runtime: Handle::try_current().ok(),
        })
    }

    pub fn catalog(&self) -> &IntakeCatalog {
        &self.catalog
    }
}

impl DatasetResolver for IntakeToDataset {
    fn catalog_type(&self) -> &'static str {
        INTAKE
    }

    #[instrument(skip(self), fields(catalog = %self.catalog.name()))]
    fn get_dataset_from_catalog(&self, dataset_id: &str) -> Result<Dataset> {
        info!("Getting dataset {} from intake catalog {}", dataset_id, self.catalog.name());

        let source = match self.catalog.get(dataset_id) {
            Some(IntakeEntry::Source(source)) => source,
            Some(IntakeEntry::Catalog(_)) | None => {
                return Err(CatalogError::not_found(format!(
                    "{} not found in catalog {}",
                    dataset_id,
                    self.catalog.name()
                )))
            }
        };
        let info = source.describe();

        let driver = info
            .get("driver")
            .and_then(|d| d.get(0))
            .and_then(Value::as_str)
            .unwrap_or(source.driver());

        // Driver first: an uninstalled driver reports container `unknown`,
        // which must surface as a missing driver, not a type mismatch.
        let Some(installed) = lookup_driver(driver) else {
            return Err(CatalogError::MissingDriver(driver.to_string()));
        };
        if installed.container != XARRAY_CONTAINER {
            return Err(CatalogError::type_mismatch(format!(
                "{} is not readable as an array dataset, container={}",
                dataset_id, installed.container
            )));
        }

        let dataset = source.to_dataset(self.runtime.as_ref())?;
        Ok(self.write_attributes(dataset, &info))
    }

    fn write_attributes(&self, mut dataset: Dataset, info: &InfoDict) -> Dataset {
        if let Some(name) = info.get("name") {
            dataset.set_attr("name", name.clone());
        }
        if let Some(description) = info.get("description") {
            dataset.set_attr("description", description.clone());
        }
        dataset.set_attr("url_path", self.catalog.path());
        dataset
    }
}

impl ResolverImpl for IntakeToDataset {
    const CATALOG_TYPE: &'static str = INTAKE;

    fn from_catalog(catalog: CatalogNode) -> Result<Self> {
        Self::new(None, Some(catalog))
    }
}
