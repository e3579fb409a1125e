//! Opens STAC assets as datasets.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{info, instrument, warn};

use super::model::{StacAsset, StacKind, StacNode};
use super::reader::StacReader;
use crate::dataset::Dataset;
use crate::endpoint::InfoDict;
use crate::error::{CatalogError, Result};
use crate::node::{CatalogNode, STAC};
use crate::storage;
use crate::traits::{DatasetResolver, ResolverImpl};

/// Asset field holding the filesystem options.
pub const STORAGE_OPTIONS_KEY: &str = "xarray:storage_options";

/// Asset field holding the dataset open arguments.
pub const OPEN_KWARGS_KEY: &str = "xarray:open_kwargs";

/// Resolves dataset ids against one STAC catalog or collection.
pub struct StacToDataset {
    node: Arc<StacNode>,
    runtime: Option<Handle>,
}

impl StacToDataset {
    /// Build from a document path/URL or an already-loaded node; exactly one.
    pub async fn new(catalog_path: Option<&str>, catalog: Option<CatalogNode>) -> Result<Self> {
        let node = match (catalog_path, catalog) {
            (Some(path), None) => Arc::new(StacReader::new().read_catalog(path).await?),
            (None, Some(node)) => node.as_stac()?.clone(),
            (Some(_), Some(_)) => {
                return Err(CatalogError::config(
                    "provide either a STAC document path or a catalog object, not both",
                ))
            }
            (None, None) => {
                return Err(CatalogError::config(
                    "please provide a valid input to create a catalog object, \
                     i.e. a path or URL to a .json file",
                ))
            }
        };
        Self::from_node(node)
    }

    fn from_node(node: Arc<StacNode>) -> Result<Self> {
        if node.kind() == StacKind::Item {
            return Err(CatalogError::type_mismatch(
                "the catalog must be a STAC collection or catalog",
            ));
        }
        Ok(Self {
            node,
            runtime: Handle::try_current().ok(),
        })
    }

    pub fn node(&self) -> &StacNode {
        &self.node
    }

    /// The asset a dataset id names.
    ///
    /// Collections are looked up by asset key; catalogs by item id, taking the
    /// item's first asset.
    fn get_asset(&self, dataset_id: &str) -> Result<&StacAsset> {
        let not_found = || {
            CatalogError::not_found(format!(
                "{} not found in collection/catalog {}, please check the dataset name",
                dataset_id,
                self.node.id()
            ))
        };

        if self.node.kind() == StacKind::Collection {
            return self.node.get_asset(dataset_id).ok_or_else(not_found);
        }

        let item = self.node.get_item(dataset_id).ok_or_else(not_found)?;
        match item.assets() {
            [] => Err(CatalogError::NoAssets(dataset_id.to_string())),
            [(_, asset)] => Ok(asset),
            [(first, asset), ..] => {
                warn!(
                    "More than one asset found in {}, using the first asset named {}",
                    dataset_id, first
                );
                Ok(asset)
            }
        }
    }
}

impl DatasetResolver for StacToDataset {
    fn catalog_type(&self) -> &'static str {
        STAC
    }

    #[instrument(skip(self), fields(node = %self.node.id()))]
    fn get_dataset_from_catalog(&self, dataset_id: &str) -> Result<Dataset> {
        info!(
            "Getting dataset {} from STAC {}",
            dataset_id,
            self.node.kind().as_str()
        );
        let asset = self.get_asset(dataset_id)?;
        let info = asset.to_dict();

        for key in [OPEN_KWARGS_KEY, STORAGE_OPTIONS_KEY] {
            if !info.contains_key(key) {
                return Err(CatalogError::validation(format!(
                    "{} is missing the {} info",
                    dataset_id, key
                )));
            }
        }
        let Some(Value::Object(open_kwargs)) = info.get(OPEN_KWARGS_KEY) else {
            return Err(CatalogError::validation(format!(
                "{} of {} must be a mapping",
                OPEN_KWARGS_KEY, dataset_id
            )));
        };
        let storage_options = info.get(STORAGE_OPTIONS_KEY).filter(|v| !v.is_null());

        let dataset = storage::open_dataset(
            asset.href(),
            storage_options,
            open_kwargs,
            self.runtime.as_ref(),
        )?;
        let mut dataset = self.write_attributes(dataset, info);
        dataset.set_attr("url_path", asset.href());
        Ok(dataset)
    }

    fn write_attributes(&self, mut dataset: Dataset, _info: &InfoDict) -> Dataset {
        let dict = self.node.to_dict();
        if let Some(id) = dict.get("id") {
            dataset.set_attr("name", id.clone());
        }
        if let Some(description) = dict.get("description") {
            dataset.set_attr("description", description.clone());
        }
        dataset.set_attr("stac_collection", self.node.self_href());
        dataset
    }
}

impl ResolverImpl for StacToDataset {
    const CATALOG_TYPE: &'static str = STAC;

    fn from_catalog(catalog: CatalogNode) -> Result<Self> {
        Self::from_node(catalog.as_stac()?.clone())
    }
}
