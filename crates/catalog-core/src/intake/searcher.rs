//! Intake catalog searcher.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::catalog::{IntakeCatalog, IntakeEntry};
use crate::endpoint::{CatalogEndpoint, DatasetEntries};
use crate::error::{CatalogError, Result};
use crate::node::{CatalogNode, CatalogSource, INTAKE};
use crate::traits::{default_suffixes, CatalogSearcher, SearcherImpl};

/// Required suffix of an Intake catalog file.
pub const INTAKE_SUFFIX: &str = ".yaml";

/// Flattens an Intake YAML catalog tree.
pub struct IntakeCatalogSearch {
    raw_path: String,
    suffixes: Vec<String>,
    root: OnceCell<CatalogNode>,
}

impl IntakeCatalogSearch {
    pub fn new(catalog_path: impl Into<String>) -> Self {
        Self {
            raw_path: catalog_path.into(),
            suffixes: default_suffixes(),
            root: OnceCell::new(),
        }
    }

    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    fn walk(
        &self,
        catalog: &Arc<IntakeCatalog>,
        parent_path: &str,
        acc: &mut Vec<CatalogEndpoint>,
    ) {
        let mut datasets = DatasetEntries::new();
        let mut sub_catalogs = Vec::new();

        for (child_name, child) in catalog.entries() {
            match child {
                IntakeEntry::Catalog(sub) => {
                    let path = format!("{}/{}", parent_path, child_name);
                    self.walk(sub, &path, acc);
                    sub_catalogs.push(child_name.to_string());
                }
                IntakeEntry::Source(source) => {
                    datasets.push(child_name, source.describe());
                }
            }
        }

        debug!(
            catalog = %catalog.name(),
            path = %parent_path,
            datasets = datasets.len(),
            sub_catalogs = sub_catalogs.len(),
            "Parsed intake catalog node"
        );
        acc.push(CatalogEndpoint::new(
            CatalogNode::Intake(catalog.clone()),
            parent_path,
            datasets,
            sub_catalogs,
        ));
    }
}

#[async_trait]
impl CatalogSearcher for IntakeCatalogSearch {
    fn catalog_type(&self) -> &'static str {
        INTAKE
    }

    fn catalog_path(&self) -> Result<CatalogSource> {
        let source = CatalogSource::parse(&self.raw_path);
        if source.is_remote() {
            return Err(CatalogError::config(format!(
                "please provide a valid intake catalog {} file path, remote catalogs are not supported: {}",
                INTAKE_SUFFIX, self.raw_path
            )));
        }
        source.validate(INTAKE_SUFFIX, &format!("intake catalog {}", INTAKE_SUFFIX))?;
        Ok(source)
    }

    fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    async fn catalog_object(&self) -> Result<CatalogNode> {
        let node = self
            .root
            .get_or_try_init(|| async {
                let CatalogSource::Local(path) = self.catalog_path()? else {
                    return Err(CatalogError::config("intake catalogs must be local files"));
                };
                info!(path = %path.display(), "Loading intake catalog");
                let catalog = tokio::task::spawn_blocking(move || IntakeCatalog::open(path))
                    .await
                    .map_err(|e| CatalogError::config(format!("catalog loader failed: {}", e)))??;
                Ok::<_, CatalogError>(CatalogNode::from(catalog))
            })
            .await?;
        Ok(node.clone())
    }

    fn parse_catalog(&self, root: &CatalogNode) -> Result<Vec<CatalogEndpoint>> {
        let catalog = root.as_intake()?;
        let mut acc = Vec::new();
        self.walk(catalog, "", &mut acc);
        Ok(acc)
    }
}

impl SearcherImpl for IntakeCatalogSearch {
    const CATALOG_TYPE: &'static str = INTAKE;

    fn from_path(catalog_path: &str) -> Self {
        Self::new(catalog_path)
    }
}
