//! STAC catalog searcher.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::model::{StacAsset, StacKind, StacNode};
use super::reader::StacReader;
use crate::endpoint::{CatalogEndpoint, DatasetEntries};
use crate::error::{CatalogError, Result};
use crate::node::{CatalogNode, CatalogSource, STAC};
use crate::traits::{default_suffixes, CatalogSearcher, SearcherImpl};

/// Required suffix of a STAC catalog document.
pub const STAC_SUFFIX: &str = ".json";

/// Flattens a STAC catalog tree read from a local file or a URL.
pub struct StacCatalogSearch {
    raw_path: String,
    suffixes: Vec<String>,
    reader: StacReader,
    root: OnceCell<CatalogNode>,
}

impl StacCatalogSearch {
    pub fn new(catalog_path: impl Into<String>) -> Self {
        Self {
            raw_path: catalog_path.into(),
            suffixes: default_suffixes(),
            reader: StacReader::new(),
            root: OnceCell::new(),
        }
    }

    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    fn is_array_readable(&self, asset: &StacAsset) -> bool {
        let href = asset.href().trim_end_matches('/');
        self.suffixes.iter().any(|suffix| href.ends_with(suffix.as_str()))
    }

    fn walk(&self, node: &Arc<StacNode>, parent_path: &str, acc: &mut Vec<CatalogEndpoint>) {
        let mut datasets = DatasetEntries::new();
        let mut sub_catalogs = Vec::new();
        let mut seen = HashSet::new();

        for child in node.children() {
            if child.kind() == StacKind::Item {
                continue;
            }
            // Sibling ids become mount paths and must be unique.
            if !seen.insert(child.id()) {
                warn!(
                    parent = %node.id(),
                    child = %child.id(),
                    href = %child.self_href(),
                    "Duplicate child catalog id, keeping the first entry"
                );
                continue;
            }
            let path = format!("{}/{}", parent_path, child.id());
            self.walk(child, &path, acc);
            sub_catalogs.push(child.id().to_string());
        }

        match node.kind() {
            StacKind::Collection => {
                for (name, asset) in node.assets() {
                    if self.is_array_readable(asset) {
                        datasets.push(name.as_str(), asset.to_dict().clone());
                    }
                }
            }
            StacKind::Catalog => {
                for item in node.items() {
                    let asset = match item.assets() {
                        [] => {
                            let err = CatalogError::NoAssets(item.id().to_string());
                            warn!(item = %item.id(), error = %err, "Skipping item");
                            continue;
                        }
                        [(_, asset)] => asset,
                        [(first, asset), ..] => {
                            warn!(
                                item = %item.id(),
                                "More than one asset found, using the first asset named {}",
                                first
                            );
                            asset
                        }
                    };
                    if self.is_array_readable(asset) {
                        datasets.push(item.id(), asset.to_dict().clone());
                    }
                }
            }
            StacKind::Item => {}
        }

        debug!(
            id = %node.id(),
            path = %parent_path,
            datasets = datasets.len(),
            sub_catalogs = sub_catalogs.len(),
            "Parsed STAC node"
        );
        acc.push(CatalogEndpoint::new(
            CatalogNode::Stac(node.clone()),
            parent_path,
            datasets,
            sub_catalogs,
        ));
    }
}

#[async_trait]
impl CatalogSearcher for StacCatalogSearch {
    fn catalog_type(&self) -> &'static str {
        STAC
    }

    fn catalog_path(&self) -> Result<CatalogSource> {
        let source = CatalogSource::parse(&self.raw_path);
        source.validate(STAC_SUFFIX, &format!("STAC catalog {} file path or URL", STAC_SUFFIX))?;
        Ok(source)
    }

    fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    async fn catalog_object(&self) -> Result<CatalogNode> {
        let node = self
            .root
            .get_or_try_init(|| async {
                let location = self.catalog_path()?.to_string();
                info!(location = %location, "Loading STAC catalog");
                let node = self.reader.read_catalog(&location).await?;
                Ok::<_, CatalogError>(CatalogNode::from(node))
            })
            .await?;
        Ok(node.clone())
    }

    fn parse_catalog(&self, root: &CatalogNode) -> Result<Vec<CatalogEndpoint>> {
        let node = root.as_stac()?;
        let mut acc = Vec::new();
        self.walk(node, "", &mut acc);
        Ok(acc)
    }
}

impl SearcherImpl for StacCatalogSearch {
    const CATALOG_TYPE: &'static str = STAC;

    fn from_path(catalog_path: &str) -> Self {
        Self::new(catalog_path)
    }
}
