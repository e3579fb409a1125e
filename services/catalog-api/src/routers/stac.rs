//! Introspection for STAC catalogs and collections.

use catalog_core::{CatalogEndpoint, Result, STAC};
use serde_json::Value;

use super::{CatalogRouter, RouterImpl};

#[derive(Debug, Clone, Copy, Default)]
pub struct StacRouter;

impl CatalogRouter for StacRouter {
    fn catalog_type(&self) -> &'static str {
        STAC
    }

    fn catalog_as_yaml(&self, endpoint: &CatalogEndpoint) -> Result<String> {
        let dict = endpoint.catalog().as_stac()?.to_dict();
        Ok(serde_yaml::to_string(&dict)?)
    }

    fn catalog_as_json(&self, endpoint: &CatalogEndpoint) -> Result<Value> {
        Ok(endpoint.catalog().as_stac()?.to_dict())
    }
}

impl RouterImpl for StacRouter {
    const CATALOG_TYPE: &'static str = STAC;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routers::IntakeRouter;
    use catalog_core::stac::{StacKind, StacNode};
    use catalog_core::{CatalogNode, DatasetEntries, IntakeCatalog};

    #[test]
    fn test_rejects_intake_node() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.yaml");
        std::fs::write(&path, "sources: {}\n").unwrap();
        let node = CatalogNode::from(IntakeCatalog::open(&path).unwrap());
        let ep = CatalogEndpoint::new(node, "/", DatasetEntries::new(), vec![]);
        assert!(StacRouter.catalog_as_json(&ep).is_err());
        assert!(IntakeRouter.catalog_as_yaml(&ep).is_ok());
    }

    #[test]
    fn test_yaml_dump() {
        let node = CatalogNode::from(StacNode::empty(StacKind::Catalog, "root", "/tmp/catalog.json"));
        let ep = CatalogEndpoint::new(node, "/", DatasetEntries::new(), vec![]);
        let yaml = StacRouter.catalog_as_yaml(&ep).unwrap();
        let back: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, StacRouter.catalog_as_json(&ep).unwrap());
    }
}
