//! Introspection for hierarchical YAML catalogs.

use catalog_core::{CatalogEndpoint, Result, INTAKE};
use serde_json::Value;

use super::{CatalogRouter, RouterImpl};

#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeRouter;

impl CatalogRouter for IntakeRouter {
    fn catalog_type(&self) -> &'static str {
        INTAKE
    }

    fn catalog_as_yaml(&self, endpoint: &CatalogEndpoint) -> Result<String> {
        endpoint.catalog().as_intake()?.yaml()
    }

    fn catalog_as_json(&self, endpoint: &CatalogEndpoint) -> Result<Value> {
        Ok(endpoint.catalog().as_intake()?.to_dict())
    }
}

impl RouterImpl for IntakeRouter {
    const CATALOG_TYPE: &'static str = INTAKE;
}
