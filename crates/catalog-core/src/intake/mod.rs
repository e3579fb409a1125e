//! Hierarchical YAML (Intake) catalogs.

mod catalog;
mod resolver;
mod searcher;

pub use catalog::{lookup_driver, Driver, IntakeCatalog, IntakeEntry, IntakeSource, CATALOG_DRIVERS};
pub use resolver::IntakeToDataset;
pub use searcher::{IntakeCatalogSearch, INTAKE_SUFFIX};
