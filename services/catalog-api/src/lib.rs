//! Catalog API Service Library
//!
//! Turns an Intake or STAC catalog into a tree of HTTP endpoints: one set
//! of introspection routes per catalog node, plus a dataset-serving
//! sub-application for every node that lists datasets.

pub mod app;
pub mod config;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod routers;

pub use app::{assemble, create_app, ROOT_PROVIDER_NAME};
pub use config::{validate_arguments, AppComponents, LogFormat, LoggingConfig, ServerConfig};
pub use provider::CatalogDatasetProvider;
pub use registry::{CatalogImplementation, ImplementationRegistry};
pub use routers::{build_catalog_router, CatalogRouter, IntakeRouter, RouterImpl, StacRouter};
