//! Catalog traversal and dataset resolution.
//!
//! Intake YAML catalogs and STAC JSON catalogs are flattened into
//! [`CatalogEndpoint`] records, one per catalog-tree node. Each format pairs a
//! [`CatalogSearcher`] with a [`DatasetResolver`] that opens the datasets a
//! node lists.

pub mod dataset;
pub mod endpoint;
pub mod error;
pub mod intake;
pub mod node;
pub mod stac;
pub mod storage;
pub mod traits;

pub use dataset::{Dataset, DatasetSource};
pub use endpoint::{CatalogEndpoint, DatasetEntries, InfoDict, ROOT_PATH};
pub use error::{CatalogError, Result};
pub use intake::{IntakeCatalog, IntakeCatalogSearch, IntakeToDataset};
pub use node::{CatalogNode, CatalogSource, INTAKE, STAC};
pub use stac::{StacCatalogSearch, StacNode, StacToDataset};
pub use storage::StorageBackend;
pub use traits::{CatalogSearcher, DatasetResolver, ResolverImpl, SearcherImpl};
