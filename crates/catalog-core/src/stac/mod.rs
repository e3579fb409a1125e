//! JSON spatiotemporal asset catalogs (STAC).

mod model;
mod reader;
mod resolver;
mod searcher;

pub use model::{StacAsset, StacItem, StacKind, StacNode};
pub use reader::{resolve_href, StacReader};
pub use resolver::{StacToDataset, OPEN_KWARGS_KEY, STORAGE_OPTIONS_KEY};
pub use searcher::{StacCatalogSearch, STAC_SUFFIX};
