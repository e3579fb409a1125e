//! Integration test: resolve catalog entries into opened datasets.

use catalog_core::{
    CatalogEndpoint, CatalogError, CatalogSearcher, DatasetResolver, DatasetSource,
    IntakeCatalogSearch, IntakeToDataset, ResolverImpl, StacCatalogSearch, StacToDataset,
};
use test_utils::{intake_local_catalog, stac_tree};

fn sorted(vars: &[String]) -> Vec<String> {
    let mut vars = vars.to_vec();
    vars.sort();
    vars
}

async fn stac_endpoint(root: &str, path: &str) -> CatalogEndpoint {
    StacCatalogSearch::new(root)
        .parse()
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.catalog_path() == path)
        .unwrap()
}

#[test]
fn test_intake_zarr_source() {
    let fixture = intake_local_catalog();
    let resolver = IntakeToDataset::new(Some(&fixture.root_str()), None).unwrap();

    let ds = resolver.get_dataset_from_catalog("tiny").unwrap();
    assert_eq!(sorted(ds.variables()), ["precip", "temp"]);
    assert_eq!(ds.attr("title").unwrap(), "tiny");
    assert_eq!(ds.attr("name").unwrap(), "tiny");
    assert_eq!(ds.attr("description").unwrap(), "A tiny zarr store");
    assert_eq!(ds.attr("url_path").unwrap(), fixture.root_str().as_str());
    assert!(matches!(ds.source(), DatasetSource::Zarr(_)));
}

#[test]
fn test_intake_resolution_errors() {
    let fixture = intake_local_catalog();
    let resolver = IntakeToDataset::new(Some(&fixture.root_str()), None).unwrap();

    let err = resolver.get_dataset_from_catalog("missing").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("missing"));

    let err = resolver.get_dataset_from_catalog("table").unwrap_err();
    assert!(matches!(err, CatalogError::TypeMismatch(_)));
    assert!(err.to_string().contains("dataframe"));

    let err = resolver.get_dataset_from_catalog("raster").unwrap_err();
    assert!(matches!(err, CatalogError::MissingDriver(ref d) if d == "rasterio"));
}

#[test]
fn test_resolver_requires_exactly_one_input() {
    assert!(matches!(
        IntakeToDataset::new(None, None),
        Err(CatalogError::Config(_))
    ));
}

#[test]
fn test_intake_resolution_is_idempotent() {
    let fixture = intake_local_catalog();
    let resolver = IntakeToDataset::new(Some(&fixture.root_str()), None).unwrap();

    let first = resolver.get_dataset_from_catalog("tiny").unwrap();
    let second = resolver.get_dataset_from_catalog("tiny").unwrap();
    assert_eq!(first.attrs(), second.attrs());
    assert_eq!(sorted(first.variables()), sorted(second.variables()));
}

#[tokio::test]
async fn test_stac_collection_asset() {
    let fixture = stac_tree();
    let ep = stac_endpoint(&fixture.root_str(), "/prism").await;
    let resolver = StacToDataset::from_catalog(ep.catalog().clone()).unwrap();

    let ds = tokio::task::spawn_blocking(move || resolver.get_dataset_from_catalog("tiny.zarr"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ds.attr("name").unwrap(), "prism");
    assert_eq!(ds.attr("description").unwrap(), "PRISM test collection");
    assert!(ds.attr("stac_collection").unwrap().as_str().unwrap().ends_with("collection.json"));
    assert!(ds.attr("url_path").unwrap().as_str().unwrap().ends_with("tiny.zarr"));
    assert_eq!(ds.attr("title").unwrap(), "tiny");
    assert_eq!(sorted(ds.variables()), ["precip", "temp"]);
}

#[tokio::test]
async fn test_stac_resolution_is_idempotent() {
    let fixture = stac_tree();
    let ep = stac_endpoint(&fixture.root_str(), "/prism").await;
    let resolver = StacToDataset::from_catalog(ep.catalog().clone()).unwrap();

    let (first, second) = tokio::task::spawn_blocking(move || {
        (
            resolver.get_dataset_from_catalog("tiny.zarr").unwrap(),
            resolver.get_dataset_from_catalog("tiny.zarr").unwrap(),
        )
    })
    .await
    .unwrap();
    assert_eq!(first.attrs(), second.attrs());
    assert_eq!(sorted(first.variables()), sorted(second.variables()));
}

#[tokio::test]
async fn test_stac_asset_validation() {
    let fixture = stac_tree();
    let ep = stac_endpoint(&fixture.root_str(), "/prism").await;
    let resolver = StacToDataset::from_catalog(ep.catalog().clone()).unwrap();

    let err = resolver.get_dataset_from_catalog("no_kwargs.zarr").unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(err.to_string().contains("xarray:open_kwargs"));

    let err = resolver.get_dataset_from_catalog("not-an-asset").unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stac_catalog_items() {
    let fixture = stac_tree();
    let ep = stac_endpoint(&fixture.root_str(), "/items").await;
    let resolver = StacToDataset::from_catalog(ep.catalog().clone()).unwrap();

    let err = resolver.get_dataset_from_catalog("item-empty").unwrap_err();
    assert!(matches!(err, CatalogError::NoAssets(_)));

    let multi = resolver.get_dataset_from_catalog("item-multi").unwrap();
    match multi.source() {
        DatasetSource::File { size, .. } => assert_eq!(*size, 4),
        other => panic!("expected a file source, got {:?}", other),
    }
    assert_eq!(multi.engine(), Some("netcdf4"));
    assert_eq!(multi.attr("name").unwrap(), "items");
}

#[test]
fn test_stac_resolver_from_path() {
    let fixture = stac_tree();
    let collection = fixture.path("prism/collection.json");
    let resolver =
        tokio_test::block_on(StacToDataset::new(Some(collection.to_str().unwrap()), None)).unwrap();
    assert_eq!(resolver.node().id(), "prism");

    assert!(matches!(
        tokio_test::block_on(StacToDataset::new(None, None)),
        Err(CatalogError::Config(_))
    ));
}

#[tokio::test]
async fn test_wrong_node_variant_is_rejected() {
    let fixture = stac_tree();
    let ep = stac_endpoint(&fixture.root_str(), "/prism").await;
    let err = IntakeToDataset::from_catalog(ep.catalog().clone()).err().unwrap();
    assert!(matches!(err, CatalogError::TypeMismatch(_)));

    let intake = intake_local_catalog();
    let root = IntakeCatalogSearch::new(intake.root_str())
        .catalog_object()
        .await
        .unwrap();
    assert!(StacToDataset::from_catalog(root).is_err());
}
