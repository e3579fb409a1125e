//! Integration test: assemble the full application over fixture catalogs
//! and drive it without a socket.

use std::sync::Arc;

use array_server::DatasetProvider;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use catalog_api::{create_app, registry, CatalogDatasetProvider, ServerConfig};
use catalog_core::{CatalogSearcher, DatasetResolver, StacCatalogSearch};
use serde_json::{json, Value};
use test_utils::{intake_local_catalog, intake_tree, stac_duplicate_children, stac_tree};
use tower::ServiceExt;

async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_stac_catalog_routes() {
    let fixture = stac_tree();
    let app = create_app(&ServerConfig::new("stac", fixture.root_str()))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/catalogs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["prism", "items"]));

    let (_, body) = get_json(&app, "/parent_catalog").await;
    assert_eq!(body, "This is the root catalog");

    let (_, body) = get_json(&app, "/prism/parent_catalog").await;
    assert_eq!(body, "/");

    let (_, body) = get_json(&app, "/json").await;
    assert_eq!(body["id"], "root");

    let (status, content_type, body) = get(&app, "/prism/yaml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    let yaml: Value = serde_yaml::from_slice(&body).unwrap();
    assert_eq!(yaml["id"], "prism");

    let (status, content_type, _) = get(&app, "/items/ui").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn test_stac_dataset_routes() {
    let fixture = stac_tree();
    let app = create_app(&ServerConfig::new("STAC", fixture.root_str()))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/prism/datasets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["tiny.zarr", "no_kwargs.zarr"]));

    let (status, body) = get_json(&app, "/prism/datasets/tiny.zarr/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attrs"]["name"], "prism");
    assert_eq!(body["kind"], "zarr");

    let (status, _) = get_json(&app, "/prism/datasets/no_kwargs.zarr/info").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Skipped during traversal, so not served.
    let (status, _) = get_json(&app, "/items/datasets/item-empty/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get_json(&app, "/items/datasets").await;
    assert_eq!(body, json!(["item-a", "item-multi", "item-c"]));

    // The root lists no datasets and has no serving routes.
    let (status, _) = get_json(&app, "/datasets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stac_duplicate_children_mount_once() {
    let fixture = stac_duplicate_children();
    let app = create_app(&ServerConfig::new("stac", fixture.root_str()))
        .await
        .unwrap();

    let (_, body) = get_json(&app, "/catalogs").await;
    assert_eq!(body, json!(["dup"]));

    let (status, body) = get_json(&app, "/dup/datasets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["item-a"]));

    let (_, body) = get_json(&app, "/dup/json").await;
    assert_eq!(body["description"], "first");
}

#[tokio::test]
async fn test_intake_root_with_datasets() {
    let fixture = intake_local_catalog();
    let app = create_app(&ServerConfig::new("intake", fixture.root_str()))
        .await
        .unwrap();

    let (_, body) = get_json(&app, "/datasets").await;
    assert_eq!(body, json!(["tiny", "table", "raster"]));

    let (status, body) = get_json(&app, "/datasets/tiny/keys").await;
    assert_eq!(status, StatusCode::OK);
    let mut keys: Vec<String> = serde_json::from_value(body).unwrap();
    keys.sort();
    assert_eq!(keys, ["precip", "temp"]);

    let (status, body) = get_json(&app, "/datasets/table/info").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("dataframe"));

    let (status, _) = get_json(&app, "/datasets/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get_json(&app, "/catalogs").await;
    assert_eq!(body, json!([]));

    let (status, content_type, body) = get(&app, "/yaml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(String::from_utf8(body).unwrap().contains("tiny"));

    let (_, body) = get_json(&app, "/health").await;
    assert_eq!(body["status"], "ok");

    let (_, body) = get_json(&app, "/").await;
    assert_eq!(body["catalog"], "local");
    assert_eq!(body["catalog_type"], "intake");
}

#[tokio::test]
async fn test_intake_nested_catalogs() {
    let fixture = intake_tree();
    let app = create_app(&ServerConfig::new("intake", fixture.root_str()))
        .await
        .unwrap();

    let (_, body) = get_json(&app, "/catalogs").await;
    assert_eq!(body, json!(["s3_catalog", "osn_catalog"]));

    let (_, body) = get_json(&app, "/s3_catalog/datasets").await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (_, body) = get_json(&app, "/osn_catalog/parent_catalog").await;
    assert_eq!(body, "/");

    let (_, body) = get_json(&app, "/s3_catalog/json").await;
    assert!(body["sources"]["prism"].is_object());
}

#[tokio::test]
async fn test_duplicate_plugins_are_skipped() {
    let fixture = intake_local_catalog();
    let mut config = ServerConfig::new("intake", fixture.root_str());
    config.plugins = vec!["dataset_info".into(), "dataset_info".into()];
    let app = create_app(&config).await.unwrap();

    let (status, _) = get_json(&app, "/datasets/tiny/attrs").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_startup_errors() {
    let fixture = stac_tree();
    assert!(create_app(&ServerConfig::new("thredds", fixture.root_str()))
        .await
        .is_err());
    assert!(create_app(&ServerConfig::new("intake", fixture.root_str()))
        .await
        .is_err());
    assert!(create_app(&ServerConfig::new("stac", "")).await.is_err());
}

#[tokio::test]
async fn test_unlisted_dataset_is_none() {
    let fixture = stac_tree();
    let endpoint = StacCatalogSearch::new(fixture.root_str())
        .parse()
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.catalog_path() == "/prism")
        .unwrap();

    let implementation = registry::get_catalog_implementation("stac").unwrap();
    let resolver = implementation
        .catalog_resolver(endpoint.catalog().clone())
        .unwrap();

    let err = resolver.get_dataset_from_catalog("missing").unwrap_err();
    assert!(err.is_not_found());

    let provider = CatalogDatasetProvider::new(Arc::new(endpoint), resolver);
    assert!(provider.get_dataset("missing").unwrap().is_none());
    assert_eq!(provider.get_datasets(), ["tiny.zarr", "no_kwargs.zarr"]);
}
