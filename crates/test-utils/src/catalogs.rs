//! Catalog trees written to temporary directories.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::zarr::write_zarr_store;

/// A catalog tree on disk. The directory is removed on drop.
pub struct CatalogFixture {
    pub dir: TempDir,
    /// Root catalog document.
    pub root: PathBuf,
}

impl CatalogFixture {
    pub fn root_str(&self) -> String {
        self.root.to_string_lossy().to_string()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

const INTAKE_ROOT: &str = r#"
metadata:
  version: 1
sources:
  s3_catalog:
    driver: yaml_file_cat
    description: Zarr datasets in public S3 buckets
    args:
      path: "{{ CATALOG_DIR }}/s3_catalog.yaml"
  osn_catalog:
    driver: intake.catalog.local.YAMLFileCatalog
    description: Zarr datasets on the Open Storage Network
    args:
      path: osn_catalog.yaml
"#;

const INTAKE_S3: &str = r#"
sources:
  conus404-hourly:
    driver: zarr
    description: CONUS404 hourly
    args:
      urlpath: s3://hytest/conus404/conus404_hourly.zarr
      storage_options:
        anon: true
        requester_pays: false
  conus404-daily:
    driver: zarr
    description: CONUS404 daily
    args:
      urlpath: s3://hytest/conus404/conus404_daily.zarr
      storage_options:
        anon: true
  prism:
    driver: zarr
    description: PRISM monthly
    args:
      urlpath: s3://hytest/prism/prism.zarr
      storage_options:
        anon: true
  gridmet:
    driver: zarr
    args:
      urlpath: s3://hytest/gridmet/gridmet.zarr
      storage_options:
        anon: true
"#;

const INTAKE_OSN: &str = r#"
sources:
  osn-prism:
    driver: zarr
    description: PRISM on OSN
    args:
      urlpath: s3://hytest/prism/prism.zarr
      storage_options:
        anon: true
        client_kwargs:
          endpoint_url: https://usgs.osn.mghpcc.org/
"#;

/// Intake tree: a root with the sub-catalogs `s3_catalog` (four zarr
/// sources) and `osn_catalog` (one zarr source).
pub fn intake_tree() -> CatalogFixture {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("test_intake_zarr_catalog.yaml"), INTAKE_ROOT).unwrap();
    std::fs::write(dir.path().join("s3_catalog.yaml"), INTAKE_S3).unwrap();
    std::fs::write(dir.path().join("osn_catalog.yaml"), INTAKE_OSN).unwrap();
    CatalogFixture {
        root: dir.path().join("test_intake_zarr_catalog.yaml"),
        dir,
    }
}

const INTAKE_LOCAL: &str = r#"
description: Local datasets
sources:
  tiny:
    driver: zarr
    description: A tiny zarr store
    args:
      urlpath: "{{ CATALOG_DIR }}/tiny.zarr"
  table:
    driver: csv
    args:
      urlpath: "{{ CATALOG_DIR }}/table.csv"
  raster:
    driver: rasterio
    args:
      urlpath: "{{ CATALOG_DIR }}/raster.tif"
"#;

/// Single-level Intake catalog of local data: a zarr store (`tiny`), a
/// dataframe source (`table`) and a source with an uninstalled driver
/// (`raster`).
pub fn intake_local_catalog() -> CatalogFixture {
    let dir = tempfile::tempdir().unwrap();
    write_zarr_store(&dir.path().join("tiny.zarr"), tiny_attrs(), &["temp", "precip"]).unwrap();
    std::fs::write(dir.path().join("table.csv"), "a,b\n1,2\n").unwrap();
    std::fs::write(dir.path().join("local.yaml"), INTAKE_LOCAL).unwrap();
    CatalogFixture {
        root: dir.path().join("local.yaml"),
        dir,
    }
}

fn tiny_attrs() -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("title".into(), json!("tiny"));
    attrs.insert("institution".into(), json!("test"));
    attrs
}

fn xarray_zarr_asset(href: &str) -> Value {
    json!({
        "href": href,
        "type": "application/vnd+zarr",
        "roles": ["data"],
        "xarray:open_kwargs": {"engine": "zarr", "consolidated": false},
        "xarray:storage_options": null
    })
}

fn write_json(path: &Path, doc: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
}

/// STAC tree:
///
/// ```text
/// catalog.json (root)
/// ├── prism/collection.json     assets: tiny.zarr, readme.txt, no_kwargs.zarr
/// └── items/catalog.json        items: item-a, item-empty, item-multi, item-c
/// ```
///
/// `item-empty` has no assets; `item-multi` has two, the first a `.nc` file.
pub fn stac_tree() -> CatalogFixture {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    write_zarr_store(&base.join("data/tiny.zarr"), tiny_attrs(), &["temp", "precip"]).unwrap();
    std::fs::write(base.join("data/readme.txt"), "readme").unwrap();
    std::fs::write(base.join("data/multi.nc"), b"CDF\x01").unwrap();

    write_json(
        &base.join("catalog.json"),
        &json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "root",
            "description": "Root test catalog",
            "links": [
                {"rel": "self", "href": "./catalog.json"},
                {"rel": "child", "href": "./prism/collection.json"},
                {"rel": "child", "href": "./items/catalog.json"}
            ]
        }),
    );

    write_json(
        &base.join("prism/collection.json"),
        &json!({
            "type": "Collection",
            "stac_version": "1.0.0",
            "id": "prism",
            "description": "PRISM test collection",
            "license": "CC0-1.0",
            "extent": {
                "spatial": {"bbox": [[-125.0, 24.0, -66.0, 50.0]]},
                "temporal": {"interval": [["1895-01-01T00:00:00Z", null]]}
            },
            "links": [
                {"rel": "root", "href": "../catalog.json"},
                {"rel": "parent", "href": "../catalog.json"}
            ],
            "assets": {
                "tiny.zarr": xarray_zarr_asset("../data/tiny.zarr/"),
                "readme": {"href": "../data/readme.txt", "roles": ["metadata"]},
                "no_kwargs.zarr": {"href": "../data/tiny.zarr", "xarray:storage_options": null}
            }
        }),
    );

    write_json(
        &base.join("items/catalog.json"),
        &json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "items",
            "description": "Catalog of items",
            "links": [
                {"rel": "parent", "href": "../catalog.json"},
                {"rel": "item", "href": "./item-a.json"},
                {"rel": "item", "href": "./item-empty.json"},
                {"rel": "item", "href": "./item-multi.json"},
                {"rel": "item", "href": "./item-c.json"}
            ]
        }),
    );

    let item = |id: &str, assets: Value| {
        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "geometry": null,
            "properties": {"datetime": "2020-01-01T00:00:00Z"},
            "links": [],
            "assets": assets
        })
    };
    write_json(
        &base.join("items/item-a.json"),
        &item("item-a", json!({"data": xarray_zarr_asset("../data/tiny.zarr")})),
    );
    write_json(&base.join("items/item-empty.json"), &item("item-empty", json!({})));
    write_json(
        &base.join("items/item-multi.json"),
        &item(
            "item-multi",
            json!({
                "netcdf": {
                    "href": "../data/multi.nc",
                    "xarray:open_kwargs": {"engine": "netcdf4"},
                    "xarray:storage_options": {}
                },
                "zarr": xarray_zarr_asset("../data/tiny.zarr")
            }),
        ),
    );
    write_json(
        &base.join("items/item-c.json"),
        &item("item-c", json!({"data": xarray_zarr_asset("../data/tiny.zarr")})),
    );

    CatalogFixture {
        root: base.join("catalog.json"),
        dir,
    }
}

/// STAC tree whose root links two child catalogs (`a/`, `b/`) that both
/// carry the id `dup`. The first holds one zarr item, the second none.
pub fn stac_duplicate_children() -> CatalogFixture {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    write_zarr_store(&base.join("data/tiny.zarr"), tiny_attrs(), &["temp"]).unwrap();

    write_json(
        &base.join("catalog.json"),
        &json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "root",
            "description": "Root with clashing children",
            "links": [
                {"rel": "child", "href": "./a/catalog.json"},
                {"rel": "child", "href": "./b/catalog.json"}
            ]
        }),
    );
    write_json(
        &base.join("a/catalog.json"),
        &json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "dup",
            "description": "first",
            "links": [{"rel": "item", "href": "./item.json"}]
        }),
    );
    write_json(
        &base.join("a/item.json"),
        &json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "item-a",
            "geometry": null,
            "properties": {"datetime": "2020-01-01T00:00:00Z"},
            "links": [],
            "assets": {"data": xarray_zarr_asset("../data/tiny.zarr")}
        }),
    );
    write_json(
        &base.join("b/catalog.json"),
        &json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "dup",
            "description": "second",
            "links": []
        }),
    );

    CatalogFixture {
        root: base.join("catalog.json"),
        dir,
    }
}
