//! Intake YAML catalog model and loader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::runtime::Handle;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{CatalogError, Result};
use crate::storage::{self, ZARR_ENGINE};

/// Driver names that denote a nested catalog file.
pub const CATALOG_DRIVERS: &[&str] = &["yaml_file_cat", "intake.catalog.local.YAMLFileCatalog"];

/// Container kind of array datasets.
pub const XARRAY_CONTAINER: &str = "xarray";

/// An installed data driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Driver {
    pub name: &'static str,
    pub container: &'static str,
    pub plugin: &'static str,
}

const DRIVERS: &[Driver] = &[
    Driver {
        name: "zarr",
        container: XARRAY_CONTAINER,
        plugin: "intake_xarray.xzarr.ZarrSource",
    },
    Driver {
        name: "netcdf",
        container: XARRAY_CONTAINER,
        plugin: "intake_xarray.netcdf.NetCDFSource",
    },
    Driver {
        name: "opendap",
        container: XARRAY_CONTAINER,
        plugin: "intake_xarray.opendap.OpenDapSource",
    },
    Driver {
        name: "csv",
        container: "dataframe",
        plugin: "intake.source.csv.CSVSource",
    },
    Driver {
        name: "parquet",
        container: "dataframe",
        plugin: "intake_parquet.source.ParquetSource",
    },
];

/// Look up an installed driver by short name or plugin class name.
pub fn lookup_driver(name: &str) -> Option<&'static Driver> {
    DRIVERS.iter().find(|d| d.name == name || d.plugin == name)
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    sources: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct SourceSpec {
    driver: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    args: Map<String, Value>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    direct_access: Option<String>,
}

/// A data source entry of an Intake catalog.
#[derive(Debug, Clone)]
pub struct IntakeSource {
    name: String,
    driver: String,
    description: Option<String>,
    args: Map<String, Value>,
    metadata: Map<String, Value>,
    parameters: Map<String, Value>,
    direct_access: String,
}

impl IntakeSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }

    /// Container kind of the driver, `unknown` when it is not installed.
    pub fn container(&self) -> &'static str {
        lookup_driver(&self.driver)
            .map(|d| d.container)
            .unwrap_or("unknown")
    }

    /// Descriptor dictionary in Intake's `describe()` layout.
    pub fn describe(&self) -> Map<String, Value> {
        let mut info = Map::new();
        info.insert("name".into(), json!(self.name));
        info.insert("container".into(), json!(self.container()));
        info.insert("plugin".into(), json!([self.driver]));
        info.insert("driver".into(), json!([self.driver]));
        info.insert(
            "description".into(),
            json!(self.description.clone().unwrap_or_default()),
        );
        info.insert("direct_access".into(), json!(self.direct_access));
        let user_parameters: Vec<Value> = self
            .parameters
            .iter()
            .map(|(name, spec)| {
                let mut param = Map::new();
                param.insert("name".into(), json!(name));
                if let Value::Object(fields) = spec {
                    param.extend(fields.clone());
                }
                Value::Object(param)
            })
            .collect();
        info.insert("user_parameters".into(), Value::Array(user_parameters));
        info.insert("metadata".into(), Value::Object(self.metadata.clone()));
        info.insert("args".into(), Value::Object(self.args.clone()));
        info
    }

    /// Materialize the source as an opened dataset.
    ///
    /// `urlpath` and `storage_options` come from the source arguments;
    /// `xarray_kwargs` are passed through as open arguments.
    pub fn to_dataset(&self, runtime: Option<&Handle>) -> Result<Dataset> {
        let urlpath = self
            .args
            .get("urlpath")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CatalogError::validation(format!("{} has no urlpath argument", self.name))
            })?;

        let mut open_kwargs = match self.args.get("xarray_kwargs") {
            Some(Value::Object(kwargs)) => kwargs.clone(),
            _ => Map::new(),
        };
        let driver = lookup_driver(&self.driver).map(|d| d.name).unwrap_or(self.driver.as_str());
        if driver == "zarr" {
            open_kwargs.insert("engine".into(), json!(ZARR_ENGINE));
        } else {
            open_kwargs
                .entry("engine")
                .or_insert_with(|| json!(driver));
        }

        debug!(source = %self.name, urlpath = %urlpath, "Materializing intake source");
        storage::open_dataset(
            urlpath,
            self.args.get("storage_options"),
            &open_kwargs,
            runtime,
        )
    }

    fn to_spec_dict(&self) -> Value {
        let mut spec = Map::new();
        spec.insert("driver".into(), json!(self.driver));
        if let Some(description) = &self.description {
            spec.insert("description".into(), json!(description));
        }
        spec.insert("args".into(), Value::Object(self.args.clone()));
        if !self.metadata.is_empty() {
            spec.insert("metadata".into(), Value::Object(self.metadata.clone()));
        }
        Value::Object(spec)
    }
}

/// One named entry of a catalog.
#[derive(Debug, Clone)]
pub enum IntakeEntry {
    Catalog(Arc<IntakeCatalog>),
    Source(IntakeSource),
}

/// A parsed Intake catalog with its nested catalogs loaded.
#[derive(Debug, Clone)]
pub struct IntakeCatalog {
    name: String,
    path: String,
    description: Option<String>,
    metadata: Map<String, Value>,
    entries: Vec<(String, IntakeEntry)>,
}

impl IntakeCatalog {
    /// Load the catalog file at `path`, named after its file stem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Self::load(path, name)
    }

    fn load(path: &Path, name: String) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::config(format!("could not read catalog {}: {}", path.display(), e))
        })?;
        let file: CatalogFile = serde_yaml::from_str(&text)
            .map_err(|e| CatalogError::parse(format!("{}: {}", path.display(), e)))?;

        let catalog_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let catalog_dir_str = catalog_dir.to_string_lossy().to_string();

        let mut entries = Vec::with_capacity(file.sources.len());
        for (entry_name, raw) in file.sources {
            let mut spec: SourceSpec = serde_json::from_value(raw).map_err(|e| {
                CatalogError::parse(format!(
                    "source '{}' in {}: {}",
                    entry_name,
                    path.display(),
                    e
                ))
            })?;
            for value in spec.args.values_mut() {
                expand_catalog_dir(value, &catalog_dir_str);
            }

            let entry = if CATALOG_DRIVERS.contains(&spec.driver.as_str()) {
                let child_path = spec
                    .args
                    .get("path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        CatalogError::config(format!(
                            "sub-catalog '{}' in {} has no path argument",
                            entry_name,
                            path.display()
                        ))
                    })?;
                let child_path = resolve_relative(&catalog_dir, child_path);
                debug!(catalog = %entry_name, path = %child_path.display(), "Loading nested catalog");
                IntakeEntry::Catalog(Arc::new(Self::load(&child_path, entry_name.clone())?))
            } else {
                IntakeEntry::Source(IntakeSource {
                    name: entry_name.clone(),
                    driver: spec.driver,
                    description: spec.description,
                    args: spec.args,
                    metadata: spec.metadata,
                    parameters: spec.parameters,
                    direct_access: spec.direct_access.unwrap_or_else(|| "forbid".to_string()),
                })
            };
            entries.push((entry_name, entry));
        }

        Ok(Self {
            name,
            path: path.to_string_lossy().to_string(),
            description: file.description,
            metadata: file.metadata,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the YAML file this catalog was read from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &IntakeEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&IntakeEntry> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, entry)| entry)
    }

    /// Dictionary export: metadata plus the source specs.
    pub fn to_dict(&self) -> Value {
        let mut sources = Map::new();
        for (name, entry) in &self.entries {
            let spec = match entry {
                IntakeEntry::Source(source) => source.to_spec_dict(),
                IntakeEntry::Catalog(child) => json!({
                    "driver": CATALOG_DRIVERS[0],
                    "args": {"path": child.path()},
                }),
            };
            sources.insert(name.clone(), spec);
        }

        let mut dict = Map::new();
        if let Some(description) = &self.description {
            dict.insert("description".into(), json!(description));
        }
        dict.insert("metadata".into(), Value::Object(self.metadata.clone()));
        dict.insert("sources".into(), Value::Object(sources));
        Value::Object(dict)
    }

    /// YAML text of [`Self::to_dict`].
    pub fn yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_dict())?)
    }
}

fn resolve_relative(base: &Path, target: &str) -> PathBuf {
    let target = Path::new(target.trim_start_matches("file://"));
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        base.join(target)
    }
}

/// Replace `{{ CATALOG_DIR }}` in every string below `value`.
fn expand_catalog_dir(value: &mut Value, catalog_dir: &str) {
    match value {
        Value::String(s) => {
            if s.contains("CATALOG_DIR") {
                *s = s
                    .replace("{{ CATALOG_DIR }}", catalog_dir)
                    .replace("{{CATALOG_DIR}}", catalog_dir);
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| expand_catalog_dir(item, catalog_dir)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| expand_catalog_dir(item, catalog_dir)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = r#"
description: root catalog
metadata:
  version: 1
sources:
  child:
    driver: yaml_file_cat
    args:
      path: "{{ CATALOG_DIR }}/child.yaml"
  table:
    driver: csv
    args:
      urlpath: "{{CATALOG_DIR}}/table.csv"
"#;

    const CHILD: &str = r#"
sources:
  prism:
    driver: zarr
    description: PRISM monthly
    args:
      urlpath: s3://bucket/prism.zarr
      storage_options:
        anon: true
    parameters:
      year:
        type: int
        default: 2000
"#;

    fn write_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("root.yaml"), ROOT).unwrap();
        std::fs::write(dir.path().join("child.yaml"), CHILD).unwrap();
        dir
    }

    #[test]
    fn test_load_nested_catalog() {
        let dir = write_tree();
        let cat = IntakeCatalog::open(dir.path().join("root.yaml")).unwrap();
        assert_eq!(cat.name(), "root");
        assert_eq!(cat.description(), Some("root catalog"));

        let names: Vec<&str> = cat.entries().map(|(n, _)| n).collect();
        assert_eq!(names, ["child", "table"]);

        let Some(IntakeEntry::Catalog(child)) = cat.get("child") else {
            panic!("child should be a catalog");
        };
        assert_eq!(child.name(), "child");
        assert!(matches!(child.get("prism"), Some(IntakeEntry::Source(_))));
    }

    #[test]
    fn test_catalog_dir_expansion() {
        let dir = write_tree();
        let cat = IntakeCatalog::open(dir.path().join("root.yaml")).unwrap();
        let Some(IntakeEntry::Source(table)) = cat.get("table") else {
            panic!("table should be a source");
        };
        let urlpath = table.args()["urlpath"].as_str().unwrap();
        assert!(!urlpath.contains("CATALOG_DIR"));
        assert!(urlpath.ends_with("table.csv"));
        assert_eq!(table.container(), "dataframe");
    }

    #[test]
    fn test_describe_layout() {
        let dir = write_tree();
        let cat = IntakeCatalog::open(dir.path().join("child.yaml")).unwrap();
        let Some(IntakeEntry::Source(prism)) = cat.get("prism") else {
            panic!("prism should be a source");
        };
        let info = prism.describe();
        assert_eq!(info["name"], "prism");
        assert_eq!(info["container"], "xarray");
        assert_eq!(info["driver"], json!(["zarr"]));
        assert_eq!(info["description"], "PRISM monthly");
        assert_eq!(info["user_parameters"][0]["name"], "year");
        assert_eq!(info["args"]["storage_options"]["anon"], true);
    }

    #[test]
    fn test_yaml_export() {
        let dir = write_tree();
        let cat = IntakeCatalog::open(dir.path().join("root.yaml")).unwrap();
        let text = cat.yaml().unwrap();
        assert!(text.contains("sources:"));
        assert!(text.contains("yaml_file_cat"));
        assert_eq!(cat.to_dict()["metadata"]["version"], 1);
    }

    #[test]
    fn test_driver_lookup() {
        assert_eq!(lookup_driver("zarr").unwrap().container, "xarray");
        assert_eq!(
            lookup_driver("intake_xarray.netcdf.NetCDFSource").unwrap().name,
            "netcdf"
        );
        assert!(lookup_driver("rasterio").is_none());
    }
}
