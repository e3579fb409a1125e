//! Storage backend detection and dataset opening.
//!
//! A dataset location is mapped onto an `object_store` backend by its URL
//! scheme. Zarr hierarchies are read through the synchronous `zarrs` API; remote
//! stores are bridged to it with an async-to-sync adapter driven by a captured
//! Tokio runtime handle.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use object_store::aws::{AmazonS3, AmazonS3Builder, AmazonS3ConfigKey};
use object_store::http::HttpBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::prefix::PrefixStore;
use object_store::ObjectStore;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tracing::{debug, instrument};
use zarrs_filesystem::FilesystemStore;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};
use zarrs_storage::ReadableListableStorage;

use crate::dataset::{Dataset, DatasetSource};
use crate::error::{CatalogError, Result};

/// Open-engine name that selects the chunked (mapping view) code path.
pub const ZARR_ENGINE: &str = "zarr";

/// Storage backend selected from a location's scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `s3://bucket/key`
    S3,
    /// `https://host/path`
    Https,
    /// Local filesystem: drive-letter paths, `file://` URLs, absolute paths.
    File,
}

impl StorageBackend {
    /// Select a backend from the scheme prefix of `location`.
    pub fn detect(location: &str) -> Result<Self> {
        let Some((scheme, _)) = location.split_once(':') else {
            if location.starts_with('/') {
                return Ok(Self::File);
            }
            return Err(CatalogError::UnsupportedEndpoint(location.to_string()));
        };

        match scheme {
            "s3" => Ok(Self::S3),
            "https" => Ok(Self::Https),
            "file" => Ok(Self::File),
            s if s.len() == 1 && s.chars().all(|c| c.is_ascii_uppercase()) => Ok(Self::File),
            other => Err(CatalogError::UnsupportedEndpoint(other.to_string())),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Https => "https",
            Self::File => "file",
        }
    }
}

/// Blocking executor bound to a runtime handle.
///
/// Resolution runs on the blocking pool, where driving a future with
/// `Handle::block_on` is allowed.
#[derive(Clone)]
pub struct RuntimeBlockOn(Handle);

impl AsyncToSyncBlockOn for RuntimeBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

/// A location bound to a concrete object store.
pub struct ResolvedLocation {
    pub backend: StorageBackend,
    pub store: Arc<dyn ObjectStore>,
    pub path: ObjectPath,
    /// Filesystem path, for the local backend only.
    pub local_path: Option<PathBuf>,
}

impl std::fmt::Debug for ResolvedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLocation")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("local_path", &self.local_path)
            .finish()
    }
}

/// Build a filesystem handle for `location` with the declared storage options.
pub fn resolve_location(location: &str, storage_options: Option<&Value>) -> Result<ResolvedLocation> {
    let backend = StorageBackend::detect(location)?;
    let options = flatten_storage_options(storage_options);

    match backend {
        StorageBackend::S3 => {
            let rest = location.trim_start_matches("s3://");
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(CatalogError::config(format!("no bucket in {}", location)));
            }
            let store = build_s3_store(bucket, &options)?;
            Ok(ResolvedLocation {
                backend,
                store: Arc::new(store),
                path: ObjectPath::from(key.trim_end_matches('/')),
                local_path: None,
            })
        }
        StorageBackend::Https => {
            let rest = location.trim_start_matches("https://");
            let (host, url_path) = rest.split_once('/').unwrap_or((rest, ""));
            let store = HttpBuilder::new()
                .with_url(format!("https://{}", host))
                .build()
                .map_err(|e| CatalogError::storage(format!("failed to create HTTP client: {}", e)))?;
            Ok(ResolvedLocation {
                backend,
                store: Arc::new(store),
                path: ObjectPath::from(url_path.trim_end_matches('/')),
                local_path: None,
            })
        }
        StorageBackend::File => {
            let local = PathBuf::from(location.trim_start_matches("file://"));
            if !local.exists() {
                return Err(CatalogError::not_found(format!(
                    "{} does not exist",
                    local.display()
                )));
            }
            let path = ObjectPath::from_filesystem_path(&local)
                .map_err(|e| CatalogError::storage(e.to_string()))?;
            Ok(ResolvedLocation {
                backend,
                store: Arc::new(LocalFileSystem::new()),
                path,
                local_path: Some(local),
            })
        }
    }
}

/// Open the dataset at `location`.
///
/// When the open engine is `zarr` the location is read as a chunked hierarchy
/// through a mapping view; anything else is opened as a plain file handle.
#[instrument(skip(storage_options, open_kwargs, runtime))]
pub fn open_dataset(
    location: &str,
    storage_options: Option<&Value>,
    open_kwargs: &Map<String, Value>,
    runtime: Option<&Handle>,
) -> Result<Dataset> {
    let resolved = resolve_location(location, storage_options)?;
    let engine = open_kwargs
        .get("engine")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    debug!(backend = resolved.backend.scheme(), engine = %engine, "Opening dataset");

    if engine == ZARR_ENGINE {
        let storage = zarr_storage(resolved, runtime)?;
        Dataset::open_zarr(location, storage, open_kwargs.clone())
    } else {
        let size = match &resolved.local_path {
            Some(local) => std::fs::metadata(local)?.len(),
            None => {
                let handle = runtime.ok_or_else(|| {
                    CatalogError::storage("no async runtime available for remote reads")
                })?;
                let meta = handle.block_on(resolved.store.head(&resolved.path))?;
                meta.size as u64
            }
        };
        Ok(Dataset::new(
            location,
            DatasetSource::File {
                store: resolved.store,
                path: resolved.path,
                size,
            },
            Vec::new(),
            open_kwargs.clone(),
        ))
    }
}

/// Mapping view over a resolved location, rooted at the hierarchy.
fn zarr_storage(resolved: ResolvedLocation, runtime: Option<&Handle>) -> Result<ReadableListableStorage> {
    if let Some(local) = resolved.local_path {
        let store = FilesystemStore::new(&local)
            .map_err(|e| CatalogError::storage(format!("failed to open {}: {}", local.display(), e)))?;
        return Ok(Arc::new(store));
    }

    let handle = runtime
        .cloned()
        .ok_or_else(|| CatalogError::storage("no async runtime available for remote reads"))?;
    let prefixed = PrefixStore::new(resolved.store, resolved.path);
    let async_store = Arc::new(AsyncObjectStore::new(prefixed));
    let sync_store = AsyncToSyncStorageAdapter::new(async_store, RuntimeBlockOn(handle));
    Ok(Arc::new(sync_store))
}

/// Flatten fsspec-style options: `client_kwargs` entries are lifted to the top.
fn flatten_storage_options(options: Option<&Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    let Some(Value::Object(map)) = options else {
        return flat;
    };
    for (key, value) in map {
        if key == "client_kwargs" {
            if let Value::Object(inner) = value {
                for (k, v) in inner {
                    flat.insert(k.clone(), v.clone());
                }
            }
        } else {
            flat.insert(key.clone(), value.clone());
        }
    }
    flat
}

/// object_store config key for an fsspec storage option name.
fn s3_config_key(option: &str) -> &str {
    match option {
        "endpoint_url" => "endpoint",
        "key" => "access_key_id",
        "secret" => "secret_access_key",
        "token" => "token",
        "anon" => "skip_signature",
        "requester_pays" => "request_payer",
        other => other,
    }
}

fn build_s3_store(bucket: &str, options: &Map<String, Value>) -> Result<AmazonS3> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

    for (option, value) in options {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        match AmazonS3ConfigKey::from_str(s3_config_key(option)) {
            Ok(key) => builder = builder.with_config(key, value),
            Err(_) => debug!(option = %option, "Ignoring unsupported storage option"),
        }
    }

    builder
        .build()
        .map_err(|e| CatalogError::storage(format!("failed to create S3 client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_backends() {
        assert_eq!(StorageBackend::detect("s3://bucket/a.zarr").unwrap(), StorageBackend::S3);
        assert_eq!(
            StorageBackend::detect("https://example.com/a.nc").unwrap(),
            StorageBackend::Https
        );
        assert_eq!(
            StorageBackend::detect("C:\\data\\a.zarr").unwrap(),
            StorageBackend::File
        );
        assert_eq!(StorageBackend::detect("/data/a.zarr").unwrap(), StorageBackend::File);
        assert_eq!(
            StorageBackend::detect("file:///data/a.zarr").unwrap(),
            StorageBackend::File
        );
    }

    #[test]
    fn test_unsupported_schemes() {
        for location in ["gs://bucket/a.zarr", "http://example.com/a.nc", "c:\\lower", "a.zarr"] {
            let err = StorageBackend::detect(location).unwrap_err();
            assert!(matches!(err, CatalogError::UnsupportedEndpoint(_)), "{}", location);
        }
    }

    #[test]
    fn test_flatten_client_kwargs() {
        let opts = json!({
            "anon": true,
            "client_kwargs": {"endpoint_url": "https://usgs.osn.mghpcc.org"}
        });
        let flat = flatten_storage_options(Some(&opts));
        assert_eq!(flat["anon"], true);
        assert_eq!(flat["endpoint_url"], "https://usgs.osn.mghpcc.org");
        assert!(!flat.contains_key("client_kwargs"));
        assert!(flatten_storage_options(None).is_empty());
    }

    #[test]
    fn test_s3_location_split() {
        let resolved = resolve_location("s3://bucket/prefix/data.zarr/", Some(&json!({"anon": true})))
            .unwrap();
        assert_eq!(resolved.backend, StorageBackend::S3);
        assert_eq!(resolved.path.as_ref(), "prefix/data.zarr");
        assert!(resolved.local_path.is_none());
    }

    #[test]
    fn test_missing_local_file() {
        let err = resolve_location("/no/such/data.zarr", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remote_zarr_through_object_store() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let group = json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {"title": "remote"}
        });
        runtime
            .block_on(store.put(
                &ObjectPath::from("prefix/data.zarr/zarr.json"),
                serde_json::to_vec(&group).unwrap().into(),
            ))
            .unwrap();

        let resolved = ResolvedLocation {
            backend: StorageBackend::S3,
            store,
            path: ObjectPath::from("prefix/data.zarr"),
            local_path: None,
        };
        let storage = zarr_storage(resolved, Some(runtime.handle())).unwrap();
        let ds = Dataset::open_zarr("s3://bucket/prefix/data.zarr", storage, Map::new()).unwrap();
        assert_eq!(ds.attr("title").unwrap(), "remote");
        assert!(ds.variables().is_empty());
    }

    #[test]
    fn test_remote_zarr_needs_runtime() {
        let resolved = resolve_location("s3://bucket/data.zarr", Some(&json!({"anon": true}))).unwrap();
        let err = zarr_storage(resolved, None).err().unwrap();
        assert!(matches!(err, CatalogError::Storage(_)));
    }

    #[test]
    fn test_local_file_handle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.nc");
        std::fs::write(&file, b"CDF\x01").unwrap();

        let mut kwargs = Map::new();
        kwargs.insert("engine".into(), json!("netcdf4"));
        let ds = open_dataset(file.to_str().unwrap(), None, &kwargs, None).unwrap();
        match ds.source() {
            DatasetSource::File { size, .. } => assert_eq!(*size, 4),
            other => panic!("expected file source, got {:?}", other),
        }
        assert_eq!(ds.engine(), Some("netcdf4"));
    }
}
