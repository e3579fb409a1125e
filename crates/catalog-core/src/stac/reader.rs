//! Loads a STAC tree from local files or HTTP(S) URLs.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::model::{StacAsset, StacItem, StacKind, StacNode};
use crate::error::{CatalogError, Result};

/// Reads STAC documents and follows `child` and `item` links.
#[derive(Clone, Default)]
pub struct StacReader {
    client: Client,
}

impl StacReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the catalog or collection at `location` and everything it links.
    ///
    /// A linked child or item that cannot be read is logged and skipped.
    pub async fn read_catalog(&self, location: &str) -> Result<StacNode> {
        let node = self.read_node(location.to_string()).await?;
        if node.kind == StacKind::Item {
            return Err(CatalogError::type_mismatch(format!(
                "{} is a STAC item, expected a catalog or collection",
                location
            )));
        }
        Ok(node)
    }

    fn read_node(&self, location: String) -> BoxFuture<'_, Result<StacNode>> {
        async move {
            let doc = self.fetch(&location).await?;
            let kind = StacKind::of(&doc);
            let id = doc
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| CatalogError::parse(format!("{} has no id", location)))?
                .to_string();
            debug!(id = %id, kind = kind.as_str(), location = %location, "Read STAC object");

            let mut node = StacNode {
                kind,
                description: doc
                    .get("description")
                    .and_then(Value::as_str)
                    .map(String::from),
                assets: parse_assets(&doc, &location),
                id,
                self_href: location.clone(),
                raw: Value::Null,
                children: Vec::new(),
                items: Vec::new(),
            };

            for (rel, href) in links(&doc) {
                let target = resolve_href(&location, &href);
                match rel.as_str() {
                    "child" => match self.read_node(target.clone()).await {
                        Ok(child) if child.kind != StacKind::Item => {
                            node.children.push(Arc::new(child))
                        }
                        Ok(_) => warn!(href = %target, "Child link points at an item, skipping"),
                        Err(e) => warn!(
                            href = %target,
                            error = %e,
                            "Error while reading catalog child, skipping"
                        ),
                    },
                    "item" => match self.read_item(&target).await {
                        Ok(item) => node.items.push(item),
                        Err(e) => warn!(
                            href = %target,
                            error = %e,
                            "Error while reading catalog item, skipping"
                        ),
                    },
                    _ => {}
                }
            }

            node.raw = doc;
            Ok(node)
        }
        .boxed()
    }

    async fn read_item(&self, location: &str) -> Result<StacItem> {
        let doc = self.fetch(location).await?;
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::parse(format!("{} has no id", location)))?;
        Ok(StacItem::new(id, location, parse_assets(&doc, location)))
    }

    async fn fetch(&self, location: &str) -> Result<Value> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .map_err(|e| CatalogError::storage(format!("GET {}: {}", location, e)))?;
            if !response.status().is_success() {
                return Err(CatalogError::not_found(format!(
                    "GET {} returned {}",
                    location,
                    response.status()
                )));
            }
            let text = response
                .text()
                .await
                .map_err(|e| CatalogError::storage(format!("GET {}: {}", location, e)))?;
            Ok(serde_json::from_str(&text)?)
        } else {
            let path = location.trim_start_matches("file://");
            let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                CatalogError::config(format!("could not read {}: {}", path, e))
            })?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

fn links(doc: &Value) -> Vec<(String, String)> {
    doc.get("links")
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| {
                    let rel = link.get("rel")?.as_str()?;
                    let href = link.get("href")?.as_str()?;
                    Some((rel.to_string(), href.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_assets(doc: &Value, location: &str) -> Vec<(String, StacAsset)> {
    let Some(assets) = doc.get("assets").and_then(Value::as_object) else {
        return Vec::new();
    };
    assets
        .iter()
        .filter_map(|(key, asset)| {
            let raw: Map<String, Value> = asset.as_object()?.clone();
            let Some(href) = raw.get("href").and_then(Value::as_str) else {
                warn!(asset = %key, location = %location, "Asset has no href, skipping");
                return None;
            };
            let href = resolve_href(location, href);
            Some((key.clone(), StacAsset::new(href, raw)))
        })
        .collect()
}

/// Make `href` absolute against the document it appeared in.
pub fn resolve_href(base: &str, href: &str) -> String {
    if href.contains("://") || is_drive_path(href) {
        return href.to_string();
    }

    if let Ok(base_url) = Url::parse(base) {
        if matches!(base_url.scheme(), "http" | "https") {
            return base_url
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string());
        }
    }

    if href.starts_with('/') {
        return href.to_string();
    }

    let base = Path::new(base.trim_start_matches("file://"));
    let dir = base.parent().unwrap_or_else(|| Path::new(""));
    normalize(&dir.join(href)).to_string_lossy().to_string()
}

fn is_drive_path(href: &str) -> bool {
    let bytes = href.as_bytes();
    bytes.len() > 2 && bytes[0].is_ascii_uppercase() && bytes[1] == b':'
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_local_href() {
        assert_eq!(
            resolve_href("/data/stac/catalog.json", "./prism/collection.json"),
            "/data/stac/prism/collection.json"
        );
        assert_eq!(
            resolve_href("/data/stac/prism/collection.json", "../catalog.json"),
            "/data/stac/catalog.json"
        );
        assert_eq!(
            resolve_href("/data/stac/catalog.json", "s3://bucket/a.zarr"),
            "s3://bucket/a.zarr"
        );
    }

    #[test]
    fn test_resolve_remote_href() {
        assert_eq!(
            resolve_href("https://example.com/stac/catalog.json", "./prism/collection.json"),
            "https://example.com/stac/prism/collection.json"
        );
        assert_eq!(
            resolve_href("https://example.com/stac/catalog.json", "/other.json"),
            "https://example.com/other.json"
        );
    }

    #[test]
    fn test_assets_keep_document_order() {
        let doc = json!({
            "assets": {
                "zeta": {"href": "./z.zarr"},
                "alpha": {"href": "./a.nc"},
                "broken": {"title": "no href"}
            }
        });
        let assets = parse_assets(&doc, "/data/collection.json");
        let keys: Vec<&str> = assets.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(assets[0].1.href(), "/data/z.zarr");
    }

    #[tokio::test]
    async fn test_unreadable_child_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("catalog.json");
        std::fs::write(
            &root,
            json!({
                "type": "Catalog",
                "id": "root",
                "description": "root",
                "links": [
                    {"rel": "child", "href": "./missing/catalog.json"},
                    {"rel": "child", "href": "./good/catalog.json"}
                ]
            })
            .to_string(),
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("good")).unwrap();
        std::fs::write(
            dir.path().join("good/catalog.json"),
            json!({"type": "Catalog", "id": "good", "description": "", "links": []}).to_string(),
        )
        .unwrap();

        let node = StacReader::new()
            .read_catalog(root.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(node.id(), "root");
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].id(), "good");
    }
}
