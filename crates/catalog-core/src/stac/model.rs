//! In-memory STAC objects.

use std::sync::Arc;

use serde_json::{json, Map, Value};

/// Kind of a STAC object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StacKind {
    Catalog,
    Collection,
    Item,
}

impl StacKind {
    /// Classify a STAC JSON document by its `type` field.
    ///
    /// Documents predating the `type` field are told apart by their keys.
    pub fn of(doc: &Value) -> Self {
        match doc.get("type").and_then(Value::as_str) {
            Some("Collection") => Self::Collection,
            Some("Feature") => Self::Item,
            Some("Catalog") => Self::Catalog,
            _ if doc.get("extent").is_some() => Self::Collection,
            _ if doc.get("geometry").is_some() => Self::Item,
            _ => Self::Catalog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Collection => "Collection",
            Self::Item => "Feature",
        }
    }
}

/// An asset with its href made absolute.
#[derive(Debug, Clone)]
pub struct StacAsset {
    href: String,
    raw: Map<String, Value>,
}

impl StacAsset {
    pub fn new(href: impl Into<String>, raw: Map<String, Value>) -> Self {
        Self {
            href: href.into(),
            raw,
        }
    }

    /// Absolute location of the asset.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// The asset object as written in the document.
    pub fn to_dict(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

/// A STAC item and its assets in document order.
#[derive(Debug, Clone)]
pub struct StacItem {
    id: String,
    self_href: String,
    assets: Vec<(String, StacAsset)>,
}

impl StacItem {
    pub fn new(
        id: impl Into<String>,
        self_href: impl Into<String>,
        assets: Vec<(String, StacAsset)>,
    ) -> Self {
        Self {
            id: id.into(),
            self_href: self_href.into(),
            assets,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn self_href(&self) -> &str {
        &self.self_href
    }

    pub fn assets(&self) -> &[(String, StacAsset)] {
        &self.assets
    }
}

/// A STAC catalog or collection with its linked children and items loaded.
#[derive(Debug, Clone)]
pub struct StacNode {
    pub(crate) kind: StacKind,
    pub(crate) id: String,
    pub(crate) description: Option<String>,
    pub(crate) self_href: String,
    pub(crate) raw: Value,
    pub(crate) children: Vec<Arc<StacNode>>,
    pub(crate) items: Vec<StacItem>,
    pub(crate) assets: Vec<(String, StacAsset)>,
}

impl StacNode {
    /// A node with no links or assets.
    pub fn empty(kind: StacKind, id: impl Into<String>, self_href: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind,
            raw: json!({"type": kind.as_str(), "id": id, "links": []}),
            id,
            description: None,
            self_href: self_href.into(),
            children: Vec::new(),
            items: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn kind(&self) -> StacKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Absolute location the node was read from.
    pub fn self_href(&self) -> &str {
        &self.self_href
    }

    pub fn children(&self) -> &[Arc<StacNode>] {
        &self.children
    }

    pub fn items(&self) -> &[StacItem] {
        &self.items
    }

    pub fn get_item(&self, id: &str) -> Option<&StacItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Assets attached to the node itself (collections only).
    pub fn assets(&self) -> &[(String, StacAsset)] {
        &self.assets
    }

    pub fn get_asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, asset)| asset)
    }

    /// The document as read.
    pub fn to_dict(&self) -> Value {
        self.raw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(StacKind::of(&json!({"type": "Collection"})), StacKind::Collection);
        assert_eq!(StacKind::of(&json!({"type": "Feature"})), StacKind::Item);
        assert_eq!(StacKind::of(&json!({"type": "Catalog"})), StacKind::Catalog);
        assert_eq!(StacKind::of(&json!({"id": "x", "extent": {}})), StacKind::Collection);
        assert_eq!(StacKind::of(&json!({"id": "x"})), StacKind::Catalog);
    }

    #[test]
    fn test_empty_node_dict() {
        let node = StacNode::empty(StacKind::Collection, "prism", "/tmp/collection.json");
        assert_eq!(node.to_dict()["type"], "Collection");
        assert_eq!(node.to_dict()["id"], "prism");
        assert!(node.get_asset("anything").is_none());
    }
}
