//! Catalog introspection routes for one endpoint.
//!
//! Every node gets five routes under its prefix:
//! - `GET {prefix}/catalogs` - child catalog names
//! - `GET {prefix}/parent_catalog` - parent prefix, or a root marker
//! - `GET {prefix}/yaml` - catalog dump as `text/plain` YAML
//! - `GET {prefix}/json` - catalog dump as JSON
//! - `GET {prefix}/ui` - HTML summary page

mod intake;
mod stac;

pub use intake::IntakeRouter;
pub use stac::StacRouter;

use std::sync::Arc;

use array_server::ServingError;
use axum::{
    extract::Extension,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_core::{CatalogEndpoint, Result};
use serde_json::Value;

/// Returned by `parent_catalog` for the root node.
pub const ROOT_CATALOG_MESSAGE: &str = "This is the root catalog";

/// Introspection behaviour of one catalog format.
pub trait CatalogRouter: Send + Sync {
    fn catalog_type(&self) -> &'static str;

    /// YAML dump of the endpoint's native catalog.
    fn catalog_as_yaml(&self, endpoint: &CatalogEndpoint) -> Result<String>;

    /// JSON dump of the endpoint's native catalog.
    fn catalog_as_json(&self, endpoint: &CatalogEndpoint) -> Result<Value>;

    fn list_sub_catalogs(&self, endpoint: &CatalogEndpoint) -> Vec<String> {
        endpoint.sub_catalogs().to_vec()
    }

    /// Parent directory prefix: `/a/b` gives `/a/`.
    fn parent_catalog(&self, endpoint: &CatalogEndpoint) -> String {
        match endpoint.parent_path() {
            Some(parent) => parent.to_string(),
            None => ROOT_CATALOG_MESSAGE.to_string(),
        }
    }

    fn catalog_ui(&self, endpoint: &CatalogEndpoint) -> String {
        render_ui(self.catalog_type(), endpoint)
    }
}

/// A router that can be registered for a format key.
pub trait RouterImpl: CatalogRouter + Default + 'static {
    const CATALOG_TYPE: &'static str;
}

#[derive(Clone)]
struct CatalogRouteState {
    router: Arc<dyn CatalogRouter>,
    endpoint: Arc<CatalogEndpoint>,
}

/// Build the introspection routes for `endpoint`.
///
/// With `prefixed` the routes carry the endpoint's mount prefix, for merging
/// into the main application. Without it they sit at `/catalogs` etc., for
/// a sub-application that is itself mounted at the prefix.
pub fn build_catalog_router(
    router: Arc<dyn CatalogRouter>,
    endpoint: Arc<CatalogEndpoint>,
    prefixed: bool,
) -> Router {
    let prefix = if prefixed {
        endpoint.mount_prefix().to_string()
    } else {
        String::new()
    };
    let state = CatalogRouteState { router, endpoint };

    Router::new()
        .route(&format!("{}/catalogs", prefix), get(sub_catalogs_handler))
        .route(&format!("{}/parent_catalog", prefix), get(parent_catalog_handler))
        .route(&format!("{}/yaml", prefix), get(yaml_handler))
        .route(&format!("{}/json", prefix), get(json_handler))
        .route(&format!("{}/ui", prefix), get(ui_handler))
        .layer(Extension(state))
}

async fn sub_catalogs_handler(Extension(state): Extension<CatalogRouteState>) -> Json<Vec<String>> {
    Json(state.router.list_sub_catalogs(&state.endpoint))
}

async fn parent_catalog_handler(Extension(state): Extension<CatalogRouteState>) -> Json<String> {
    Json(state.router.parent_catalog(&state.endpoint))
}

async fn yaml_handler(Extension(state): Extension<CatalogRouteState>) -> Response {
    match state.router.catalog_as_yaml(&state.endpoint) {
        Ok(yaml) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], yaml).into_response(),
        Err(e) => ServingError::from(e).into_response(),
    }
}

async fn json_handler(Extension(state): Extension<CatalogRouteState>) -> Response {
    match state.router.catalog_as_json(&state.endpoint) {
        Ok(value) => Json(value).into_response(),
        Err(e) => ServingError::from(e).into_response(),
    }
}

async fn ui_handler(Extension(state): Extension<CatalogRouteState>) -> Html<String> {
    Html(state.router.catalog_ui(&state.endpoint))
}

fn render_ui(catalog_type: &str, endpoint: &CatalogEndpoint) -> String {
    let prefix = endpoint.mount_prefix();
    let title = escape_html(endpoint.catalog().name());

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title></head>\n<body>\n", title));
    html.push_str(&format!(
        "<h1>{}</h1>\n<p>{} catalog at <code>{}</code></p>\n",
        title,
        escape_html(catalog_type),
        escape_html(endpoint.catalog_path())
    ));

    if let Some(parent) = endpoint.parent_path() {
        let parent_ui = format!("{}ui", parent);
        html.push_str(&format!(
            "<p><a href=\"{0}\">parent catalog</a></p>\n",
            escape_html(&parent_ui)
        ));
    }

    if !endpoint.sub_catalogs().is_empty() {
        html.push_str("<h2>Catalogs</h2>\n<ul>\n");
        for name in endpoint.sub_catalogs() {
            let href = format!("{}/{}/ui", prefix, name);
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&href),
                escape_html(name)
            ));
        }
        html.push_str("</ul>\n");
    }

    if endpoint.contains_datasets() {
        html.push_str("<h2>Datasets</h2>\n<ul>\n");
        for id in endpoint.dataset_ids() {
            let href = format!("{}/datasets/{}", prefix, id);
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&href),
                escape_html(id)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str(&format!(
        "<p><a href=\"{0}/json\">json</a> | <a href=\"{0}/yaml\">yaml</a></p>\n</body>\n</html>\n",
        escape_html(prefix)
    ));
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::stac::{StacKind, StacNode};
    use catalog_core::{CatalogNode, DatasetEntries, InfoDict};

    fn endpoint(path: &str, ids: &[&str], subs: &[&str]) -> CatalogEndpoint {
        let node = CatalogNode::from(StacNode::empty(StacKind::Catalog, "a<b", "/tmp/catalog.json"));
        let mut entries = DatasetEntries::new();
        for id in ids {
            entries.push(*id, InfoDict::new());
        }
        CatalogEndpoint::new(
            node,
            path,
            entries,
            subs.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_parent_catalog() {
        let router = StacRouter;
        assert_eq!(router.parent_catalog(&endpoint("", &[], &[])), ROOT_CATALOG_MESSAGE);
        assert_eq!(router.parent_catalog(&endpoint("/a/b", &[], &[])), "/a/");
        assert_eq!(router.parent_catalog(&endpoint("/a", &[], &[])), "/");
    }

    #[test]
    fn test_list_sub_catalogs() {
        let ep = endpoint("/", &[], &["x", "y"]);
        assert_eq!(IntakeRouter.list_sub_catalogs(&ep), ["x", "y"]);
    }

    #[test]
    fn test_ui_escapes_and_links() {
        let html = StacRouter.catalog_ui(&endpoint("/a", &["d1"], &["child"]));
        assert!(html.contains("<h1>a&lt;b</h1>"));
        assert!(html.contains("href=\"/a/child/ui\""));
        assert!(html.contains("href=\"/a/datasets/d1\""));
        assert!(html.contains("href=\"/ui\">parent catalog"));
    }
}
