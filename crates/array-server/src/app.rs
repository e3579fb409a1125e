//! A dataset-serving sub-application.

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};
use tracing::{debug, info};

use crate::error::ServingError;
use crate::plugin::ServingPlugin;
use crate::provider::{DatasetDeps, DatasetProvider};

/// One provider plus the plugins serving its datasets.
///
/// Plugin names are unique; the first registration of a name wins.
pub struct ServingApp {
    title: String,
    provider_name: String,
    deps: DatasetDeps,
    plugins: Vec<Box<dyn ServingPlugin>>,
    routers: Vec<Router>,
}

impl ServingApp {
    pub fn new(
        title: impl Into<String>,
        provider_name: impl Into<String>,
        provider: Arc<dyn DatasetProvider>,
    ) -> Self {
        Self {
            title: title.into(),
            provider_name: provider_name.into(),
            deps: DatasetDeps::new(provider),
            plugins: Vec::new(),
            routers: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Registered names: the provider first, then plugins in order.
    pub fn plugin_names(&self) -> Vec<&str> {
        std::iter::once(self.provider_name.as_str())
            .chain(self.plugins.iter().map(|p| p.name()))
            .collect()
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugin_names().contains(&name)
    }

    /// Add a plugin. A name already taken is rejected and the app unchanged.
    pub fn register_plugin(&mut self, plugin: Box<dyn ServingPlugin>) -> Result<(), ServingError> {
        if self.has_plugin(plugin.name()) {
            return Err(ServingError::PluginConflict(plugin.name().to_string()));
        }
        debug!(app = %self.title, plugin = %plugin.name(), "Registered serving plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Attach a router that needs no dataset access.
    pub fn include_router(&mut self, router: Router) {
        self.routers.push(router);
    }

    pub fn into_router(self) -> Router {
        let mut app = Router::new().route("/datasets", get(list_datasets_handler));
        for plugin in &self.plugins {
            app = app.merge(plugin.dataset_router());
        }
        let mut app = app.layer(Extension(self.deps));

        for router in self.routers {
            app = app.merge(router);
        }

        info!(
            app = %self.title,
            plugins = ?self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Built serving app"
        );
        app
    }
}

/// GET /datasets
async fn list_datasets_handler(Extension(deps): Extension<DatasetDeps>) -> Json<Vec<String>> {
    Json(deps.dataset_ids())
}
