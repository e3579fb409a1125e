//! Dataset-serving sub-applications.
//!
//! A [`ServingApp`] exposes the datasets of one [`DatasetProvider`] under
//! `/datasets`, with further routes contributed by named [`ServingPlugin`]s.

pub mod app;
pub mod error;
pub mod plugin;
pub mod provider;

pub use app::ServingApp;
pub use error::ServingError;
pub use plugin::{builtin_plugin, DatasetInfoPlugin, ServingPlugin, DATASET_INFO};
pub use provider::{DatasetDeps, DatasetProvider};
