//! Shared test fixtures for the catalog-server workspace.
//!
//! Catalog trees and Zarr stores are written to temporary directories that
//! are removed when the returned fixture is dropped.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{intake_tree, stac_tree};
//! ```

pub mod catalogs;
pub mod zarr;

pub use catalogs::*;
pub use zarr::*;
