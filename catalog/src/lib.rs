//! Metadata catalog for the projects of the OSS-Fuzz repository.
//!
//! Project names and files are read from GitHub, with a local JSON dataset as
//! fallback when GitHub cannot be reached. Assembled records are cached in
//! memory for bulk queries.

pub mod batch;
pub mod build_system;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod fallback;
pub mod fetcher;
pub mod github;
pub mod loader;
pub mod metrics_defs;
pub mod query;
pub mod types;

#[cfg(test)]
mod testutils;

pub use build_system::{BuildSystem, infer_build_system};
pub use catalog::{Catalog, CatalogError, ProjectQuery};
pub use types::{Fetched, ProjectFile, ProjectRecord, ProjectTable, Source};
