//! The fallback provider supplies a previously captured copy of the project
//! records, so listing and fetching keep working when GitHub is unreachable
//! or rate limited. Data served from it is never as fresh as a live fetch.

use crate::query::sanitize;
use crate::types::{ProjectFile, ProjectRecord};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::io;
use std::path::{Path, PathBuf};

/// Project records keyed by name, in file order.
pub type FallbackDataset = IndexMap<String, ProjectRecord>;

#[derive(thiserror::Error, Debug)]
pub enum FallbackError {
    #[error("I/O error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait FallbackProvider: Send + Sync {
    async fn load(&self) -> Result<FallbackDataset, FallbackError>;
}

// Provider with no data, for running without a fallback file.
pub struct NoopFallbackProvider {}

#[async_trait]
impl FallbackProvider for NoopFallbackProvider {
    async fn load(&self) -> Result<FallbackDataset, FallbackError> {
        tracing::warn!("Loading projects from the no-op fallback provider, no data is available");
        Ok(FallbackDataset::new())
    }
}

/// JSON file mapping project names to records.
pub struct FilesystemFallbackProvider {
    path: PathBuf,
}

impl FilesystemFallbackProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FilesystemFallbackProvider {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FallbackProvider for FilesystemFallbackProvider {
    async fn load(&self) -> Result<FallbackDataset, FallbackError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FallbackError::Io {
                path: self.path.clone(),
                source,
            })?;
        let dataset: FallbackDataset = serde_json::from_slice(&bytes)?;

        tracing::debug!(path = ?self.path, projects = dataset.len(), "Loaded fallback dataset");
        Ok(dataset)
    }
}

pub fn names_from_dataset(dataset: &FallbackDataset) -> Vec<String> {
    dataset.keys().cloned().collect()
}

/// Raw text of `file_name` for `project`, read from the record field named
/// after the sanitized file name. `None` if the project or the file is missing.
pub fn file_from_dataset(dataset: &FallbackDataset, project: &str, file_name: &str) -> Option<String> {
    let record = dataset.get(project)?;
    let file = match sanitize(file_name).as_str() {
        "project_yaml" => ProjectFile::ProjectYaml,
        "build_sh" => ProjectFile::BuildSh,
        _ => return None,
    };
    record.file(file).map(str::to_string)
}

/// Same shape as a live bulk fetch: one entry per requested name, in order.
pub fn files_from_dataset(
    project_names: &[String],
    file_name: &str,
    dataset: &FallbackDataset,
) -> IndexMap<String, Option<String>> {
    project_names
        .iter()
        .map(|name| (name.clone(), file_from_dataset(dataset, name, file_name)))
        .collect()
}
