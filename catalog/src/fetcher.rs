//! Fetching with graceful degradation.
//!
//! Every operation first tries GitHub. On a transport failure (connection
//! error, timeout, non-2xx status, malformed response) the result is taken
//! from the fallback dataset instead and tagged `Source::Fallback`. A file
//! that genuinely does not exist is not a failure: it is returned as `None`.

use crate::batch::{BatchError, batches};
use crate::fallback::{
    FallbackDataset, FallbackError, FallbackProvider, file_from_dataset, files_from_dataset,
    names_from_dataset,
};
use crate::github::{GitHubClient, GitHubError};
use crate::metrics_defs::{FETCH_BATCH_DURATION, FETCH_FALLBACK};
use crate::types::Fetched;
use indexmap::IndexMap;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

/// File text per project name; `None` when the project has no such file.
pub type ProjectFiles = IndexMap<String, Option<String>>;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid batch configuration: {0}")]
    Batch(#[from] BatchError),

    #[error("GitHub request failed ({transport}) and the fallback dataset is unavailable: {fallback}")]
    Fallback {
        transport: GitHubError,
        fallback: FallbackError,
    },
}

pub struct ProjectFetcher {
    github: GitHubClient,
    fallback: Arc<dyn FallbackProvider>,
}

impl ProjectFetcher {
    pub fn new(github: GitHubClient, fallback: Arc<dyn FallbackProvider>) -> Self {
        ProjectFetcher { github, fallback }
    }

    pub async fn fetch_project_names(&self) -> Result<Fetched<Vec<String>>, FetchError> {
        match self.github.list_project_names().await {
            Ok(names) => Ok(Fetched::live(names)),
            Err(err) => {
                let dataset = self.load_fallback(err, "list_names").await?;
                Ok(Fetched::fallback(names_from_dataset(&dataset)))
            }
        }
    }

    pub async fn fetch_project_file(
        &self,
        project: &str,
        file_name: &str,
    ) -> Result<Fetched<Option<String>>, FetchError> {
        match self.github.fetch_project_file(project, file_name).await {
            Ok(text) => Ok(Fetched::live(text)),
            Err(err) => {
                let dataset = self.load_fallback(err, "fetch_file").await?;
                Ok(Fetched::fallback(file_from_dataset(
                    &dataset, project, file_name,
                )))
            }
        }
    }

    /// Fetches `file_name` for every project, one GraphQL call per batch.
    ///
    /// All or nothing: if any batch fails, results already fetched are dropped
    /// and every requested name is served from the fallback dataset.
    pub async fn fetch_project_files(
        &self,
        project_names: &[String],
        file_name: &str,
        batch_size: usize,
    ) -> Result<Fetched<ProjectFiles>, FetchError> {
        let batches = batches(project_names, batch_size)?;
        let total = batches.len();

        let mut files = ProjectFiles::with_capacity(project_names.len());
        for (index, batch) in batches.enumerate() {
            let start = Instant::now();
            match self.github.fetch_files_batch(batch, file_name).await {
                Ok(batch_files) => {
                    histogram!(FETCH_BATCH_DURATION).record(start.elapsed().as_secs_f64());
                    tracing::debug!(
                        file = file_name,
                        batch = index + 1,
                        total,
                        size = batch.len(),
                        "Fetched batch"
                    );
                    files.extend(batch_files);
                }
                Err(err) => {
                    let dataset = self.load_fallback(err, "fetch_files").await?;
                    return Ok(Fetched::fallback(files_from_dataset(
                        project_names,
                        file_name,
                        &dataset,
                    )));
                }
            }
        }

        Ok(Fetched::live(files))
    }

    async fn load_fallback(
        &self,
        transport: GitHubError,
        operation: &'static str,
    ) -> Result<FallbackDataset, FetchError> {
        tracing::warn!(
            error = %transport,
            operation,
            "GitHub request failed, falling back to the local dataset"
        );
        counter!(FETCH_FALLBACK, "operation" => operation).increment(1);

        self.fallback
            .load()
            .await
            .map_err(|fallback| FetchError::Fallback {
                transport,
                fallback,
            })
    }
}
