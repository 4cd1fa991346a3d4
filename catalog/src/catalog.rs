use crate::batch::BatchError;
use crate::cache::ProjectCache;
use crate::config::{Config, FallbackStoreType, ValidationError};
use crate::fallback::{FallbackProvider, FilesystemFallbackProvider, NoopFallbackProvider};
use crate::fetcher::{FetchError, ProjectFetcher};
use crate::github::{GitHubClient, GitHubError};
use crate::loader::{LoadError, load_project_from_files};
use crate::types::{Fetched, ProjectFile, ProjectRecord, ProjectTable, Source};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("could not build GitHub client: {0}")]
    Client(#[from] GitHubError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<BatchError> for CatalogError {
    fn from(err: BatchError) -> Self {
        CatalogError::Fetch(FetchError::Batch(err))
    }
}

/// Keyword criteria for `Catalog::match_projects`. Unset fields are ignored.
///
/// String fields match when the record's value contains the keyword. List
/// fields match when the record's list contains the keyword as an element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectQuery {
    pub name: Option<String>,
    pub language: Option<String>,
    pub homepage: Option<String>,
    pub main_repo: Option<String>,
    pub primary_contact: Option<String>,
    pub vendor_cc: Option<String>,
    pub fuzzing_engine: Option<String>,
    pub build_system: Option<String>,
}

impl ProjectQuery {
    pub fn matches(&self, project: &ProjectRecord) -> bool {
        fn contains(value: Option<&str>, keyword: &Option<String>) -> bool {
            match keyword {
                Some(keyword) => value.is_some_and(|value| value.contains(keyword.as_str())),
                None => true,
            }
        }

        fn includes(values: &Option<Vec<String>>, keyword: &Option<String>) -> bool {
            match keyword {
                Some(keyword) => values
                    .as_ref()
                    .is_some_and(|values| values.iter().any(|value| value == keyword)),
                None => true,
            }
        }

        contains(Some(&project.name), &self.name)
            && contains(project.language.as_deref(), &self.language)
            && contains(project.homepage.as_deref(), &self.homepage)
            && contains(project.main_repo.as_deref(), &self.main_repo)
            && contains(project.primary_contact.as_deref(), &self.primary_contact)
            && includes(&project.vendor_ccs, &self.vendor_cc)
            && includes(&project.fuzzing_engines, &self.fuzzing_engine)
            && contains(
                project.build_system.as_ref().map(|b| b.as_str()),
                &self.build_system,
            )
    }
}

/// Entry point for project metadata.
///
/// Bulk reads (`get_projects`, `filter_projects`, `match_projects`) are served
/// from the cache, which is populated by `cache_projects` the first time a
/// read finds it unloaded, and report the source the cache was built from.
/// `list_projects` and `get_project` always go to GitHub.
pub struct Catalog {
    fetcher: ProjectFetcher,
    cache: ProjectCache,
    batch_size: usize,
}

impl Catalog {
    pub fn new(fetcher: ProjectFetcher, batch_size: usize) -> Result<Self, CatalogError> {
        if batch_size == 0 {
            return Err(BatchError::InvalidSize(batch_size).into());
        }

        Ok(Catalog {
            fetcher,
            cache: ProjectCache::new(),
            batch_size,
        })
    }

    /// Builds a catalog from configuration. The GitHub token is read from the
    /// configured environment variable here.
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        config.validate()?;

        let token = config.github.token();
        if token.is_none() {
            tracing::warn!(
                env = %config.github.token_env,
                "No GitHub token set, batched queries will be rejected and served from the fallback dataset"
            );
        }

        let github = GitHubClient::new(&config.github, token)?;
        let fallback: Arc<dyn FallbackProvider> = match &config.fallback {
            FallbackStoreType::Filesystem { path } => {
                Arc::new(FilesystemFallbackProvider::new(path))
            }
            FallbackStoreType::None => Arc::new(NoopFallbackProvider {}),
        };

        Catalog::new(ProjectFetcher::new(github, fallback), config.batch_size)
    }

    pub fn cache(&self) -> &ProjectCache {
        &self.cache
    }

    /// Names of the projects, up to `limit`.
    pub async fn list_projects(
        &self,
        limit: Option<usize>,
    ) -> Result<Fetched<Vec<String>>, CatalogError> {
        let mut names = self.fetcher.fetch_project_names().await?;
        if let Some(limit) = limit {
            names.data.truncate(limit);
        }
        Ok(names)
    }

    /// Fetches and assembles a single project, bypassing the cache.
    pub async fn get_project(&self, name: &str) -> Result<Fetched<ProjectRecord>, CatalogError> {
        let project_yaml = self
            .fetcher
            .fetch_project_file(name, ProjectFile::ProjectYaml.file_name())
            .await?;
        let build_sh = self
            .fetcher
            .fetch_project_file(name, ProjectFile::BuildSh.file_name())
            .await?;

        let record = load_project_from_files(
            name,
            project_yaml.data.as_deref(),
            build_sh.data.as_deref(),
        )?;
        Ok(Fetched {
            source: project_yaml.source.combine(build_sh.source),
            data: record,
        })
    }

    /// Fetches every project (or the first `limit`) in batches and replaces the
    /// cache with the result. On error the previous cache content is kept.
    ///
    /// Returns `Source::Fallback` if any of the underlying fetches had to fall
    /// back to the local dataset.
    pub async fn cache_projects(&self, limit: Option<usize>) -> Result<Source, CatalogError> {
        tracing::info!("Fetching project data, this can take a while (only done once)");
        let names = self.list_projects(limit).await?;

        tracing::info!(projects = names.data.len(), "Fetching build scripts");
        let build_files = self
            .fetcher
            .fetch_project_files(
                &names.data,
                ProjectFile::BuildSh.file_name(),
                self.batch_size,
            )
            .await?;

        tracing::info!(projects = names.data.len(), "Fetching project metadata");
        let yaml_files = self
            .fetcher
            .fetch_project_files(
                &names.data,
                ProjectFile::ProjectYaml.file_name(),
                self.batch_size,
            )
            .await?;

        let mut table = ProjectTable::with_capacity(names.data.len());
        for name in &names.data {
            let project_yaml = yaml_files.data.get(name).and_then(Option::as_deref);
            let build_sh = build_files.data.get(name).and_then(Option::as_deref);
            let record = load_project_from_files(name, project_yaml, build_sh)?;
            table.insert(name.clone(), record);
        }

        let source = names
            .source
            .combine(build_files.source)
            .combine(yaml_files.source);
        tracing::info!(projects = table.len(), ?source, "Caching complete");

        self.cache.replace_all(table, source);
        Ok(source)
    }

    /// Populates the cache unless a load already completed since the last
    /// clear. Performs network I/O in that case. Returns the cached table with
    /// the source it was built from.
    pub async fn ensure_loaded(
        &self,
        limit: Option<usize>,
    ) -> Result<Fetched<Arc<ProjectTable>>, CatalogError> {
        if let Some(loaded) = self.cache.loaded() {
            return Ok(loaded);
        }

        let source = self.cache_projects(limit).await?;
        Ok(Fetched {
            source,
            data: self.cache.snapshot(),
        })
    }

    /// All cached projects. `limit` only applies when the cache has to be loaded.
    pub async fn get_projects(
        &self,
        limit: Option<usize>,
    ) -> Result<Fetched<Arc<ProjectTable>>, CatalogError> {
        self.ensure_loaded(limit).await
    }

    /// Cached projects for which `predicate` holds, in cache order.
    pub async fn filter_projects<F>(
        &self,
        predicate: F,
        limit: Option<usize>,
    ) -> Result<Fetched<ProjectTable>, CatalogError>
    where
        F: Fn(&ProjectRecord) -> bool,
    {
        let loaded = self.ensure_loaded(limit).await?;
        Ok(Fetched {
            source: loaded.source,
            data: loaded
                .data
                .iter()
                .filter(|(_, project)| predicate(project))
                .map(|(name, project)| (name.clone(), project.clone()))
                .collect(),
        })
    }

    /// Cached projects matching every criterion set in `query`.
    pub async fn match_projects(
        &self,
        query: &ProjectQuery,
        limit: Option<usize>,
    ) -> Result<Fetched<ProjectTable>, CatalogError> {
        self.filter_projects(|project| query.matches(project), limit)
            .await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
