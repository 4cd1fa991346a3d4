use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("batch_size must be positive")]
    InvalidBatchSize,

    #[error("github.{0} cannot be empty")]
    EmptyField(&'static str),
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum FallbackStoreType {
    Filesystem { path: String },
    None,
}

impl Default for FallbackStoreType {
    fn default() -> Self {
        FallbackStoreType::Filesystem {
            path: "fallback.json".into(),
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct GitHub {
    pub api_url: Url,
    pub owner: String,
    pub repository: String,
    /// Git reference the project files are read at.
    pub reference: String,
    /// Directory holding one subdirectory per project.
    pub projects_path: String,
    /// Environment variable holding the bearer token for the GraphQL API.
    pub token_env: String,
    /// Upper bound for each batched GraphQL call. Single lookups are unbounded.
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl GitHub {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reads the token from the configured environment variable.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.is_empty())
    }
}

impl Default for GitHub {
    fn default() -> Self {
        GitHub {
            api_url: Url::parse("https://api.github.com").expect("static URL is valid"),
            owner: "google".into(),
            repository: "oss-fuzz".into(),
            reference: "HEAD".into(),
            projects_path: "projects".into(),
            token_env: "GITHUB_TOKEN".into(),
            request_timeout_secs: 30,
            user_agent: "ossfuzz-catalog".into(),
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub github: GitHub,
    pub batch_size: usize,
    pub fallback: FallbackStoreType,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            github: GitHub::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            fallback: FallbackStoreType::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.github.owner.is_empty() {
            return Err(ValidationError::EmptyField("owner"));
        }
        if self.github.repository.is_empty() {
            return Err(ValidationError::EmptyField("repository"));
        }
        if self.github.reference.is_empty() {
            return Err(ValidationError::EmptyField("reference"));
        }
        Ok(())
    }
}
