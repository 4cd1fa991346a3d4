//! Live transport: the GitHub REST contents API for single lookups and the
//! GraphQL API for batched file retrieval.

use crate::config;
use crate::metrics_defs::GITHUB_REQUESTS;
use crate::query::ProjectFilesQuery;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use indexmap::IndexMap;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use shared::counter;
use std::collections::HashMap;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum GitHubError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("file content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
}

#[derive(Deserialize)]
struct ContentFile {
    #[serde(default)]
    content: String,
}

// label -> { result label -> text }, null when the expression does not resolve
type RepositoryObjects = HashMap<String, Option<HashMap<String, Option<String>>>>;

#[derive(Deserialize)]
struct GraphQlData {
    repository: Option<RepositoryObjects>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlErrorEntry>>,
}

pub struct GitHubClient {
    client: reqwest::Client,
    api_url: Url,
    owner: String,
    repository: String,
    reference: String,
    projects_path: String,
    token: Option<String>,
    bulk_timeout: Duration,
}

impl GitHubClient {
    pub fn new(config: &config::GitHub, token: Option<String>) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(GitHubClient {
            client,
            api_url: config.api_url.clone(),
            owner: config.owner.clone(),
            repository: config.repository.clone(),
            reference: config.reference.clone(),
            projects_path: config.projects_path.clone(),
            token,
            bulk_timeout: config.request_timeout(),
        })
    }

    /// Lists the project directory names. Only the first page of the listing
    /// is read; the contents API does not paginate below 1000 entries.
    pub async fn list_project_names(&self) -> Result<Vec<String>, GitHubError> {
        let url = self.contents_url(&[])?;
        counter!(GITHUB_REQUESTS, "endpoint" => "contents").increment(1);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(GitHubError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let entries = response.json::<Vec<ContentEntry>>().await?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Fetches one file of one project. `Ok(None)` means the file does not exist.
    pub async fn fetch_project_file(
        &self,
        project: &str,
        file_name: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = self.contents_url(&[project, file_name])?;
        counter!(GITHUB_REQUESTS, "endpoint" => "contents").increment(1);

        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(GitHubError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            _ => {}
        }

        let file = response.json::<ContentFile>().await?;
        decode_content(&file.content).map(Some)
    }

    /// Fetches `file_name` for every project in one GraphQL call. The result has
    /// an entry for each requested name, in request order.
    pub async fn fetch_files_batch(
        &self,
        project_names: &[String],
        file_name: &str,
    ) -> Result<IndexMap<String, Option<String>>, GitHubError> {
        let query = ProjectFilesQuery::new(&self.owner, &self.repository).for_projects(
            &self.reference,
            &self.projects_path,
            project_names,
            file_name,
        );

        let url = self.endpoint(&["graphql"])?;
        counter!(GITHUB_REQUESTS, "endpoint" => "graphql").increment(1);

        let mut request = self
            .client
            .post(url.clone())
            .timeout(self.bulk_timeout)
            .json(&serde_json::json!({ "query": query.render() }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GitHubError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response.json::<GraphQlResponse>().await?;
        let objects = match body.data.and_then(|data| data.repository) {
            Some(objects) => objects,
            None => {
                let messages: Vec<String> = body
                    .errors
                    .unwrap_or_default()
                    .into_iter()
                    .map(|e| e.message)
                    .collect();
                return Err(GitHubError::GraphQl(if messages.is_empty() {
                    "response has no repository data".into()
                } else {
                    messages.join("; ")
                }));
            }
        };

        Ok(files_from_objects(&query, &objects))
    }

    fn contents_url(&self, extra: &[&str]) -> Result<Url, GitHubError> {
        let mut segments: Vec<&str> = vec![
            "repos",
            self.owner.as_str(),
            self.repository.as_str(),
            "contents",
        ];
        segments.extend(self.projects_path.split('/').filter(|s| !s.is_empty()));
        segments.extend_from_slice(extra);
        self.endpoint(&segments)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// The contents API wraps base64 at 60 columns.
fn decode_content(content: &str) -> Result<String, GitHubError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

// A null object, a non-blob object (empty map), a null text field and a missing
// label all normalize to None.
fn files_from_objects(
    query: &ProjectFilesQuery,
    objects: &RepositoryObjects,
) -> IndexMap<String, Option<String>> {
    query
        .fields()
        .iter()
        .filter_map(|field| {
            let project = query.project_for_label(&field.label)?;
            let text = objects
                .get(&field.label)
                .and_then(Option::as_ref)
                .and_then(|blob| blob.get(&field.result_label))
                .and_then(Option::clone);
            Some((project.to_string(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{github_config, names};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&github_config(&server.uri()), Some("test-token".into())).unwrap()
    }

    #[tokio::test]
    async fn test_list_project_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/google/oss-fuzz/contents/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "abseil-cpp", "type": "dir"},
                {"name": "abseil-py", "type": "dir"},
                {"name": "ada-url", "type": "dir"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let names = client(&server).list_project_names().await.unwrap();
        assert_eq!(names, vec!["abseil-cpp", "abseil-py", "ada-url"]);
    }

    #[tokio::test]
    async fn test_list_project_names_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = client(&server).list_project_names().await;
        assert!(matches!(
            result,
            Err(GitHubError::Status {
                status: StatusCode::FORBIDDEN,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_project_file() {
        let server = MockServer::start().await;
        let encoded = STANDARD.encode("language: c++\nhomepage: abseil.io\n");
        // Wrapped the way the contents API returns it.
        let (head, tail) = encoded.split_at(16);
        Mock::given(method("GET"))
            .and(path(
                "/repos/google/oss-fuzz/contents/projects/abseil-cpp/project.yaml",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "project.yaml",
                "encoding": "base64",
                "content": format!("{head}\n{tail}\n"),
            })))
            .mount(&server)
            .await;

        let text = client(&server)
            .fetch_project_file("abseil-cpp", "project.yaml")
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("language: c++\nhomepage: abseil.io\n"));
    }

    #[tokio::test]
    async fn test_fetch_project_file_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let text = client(&server)
            .fetch_project_file("ada-url", "build.sh")
            .await
            .unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_fetch_project_file_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = client(&server).fetch_project_file("ada-url", "build.sh").await;
        assert!(matches!(result, Err(GitHubError::Status { .. })));
    }

    #[tokio::test]
    async fn test_fetch_files_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains(
                r#"abseil_cpp: object(expression: \"HEAD:projects/abseil-cpp/build.sh\")"#,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "repository": {
                        "abseil_cpp": {"build_sh": "cmake .."},
                        "ada_url": null,
                        "adal": {},
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let requested = names(&["abseil-cpp", "ada-url", "adal", "aiohttp"]);
        let files = client(&server)
            .fetch_files_batch(&requested, "build.sh")
            .await
            .unwrap();

        let keys: Vec<&String> = files.keys().collect();
        assert_eq!(keys, vec!["abseil-cpp", "ada-url", "adal", "aiohttp"]);
        assert_eq!(files["abseil-cpp"].as_deref(), Some("cmake .."));
        assert_eq!(files["ada-url"], None);
        assert_eq!(files["adal"], None);
        assert_eq!(files["aiohttp"], None);
    }

    #[tokio::test]
    async fn test_fetch_files_batch_graphql_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{"message": "API rate limit exceeded"}],
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .fetch_files_batch(&names(&["zlib"]), "build.sh")
            .await;
        match result {
            Err(GitHubError::GraphQl(message)) => assert!(message.contains("rate limit")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_files_batch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({"data": {"repository": {}}})),
            )
            .mount(&server)
            .await;

        let mut config = github_config(&server.uri());
        config.request_timeout_secs = 1;
        let client = GitHubClient::new(&config, None).unwrap();

        let result = client.fetch_files_batch(&names(&["zlib"]), "build.sh").await;
        assert!(matches!(result, Err(GitHubError::Reqwest(e)) if e.is_timeout()));
    }

    #[test]
    fn test_decode_content() {
        assert_eq!(decode_content("aGVs\nbG8=\n").unwrap(), "hello");
        assert_eq!(decode_content("").unwrap(), "");
        assert!(matches!(decode_content("!!"), Err(GitHubError::Base64(_))));
        let invalid_utf8 = STANDARD.encode([0xff, 0xfe]);
        assert!(matches!(
            decode_content(&invalid_utf8),
            Err(GitHubError::Utf8(_))
        ));
    }
}
