use crate::build_system::BuildSystem;
use crate::config;
use crate::query::sanitize;
use crate::types::ProjectRecord;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub fn github_config(uri: &str) -> config::GitHub {
    config::GitHub {
        api_url: Url::parse(uri).unwrap(),
        ..Default::default()
    }
}

pub fn fallback_records() -> Vec<ProjectRecord> {
    vec![
        ProjectRecord {
            name: "abseil-cpp".into(),
            language: Some("c++".into()),
            homepage: Some("abseil.io".into()),
            main_repo: Some("https://github.com/abseil/abseil-cpp.git".into()),
            primary_contact: Some("dmauro@google.com".into()),
            vendor_ccs: None,
            fuzzing_engines: None,
            build_system: Some(BuildSystem::Bazel),
            project_yaml: Some("homepage: abseil.io\nlanguage: c++\n".into()),
            build_sh: Some("#!/bin/bash -eu\nbazel build //absl/...".into()),
        },
        ProjectRecord {
            name: "abseil-py".into(),
            language: Some("python".into()),
            homepage: Some("https://github.com/abseil/abseil-py".into()),
            main_repo: Some("https://github.com/abseil/abseil-py".into()),
            primary_contact: None,
            vendor_ccs: Some(vec!["david@adalogics.com".into()]),
            fuzzing_engines: Some(vec!["libfuzzer".into()]),
            build_system: Some(BuildSystem::Unknown),
            project_yaml: Some("fuzzing_engines:\n  - libfuzzer\nlanguage: python\n".into()),
            build_sh: Some("#!/bin/bash -eu\npip3 install .".into()),
        },
        ProjectRecord {
            name: "ada-url".into(),
            language: Some("c++".into()),
            homepage: Some("https://ada-url.github.io/ada".into()),
            main_repo: Some("https://github.com/ada-url/ada.git".into()),
            primary_contact: Some("yagiz@nizipli.com".into()),
            vendor_ccs: None,
            fuzzing_engines: Some(vec![
                "libfuzzer".into(),
                "afl".into(),
                "honggfuzz".into(),
                "centipede".into(),
            ]),
            build_system: None,
            project_yaml: Some("homepage: https://ada-url.github.io/ada\nlanguage: c++\n".into()),
            build_sh: None,
        },
    ]
}

/// Writes the records as a fallback JSON file. Keep the TempDir alive while the
/// file is in use.
pub fn write_fallback_file(records: &[ProjectRecord]) -> (tempfile::TempDir, PathBuf) {
    let dataset: indexmap::IndexMap<&str, &ProjectRecord> = records
        .iter()
        .map(|record| (record.name.as_str(), record))
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fallback.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&dataset).unwrap()).unwrap();
    (dir, path)
}

/// Answers composite file queries from an in-memory repository, the way the
/// GraphQL API would: one aliased entry per requested project, null when the
/// file does not exist.
pub struct RepositoryResponder {
    // (project, file name) -> text
    files: HashMap<(String, String), String>,
}

impl RepositoryResponder {
    pub fn new(files: &[(&str, &str, &str)]) -> Self {
        RepositoryResponder {
            files: files
                .iter()
                .map(|(project, file, text)| {
                    ((project.to_string(), file.to_string()), text.to_string())
                })
                .collect(),
        }
    }
}

impl Respond for RepositoryResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let query = body["query"].as_str().unwrap();

        let mut repository = serde_json::Map::new();
        for line in query.lines() {
            let Some((label, rest)) = line.trim().split_once(": object(expression: \"") else {
                continue;
            };
            let expression = rest.trim_end_matches("\") {");
            // HEAD:projects/<project>/<file>
            let path = expression.split_once(':').unwrap().1;
            let mut parts = path.rsplitn(3, '/');
            let file = parts.next().unwrap();
            let project = parts.next().unwrap();

            let value = match self.files.get(&(project.to_string(), file.to_string())) {
                Some(text) => {
                    let mut blob = serde_json::Map::new();
                    blob.insert(sanitize(file), serde_json::Value::String(text.clone()));
                    serde_json::Value::Object(blob)
                }
                None => serde_json::Value::Null,
            };
            repository.insert(label.to_string(), value);
        }

        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "data": { "repository": repository } }))
    }
}

pub async fn mount_project_listing(server: &MockServer, projects: &[&str]) {
    let entries: Vec<serde_json::Value> = projects
        .iter()
        .map(|name| serde_json::json!({ "name": name, "type": "dir" }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/google/oss-fuzz/contents/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}
