use crate::build_system::BuildSystem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type ProjectName = String;

/// Records keyed by project name, in the order the projects were discovered.
pub type ProjectTable = IndexMap<ProjectName, ProjectRecord>;

/// Metadata assembled for a single project from its `project.yaml` and `build.sh`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    pub name: ProjectName,
    pub language: Option<String>,
    pub homepage: Option<String>,
    pub main_repo: Option<String>,
    pub primary_contact: Option<String>,
    pub vendor_ccs: Option<Vec<String>>,
    pub fuzzing_engines: Option<Vec<String>>,
    // None only when build.sh itself could not be obtained.
    pub build_system: Option<BuildSystem>,
    pub project_yaml: Option<String>,
    pub build_sh: Option<String>,
}

impl ProjectRecord {
    /// Raw text of one of the project's source files, if it was retained.
    pub fn file(&self, file: ProjectFile) -> Option<&str> {
        match file {
            ProjectFile::ProjectYaml => self.project_yaml.as_deref(),
            ProjectFile::BuildSh => self.build_sh.as_deref(),
        }
    }
}

/// The files fetched for every project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectFile {
    ProjectYaml,
    BuildSh,
}

impl ProjectFile {
    pub const fn file_name(&self) -> &'static str {
        match self {
            ProjectFile::ProjectYaml => "project.yaml",
            ProjectFile::BuildSh => "build.sh",
        }
    }
}

/// Where a piece of data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}

impl Source {
    /// Fallback wins: data assembled from any substituted input is not live.
    pub fn combine(self, other: Source) -> Source {
        match (self, other) {
            (Source::Live, Source::Live) => Source::Live,
            _ => Source::Fallback,
        }
    }
}

/// Result of a fetch, tagged with the source that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched<T> {
    pub source: Source,
    pub data: T,
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Fetched {
            source: Source::Live,
            data,
        }
    }

    pub fn fallback(data: T) -> Self {
        Fetched {
            source: Source::Fallback,
            data,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_combine() {
        assert_eq!(Source::Live.combine(Source::Live), Source::Live);
        assert_eq!(Source::Live.combine(Source::Fallback), Source::Fallback);
        assert_eq!(Source::Fallback.combine(Source::Live), Source::Fallback);
    }

    #[test]
    fn test_record_deserialize_partial() {
        let record: ProjectRecord = serde_json::from_value(serde_json::json!({
            "name": "ada-url",
            "language": "c++",
            "fuzzing_engines": ["libfuzzer", "afl"],
            "build_system": null,
        }))
        .unwrap();

        assert_eq!(record.name, "ada-url");
        assert_eq!(record.language.as_deref(), Some("c++"));
        assert_eq!(record.homepage, None);
        assert_eq!(record.build_system, None);
        assert_eq!(record.file(ProjectFile::BuildSh), None);
    }

    #[test]
    fn test_project_file_names() {
        assert_eq!(ProjectFile::ProjectYaml.file_name(), "project.yaml");
        assert_eq!(ProjectFile::BuildSh.file_name(), "build.sh");
    }
}
