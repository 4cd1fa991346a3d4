//! Builds a `ProjectRecord` from the raw text of a project's `project.yaml`
//! and `build.sh`. Either file may be missing.

use crate::build_system::infer_build_system;
use crate::types::ProjectRecord;
use serde::Deserialize;
use serde_yaml::Value;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("invalid project.yaml for {project}: {source}")]
    InvalidProjectYaml {
        project: String,
        source: serde_yaml::Error,
    },

    #[error("project.yaml for {project} is not a mapping")]
    NotAMapping { project: String },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProjectYaml {
    language: Option<String>,
    homepage: Option<String>,
    main_repo: Option<String>,
    primary_contact: Option<String>,
    vendor_ccs: Option<Vec<String>>,
    fuzzing_engines: Option<Vec<String>>,
}

fn parse_project_yaml(project: &str, text: &str) -> Result<ProjectYaml, LoadError> {
    let invalid = |source| LoadError::InvalidProjectYaml {
        project: project.to_string(),
        source,
    };

    if text.trim().is_empty() {
        return Ok(ProjectYaml::default());
    }

    match serde_yaml::from_str::<Value>(text).map_err(invalid)? {
        Value::Null => Ok(ProjectYaml::default()),
        value @ Value::Mapping(_) => serde_yaml::from_value(value).map_err(invalid),
        _ => Err(LoadError::NotAMapping {
            project: project.to_string(),
        }),
    }
}

/// Merges the two files of a project into one record.
///
/// A missing `project.yaml` is treated as an empty document. A missing
/// `build.sh` leaves `build_system` unset, which is different from a build
/// script that is present but not recognized (`BuildSystem::Unknown`).
pub fn load_project_from_files(
    project: &str,
    project_yaml: Option<&str>,
    build_sh: Option<&str>,
) -> Result<ProjectRecord, LoadError> {
    let metadata = parse_project_yaml(project, project_yaml.unwrap_or_default())?;

    Ok(ProjectRecord {
        name: project.to_string(),
        language: metadata.language,
        homepage: metadata.homepage,
        main_repo: metadata.main_repo,
        primary_contact: metadata.primary_contact,
        vendor_ccs: metadata.vendor_ccs,
        fuzzing_engines: metadata.fuzzing_engines,
        build_system: build_sh.map(infer_build_system),
        project_yaml: project_yaml.map(str::to_string),
        build_sh: build_sh.map(str::to_string),
    })
}
