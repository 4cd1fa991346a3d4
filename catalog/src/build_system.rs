use serde::{Deserialize, Serialize};
use std::fmt;

/// Build tool inferred from a project's build script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    Cmake,
    Make,
    Ninja,
    Bazel,
    Unknown,
}

impl BuildSystem {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BuildSystem::Cmake => "cmake",
            BuildSystem::Make => "make",
            BuildSystem::Ninja => "ninja",
            BuildSystem::Bazel => "bazel",
            BuildSystem::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order, first match wins. "cmake" must come before "make".
const KEYWORDS: &[(&str, BuildSystem)] = &[
    ("cmake", BuildSystem::Cmake),
    ("make", BuildSystem::Make),
    ("ninja", BuildSystem::Ninja),
    ("bazel", BuildSystem::Bazel),
];

/// Keyword heuristic over the text of a build script. Not a parser: mentions in
/// comments or unrelated words count as matches.
pub fn infer_build_system(build_script: &str) -> BuildSystem {
    let text = build_script.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, build_system)| *build_system)
        .unwrap_or(BuildSystem::Unknown)
}
