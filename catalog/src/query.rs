//! GraphQL document construction for fetching one file from many projects in a
//! single round trip.
//!
//! Every project becomes an aliased `object(expression: ...)` lookup under the
//! repository. Aliases must be valid GraphQL names, so project and file names
//! are passed through [`sanitize`] and the original names are kept alongside
//! the labels to map the response back.

use indexmap::IndexMap;

/// Replaces every character that cannot appear in a GraphQL alias with `_`.
///
/// Keeps ASCII alphanumerics and underscores, and replaces a leading digit
/// since names cannot start with one. The output has the same number of
/// characters as the input. Distinct inputs may map to the same output.
pub fn sanitize(identifier: &str) -> String {
    identifier
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let valid = c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit());
            if valid { c } else { '_' }
        })
        .collect()
}

/// One aliased file lookup inside the composite query.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryField {
    /// Alias the object is exposed under in the response.
    pub label: String,
    /// Git object expression, e.g. `HEAD:projects/zlib/build.sh`.
    pub expression: String,
    /// Alias of the blob's `text` field.
    pub result_label: String,
}

/// Typed builder for the composite repository query.
#[derive(Clone, Debug)]
pub struct ProjectFilesQuery {
    owner: String,
    repository: String,
    fields: Vec<QueryField>,
    // label -> original project name
    projects: IndexMap<String, String>,
}

impl ProjectFilesQuery {
    pub fn new<O, R>(owner: O, repository: R) -> Self
    where
        O: Into<String>,
        R: Into<String>,
    {
        ProjectFilesQuery {
            owner: owner.into(),
            repository: repository.into(),
            fields: Vec::new(),
            projects: IndexMap::new(),
        }
    }

    /// Requests `file_name` from `<projects_path>/<project>` at `reference` for
    /// each of the given projects.
    pub fn for_projects(
        mut self,
        reference: &str,
        projects_path: &str,
        project_names: &[String],
        file_name: &str,
    ) -> Self {
        let result_label = sanitize(file_name);
        for project in project_names {
            let expression = format!("{reference}:{projects_path}/{project}/{file_name}");
            self.add_field(project, expression, result_label.clone());
        }
        self
    }

    /// Adds a lookup for `project`. Labels are unique within the query: a
    /// sanitized name that is already taken gets a numeric suffix.
    pub fn add_field(&mut self, project: &str, expression: String, result_label: String) {
        let base = sanitize(project);
        let mut label = base.clone();
        let mut n = 2;
        while self.projects.contains_key(&label) {
            label = format!("{base}_{n}");
            n += 1;
        }

        self.projects.insert(label.clone(), project.to_string());
        self.fields.push(QueryField {
            label,
            expression,
            result_label,
        });
    }

    pub fn fields(&self) -> &[QueryField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Original project name for a response label.
    pub fn project_for_label(&self, label: &str) -> Option<&str> {
        self.projects.get(label).map(String::as_str)
    }

    /// Renders the GraphQL document.
    pub fn render(&self) -> String {
        let mut doc = format!(
            "{{\n  repository(owner: {}, name: {}) {{\n",
            quote(&self.owner),
            quote(&self.repository)
        );
        for field in &self.fields {
            doc.push_str(&format!(
                "    {}: object(expression: {}) {{\n",
                field.label,
                quote(&field.expression)
            ));
            doc.push_str("      ... on Blob {\n");
            doc.push_str(&format!("        {}: text\n", field.result_label));
            doc.push_str("      }\n");
            doc.push_str("    }\n");
        }
        doc.push_str("  }\n}");
        doc
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
