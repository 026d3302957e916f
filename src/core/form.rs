//! Form file validation against the forms JSON schema (Draft 4).

use jsonschema::{Draft, JSONSchema};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Error, Result};
use crate::paths;
use crate::project;
use crate::utils::io;

pub const SCHEMA_ENV_VAR: &str = "SKILL4D_FORMS_SCHEMA";
pub const SCHEMA_FILE_NAME: &str = "formsSchema.json";
pub const FORM_FILE_NAME: &str = "form.4DForm";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    pub form: String,
    pub schema: String,
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFormsValidation {
    pub root: String,
    pub schema: String,
    pub total: usize,
    pub invalid: usize,
    pub forms: Vec<FormValidation>,
}

/// A compiled schema plus the file it came from.
pub struct FormSchema {
    path: PathBuf,
    compiled: JSONSchema,
}

impl FormSchema {
    /// Resolve (see [`resolve_schema_path`]) and compile the schema.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_schema_path(explicit)?;
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let document = io::read_json(path)?;
        Self::compile(path.to_path_buf(), &document)
    }

    pub fn compile(path: PathBuf, document: &Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft4)
            .compile(document)
            .map_err(|e| {
                Error::validation_invalid_argument(
                    "schema",
                    format!("Schema does not compile: {}", e),
                    Some(path.display().to_string()),
                    None,
                )
            })?;

        Ok(Self { path, compiled })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every violation as `"<a -> b -> 0>: <message>"`, `root` for the document itself.
    pub fn errors_for(&self, instance: &Value) -> Vec<String> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|error| {
                    format!(
                        "{}: {}",
                        display_path(&error.instance_path.to_string()),
                        error
                    )
                })
                .collect(),
        }
    }

    pub fn validate_file(&self, form: &Path) -> Result<FormValidation> {
        if !form.is_file() {
            return Err(Error::form_not_found(form.display().to_string()));
        }

        let instance = io::read_json(form)?;
        let errors = self.errors_for(&instance);

        Ok(FormValidation {
            form: form.display().to_string(),
            schema: self.path.display().to_string(),
            valid: errors.is_empty(),
            error_count: errors.len(),
            errors,
        })
    }
}

/// Schema lookup: explicit path, `SKILL4D_FORMS_SCHEMA`, config
/// `formsSchemaPath`, then the bundled `assets/formsSchema.json`.
pub fn resolve_schema_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let configured = defaults::load_config().forms_schema_path();
    paths::resolve_asset(explicit, SCHEMA_ENV_VAR, configured, SCHEMA_FILE_NAME)
        .map_err(Error::schema_not_found)
}

/// Validate one form file.
pub fn validate(form: &Path, schema: Option<&Path>) -> Result<FormValidation> {
    if !form.is_file() {
        return Err(Error::form_not_found(form.display().to_string()));
    }
    let schema = FormSchema::load(schema)?;
    schema.validate_file(form)
}

/// Validate every form of the project containing `start`.
///
/// A form that is not valid JSON is reported as invalid instead of aborting
/// the whole run.
pub fn validate_all(start: Option<&Path>, schema: Option<&Path>) -> Result<ProjectFormsValidation> {
    let layout = project::locate(start)?;
    let schema = FormSchema::load(schema)?;

    let mut forms = Vec::new();
    for form in project_forms(&layout.root) {
        let result = match schema.validate_file(&form) {
            Ok(result) => result,
            Err(err) => {
                let detail = err
                    .details
                    .get("error")
                    .and_then(Value::as_str)
                    .map(|d| format!("{}: {}", err.message, d))
                    .unwrap_or(err.message);
                FormValidation {
                    form: form.display().to_string(),
                    schema: schema.path().display().to_string(),
                    valid: false,
                    error_count: 1,
                    errors: vec![format!("root: {}", detail)],
                }
            }
        };
        forms.push(result);
    }

    let invalid = forms.iter().filter(|f| !f.valid).count();
    crate::log_status!("form", "{} forms checked, {} invalid", forms.len(), invalid);

    Ok(ProjectFormsValidation {
        root: layout.root.display().to_string(),
        schema: schema.path().display().to_string(),
        total: forms.len(),
        invalid,
        forms,
    })
}

/// Project and table form files, sorted.
pub fn project_forms(root: &Path) -> Vec<PathBuf> {
    let sources = project::ProjectLayout::new(root).sources_dir();
    let base = glob::Pattern::escape(&sources.to_string_lossy());

    let mut forms: Vec<PathBuf> = [
        format!("{}/Forms/*/{}", base, FORM_FILE_NAME),
        format!("{}/TableForms/*/*/{}", base, FORM_FILE_NAME),
    ]
    .iter()
    .filter_map(|pattern| glob::glob(pattern).ok())
    .flat_map(|paths| paths.flatten())
    .filter(|p| p.is_file())
    .collect();

    forms.sort();
    forms
}

fn display_path(pointer: &str) -> String {
    let segments: Vec<&str> = pointer.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "root".to_string()
    } else {
        segments.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn schema_doc() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "required": ["pages"],
            "properties": {
                "pages": {
                    "type": "array",
                    "items": {
                        "type": ["object", "null"],
                        "properties": {
                            "objects": { "type": "object" }
                        }
                    }
                },
                "width": { "type": "number" }
            }
        })
    }

    fn schema() -> FormSchema {
        FormSchema::compile(PathBuf::from("formsSchema.json"), &schema_doc()).unwrap()
    }

    #[test]
    fn valid_form_has_no_errors() {
        let errors = schema().errors_for(&json!({ "pages": [null, { "objects": {} }] }));
        assert!(errors.is_empty());
    }

    #[test]
    fn nested_errors_use_arrow_paths() {
        let errors = schema().errors_for(&json!({
            "pages": [null, { "objects": [] }],
            "width": "wide"
        }));

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("pages -> 1 -> objects: ")));
        assert!(errors.iter().any(|e| e.starts_with("width: ")));
    }

    #[test]
    fn document_level_errors_are_root() {
        let errors = schema().errors_for(&json!({}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("root: "));
    }

    #[test]
    fn display_path_formats() {
        assert_eq!(display_path(""), "root");
        assert_eq!(display_path("/pages/0"), "pages -> 0");
    }

    #[test]
    fn missing_form_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = validate(&dir.path().join("form.4DForm"), None).unwrap_err();
        assert_eq!(err.code.as_str(), "form.not_found");
    }

    #[test]
    fn missing_schema_is_not_found() {
        let dir = TempDir::new().unwrap();
        let form = dir.path().join("form.4DForm");
        fs::write(&form, "{}").unwrap();

        let err = validate(&form, Some(&dir.path().join("missing.json"))).unwrap_err();
        assert_eq!(err.code.as_str(), "schema.not_found");
    }

    #[test]
    fn invalid_form_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let schema_file = dir.path().join("schema.json");
        fs::write(&schema_file, schema_doc().to_string()).unwrap();
        let form = dir.path().join("form.4DForm");
        fs::write(&form, "{ not json").unwrap();

        let err = validate(&form, Some(&schema_file)).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
    }

    #[test]
    fn validates_all_project_forms() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Project/Sources/Forms/Good")).unwrap();
        fs::create_dir_all(root.join("Project/Sources/Forms/Bad")).unwrap();
        fs::create_dir_all(root.join("Project/Sources/TableForms/1/Input")).unwrap();
        fs::write(root.join("Project/App.4DProject"), "{}").unwrap();
        fs::write(
            root.join("Project/Sources/Forms/Good/form.4DForm"),
            r#"{"pages": []}"#,
        )
        .unwrap();
        fs::write(root.join("Project/Sources/Forms/Bad/form.4DForm"), "{}").unwrap();
        fs::write(
            root.join("Project/Sources/TableForms/1/Input/form.4DForm"),
            "{ broken",
        )
        .unwrap();
        let schema_file = root.join("schema.json");
        fs::write(&schema_file, schema_doc().to_string()).unwrap();

        let report = validate_all(Some(root), Some(&schema_file)).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.invalid, 2);
        assert!(report.forms[0].form.ends_with("Forms/Bad/form.4DForm"));
        assert!(report.forms[1].valid);
    }
}
