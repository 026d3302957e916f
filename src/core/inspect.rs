//! Structured summary of a 4D project: methods, classes, forms, settings
//! and declared dependencies.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::Result;
use crate::project::{self, ProjectLayout};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub lines: usize,
    pub properties: Vec<String>,
    pub functions: Vec<String>,
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    pub name: String,
    pub has_form_file: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file: Option<String>,
    pub compatibility_version: Option<Value>,
    pub tokenized_text: Option<Value>,
    pub has_settings: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySummary {
    pub file_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub methods_count: usize,
    pub classes_count: usize,
    pub forms_count: usize,
    pub database_methods: Vec<String>,
    pub has_catalog: bool,
    pub total_code_lines: usize,
    pub dependencies: DependencySummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub project_root: String,
    pub settings: ProjectSettings,
    pub summary: ProjectSummary,
    pub methods: Vec<MethodInfo>,
    pub classes: Vec<ClassInfo>,
    pub forms: Vec<FormInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactReport {
    pub project_root: String,
    pub settings: ProjectSettings,
    pub summary: ProjectSummary,
    pub method_names: Vec<String>,
    pub class_names: Vec<String>,
    pub form_names: Vec<String>,
}

impl ProjectReport {
    pub fn compact(self) -> CompactReport {
        CompactReport {
            project_root: self.project_root,
            settings: self.settings,
            summary: self.summary,
            method_names: self.methods.into_iter().map(|m| m.name).collect(),
            class_names: self.classes.into_iter().map(|c| c.name).collect(),
            form_names: self.forms.into_iter().map(|f| f.name).collect(),
        }
    }
}

/// Locate the project from `start` and analyze it.
pub fn inspect(start: Option<&Path>) -> Result<ProjectReport> {
    let layout = project::locate(start)?;
    Ok(analyze(&layout))
}

pub fn analyze(layout: &ProjectLayout) -> ProjectReport {
    let methods: Vec<MethodInfo> = sorted_code_files(&layout.methods_dir())
        .iter()
        .map(|path| analyze_method(path))
        .collect();

    let classes: Vec<ClassInfo> = sorted_code_files(&layout.classes_dir())
        .iter()
        .map(|path| analyze_class(path))
        .collect();

    let database_methods = recursive_stems(&layout.database_methods_dir(), "4dm");
    let forms = analyze_forms(&layout.forms_dir());
    let total_code_lines = methods.iter().map(|m| m.lines).sum::<usize>()
        + classes.iter().map(|c| c.lines).sum::<usize>();

    ProjectReport {
        project_root: layout.root.display().to_string(),
        settings: analyze_settings(layout),
        summary: ProjectSummary {
            methods_count: methods.len(),
            classes_count: classes.len(),
            forms_count: forms.len(),
            database_methods,
            has_catalog: layout.catalog_file().exists(),
            total_code_lines,
            dependencies: analyze_dependencies(&layout.dependencies_file()),
        },
        methods,
        classes,
        forms,
    }
}

fn read_lossy(path: &Path) -> Option<String> {
    fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn sorted_code_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "4dm"))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

fn recursive_stems(dir: &Path, extension: &str) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    let mut stems: Vec<String> = match glob::glob(&pattern) {
        Ok(paths) => paths
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| file_stem(&p))
            .collect(),
        Err(_) => Vec::new(),
    };
    stems.sort();
    stems
}

pub fn analyze_method(path: &Path) -> MethodInfo {
    let lines = read_lossy(path).map(|c| c.lines().count()).unwrap_or(0);
    MethodInfo {
        name: file_stem(path),
        lines,
    }
}

struct ClassPatterns {
    extends: Regex,
    property: Regex,
    function: Regex,
}

fn class_patterns() -> &'static ClassPatterns {
    static PATTERNS: OnceLock<ClassPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ClassPatterns {
        extends: Regex::new(r"(?i)^Class\s+extends\s+(.+)").expect("valid regex"),
        property: Regex::new(r"(?i)^property\s+(.+)").expect("valid regex"),
        function: Regex::new(r"(?i)^(exposed\s+)?(shared\s+)?Function\s+(\w[\w.]*)")
            .expect("valid regex"),
    })
}

pub fn analyze_class(path: &Path) -> ClassInfo {
    let name = file_stem(path);
    let Some(content) = read_lossy(path) else {
        return ClassInfo {
            name,
            lines: 0,
            properties: Vec::new(),
            functions: Vec::new(),
            extends: None,
        };
    };

    let patterns = class_patterns();
    let mut properties = Vec::new();
    let mut functions = Vec::new();
    let mut extends = None;
    let mut lines = 0;

    for line in content.lines() {
        lines += 1;
        let stripped = line.trim();

        if let Some(caps) = patterns.extends.captures(stripped) {
            extends = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = patterns.property.captures(stripped) {
            properties.push(caps[1].trim().to_string());
        }
        if let Some(caps) = patterns.function.captures(stripped) {
            let mut prefix = String::new();
            if caps.get(1).is_some() {
                prefix.push_str("exposed ");
            }
            if caps.get(2).is_some() {
                prefix.push_str("shared ");
            }
            functions.push(format!("{}{}", prefix, &caps[3]));
        }
    }

    ClassInfo {
        name,
        lines,
        properties,
        functions,
        extends,
    }
}

fn analyze_dependencies(path: &Path) -> DependencySummary {
    if !path.exists() {
        return DependencySummary {
            file_exists: false,
            dependencies: Some(Value::Object(serde_json::Map::new())),
            error: None,
        };
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(data) => DependencySummary {
            file_exists: true,
            dependencies: Some(
                data.get("dependencies")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            ),
            error: None,
        },
        Err(error) => DependencySummary {
            file_exists: true,
            dependencies: None,
            error: Some(error),
        },
    }
}

fn analyze_forms(forms_dir: &Path) -> Vec<FormInfo> {
    let mut form_dirs: Vec<PathBuf> = match fs::read_dir(forms_dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => return Vec::new(),
    };
    form_dirs.sort();

    form_dirs
        .iter()
        .map(|dir| {
            let form_file = dir.join("form.4DForm");
            let has_form_file = form_file.exists();
            let pages = if has_form_file {
                count_pages(&form_file)
            } else {
                None
            };
            let methods: Vec<String> = sorted_code_files(dir).iter().map(|p| file_stem(p)).collect();

            FormInfo {
                name: project::dir_name(dir),
                has_form_file,
                pages,
                methods: if methods.is_empty() { None } else { Some(methods) },
            }
        })
        .collect()
}

fn count_pages(form_file: &Path) -> Option<usize> {
    let content = read_lossy(form_file)?;
    let data: Value = serde_json::from_str(&content).ok()?;
    Some(match data.get("pages") {
        Some(Value::Array(pages)) => pages.len(),
        Some(Value::Object(pages)) => pages.len(),
        _ => 0,
    })
}

fn analyze_settings(layout: &ProjectLayout) -> ProjectSettings {
    let mut settings = ProjectSettings {
        project_file: None,
        compatibility_version: None,
        tokenized_text: None,
        has_settings: layout.settings_file().exists(),
    };

    if let Some(file) = layout.project_file() {
        let parsed = read_lossy(&file).and_then(|c| serde_json::from_str::<Value>(&c).ok());
        if let Some(data) = parsed {
            settings.project_file = Some(project::dir_name(&file));
            settings.compatibility_version = data.get("compatibilityVersion").cloned();
            settings.tokenized_text = data.get("tokenizedText").cloned();
        }
    }

    settings
}
