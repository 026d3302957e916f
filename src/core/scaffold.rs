//! New project skeleton.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::DEPENDENCIES_FORMAT_VERSION;
use crate::error::{Error, Result};
use crate::utils::io;
use crate::{git, project};

const SETTINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<preferences stamp="1">
	<com.4d>
		<general/>
	</com.4d>
</preferences>
"#;

const ON_STARTUP: &str = "// On Startup database method\n";

/// Artifacts 4D generates next to the sources. Shared with `clean`.
pub const GITIGNORE_ENTRIES: &[&str] = &[
    "DerivedData/",
    "Libraries/",
    "userPreferences.*/",
    "Project/Trash/",
    "Logs/",
    "Data/",
    ".DS_Store",
    "ehthumbs.db",
    "Thumbs.db",
];

#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub name: String,
    pub parent: PathBuf,
    pub compatibility_version: u32,
    pub init_git: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub root: String,
    pub project_file: String,
    pub created: Vec<String>,
    pub git_initialized: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub fn create(options: &CreateOptions) -> Result<CreateResult> {
    validate_name(&options.name)?;

    let root = project::absolute(&options.parent).join(&options.name);
    if root.exists() && !options.force && !is_empty_dir(&root) {
        return Err(Error::project_already_exists(root.display().to_string()));
    }

    let mut created = Vec::new();
    let layout = project::ProjectLayout::new(&root);

    let project_file = layout
        .project_dir()
        .join(format!("{}.{}", options.name, project::PROJECT_FILE_EXTENSION));
    let project_json = serde_json::json!({
        "compatibilityVersion": options.compatibility_version,
        "tokenizedText": false,
    });
    write_json(&root, &project_file, &project_json, &mut created)?;

    for dir in [
        layout.methods_dir(),
        layout.classes_dir(),
        layout.forms_dir(),
        layout.database_methods_dir(),
        root.join("Resources"),
    ] {
        io::ensure_dir(&dir, "create project folders")?;
        created.push(format!("{}/", relative(&root, &dir)));
    }

    write_text(
        &root,
        &layout.database_methods_dir().join("onStartup.4dm"),
        ON_STARTUP,
        &mut created,
    )?;
    write_json(
        &root,
        &layout.sources_dir().join("folders.json"),
        &serde_json::json!({}),
        &mut created,
    )?;
    write_text(&root, &layout.settings_file(), SETTINGS_XML, &mut created)?;
    write_json(
        &root,
        &layout.dependencies_file(),
        &serde_json::json!({
            "dependencies": {},
            "version": DEPENDENCIES_FORMAT_VERSION,
        }),
        &mut created,
    )?;

    let mut gitignore = GITIGNORE_ENTRIES.join("\n");
    gitignore.push('\n');
    write_text(&root, &root.join(".gitignore"), &gitignore, &mut created)?;
    write_text(
        &root,
        &root.join("README.md"),
        &format!("# {}\n", options.name),
        &mut created,
    )?;

    let mut warnings = Vec::new();
    let mut git_initialized = false;
    if options.init_git {
        if !git::is_installed() {
            warnings.push("git is not installed; skipped repository initialization".to_string());
        } else if git::is_git_repo(&root) {
            warnings.push("Folder is already a git repository".to_string());
        } else {
            git::init(&root)?;
            git_initialized = true;
        }
    }

    crate::log_status!("create", "Created {} at {}", options.name, root.display());

    Ok(CreateResult {
        root: root.display().to_string(),
        project_file: project_file.display().to_string(),
        created,
        git_initialized,
        warnings,
    })
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation_invalid_argument(
            "name",
            "Project name cannot be empty",
            None,
            None,
        ));
    }
    if trimmed != name || name.contains(&['/', '\\'][..]) || name == "." || name == ".." {
        return Err(Error::validation_invalid_argument(
            "name",
            "Project name must be a plain folder name",
            Some(name.to_string()),
            None,
        ));
    }
    Ok(())
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn write_json(
    root: &Path,
    path: &Path,
    value: &serde_json::Value,
    created: &mut Vec<String>,
) -> Result<()> {
    io::write_json_tabbed(path, value)?;
    created.push(relative(root, path));
    Ok(())
}

fn write_text(root: &Path, path: &Path, content: &str, created: &mut Vec<String>) -> Result<()> {
    io::write_file(path, content, &format!("write {}", path.display()))?;
    created.push(relative(root, path));
    Ok(())
}

pub(crate) fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(parent: &Path, name: &str) -> CreateOptions {
        CreateOptions {
            name: name.to_string(),
            parent: parent.to_path_buf(),
            compatibility_version: 2100,
            init_git: false,
            force: false,
        }
    }

    #[test]
    fn creates_a_locatable_project() {
        let dir = TempDir::new().unwrap();
        let result = create(&options(dir.path(), "Invoices")).unwrap();

        assert!(!result.git_initialized);
        assert!(result.created.contains(&"Project/Invoices.4DProject".to_string()));
        assert!(result.created.contains(&"Project/Sources/Methods/".to_string()));

        let root = project::find_project_root(Path::new(&result.root)).unwrap();
        assert_eq!(project::ProjectLayout::new(root).name(), "Invoices");
    }

    #[test]
    fn project_file_records_compatibility_version() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(dir.path(), "Billing");
        opts.compatibility_version = 2050;
        let result = create(&opts).unwrap();

        let json = io::read_json(Path::new(&result.project_file)).unwrap();
        assert_eq!(json["compatibilityVersion"], 2050);
        assert_eq!(json["tokenizedText"], false);
    }

    #[test]
    fn refuses_non_empty_target_without_force() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Invoices");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("notes.txt"), "keep").unwrap();

        let err = create(&options(dir.path(), "Invoices")).unwrap_err();
        assert_eq!(err.code.as_str(), "project.already_exists");

        let mut forced = options(dir.path(), "Invoices");
        forced.force = true;
        assert!(create(&forced).is_ok());
        assert!(target.join("notes.txt").exists());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        for bad in ["", "a/b", "..", " padded"] {
            let err = create(&options(dir.path(), bad)).unwrap_err();
            assert_eq!(err.code.as_str(), "validation.invalid_argument");
        }
    }
}
