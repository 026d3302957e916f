//! Locating a 4D project on disk.
//!
//! A project root is the folder holding `Project/<Name>.4DProject`. Commands
//! may be started from the root, from anywhere below it, or with a path to a
//! file inside it.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub const PROJECT_DIR: &str = "Project";
pub const SOURCES_DIR: &str = "Sources";
pub const PROJECT_FILE_EXTENSION: &str = "4DProject";

/// Well-known paths of a located project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.project_dir().join(SOURCES_DIR)
    }

    pub fn methods_dir(&self) -> PathBuf {
        self.sources_dir().join("Methods")
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.sources_dir().join("Classes")
    }

    pub fn database_methods_dir(&self) -> PathBuf {
        self.sources_dir().join("DatabaseMethods")
    }

    pub fn forms_dir(&self) -> PathBuf {
        self.sources_dir().join("Forms")
    }

    pub fn dependencies_file(&self) -> PathBuf {
        self.sources_dir().join("dependencies.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.sources_dir().join("settings.4DSettings")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.sources_dir().join("catalog.4DCatalog")
    }

    /// The `.4DProject` file, if any.
    pub fn project_file(&self) -> Option<PathBuf> {
        project_files_in(&self.project_dir()).into_iter().next()
    }

    /// Project name: `.4DProject` stem, falling back to the root folder name.
    pub fn name(&self) -> String {
        self.project_file()
            .and_then(|f| f.file_stem().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| dir_name(&self.root))
    }
}

/// `.4DProject` files directly inside `dir`, sorted.
pub fn project_files_in(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        PROJECT_FILE_EXTENSION
    );

    let mut files: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

fn has_project_file(dir: &Path) -> bool {
    !project_files_in(dir).is_empty()
}

/// Walk up from `start` to the folder holding `Project/*.4DProject`.
///
/// A file path starts the search from its parent. Being inside the `Project`
/// folder itself also resolves to its parent.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let start = absolute(start);
    let start = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or(start)
    } else {
        start
    };

    for dir in start.ancestors() {
        if has_project_file(&dir.join(PROJECT_DIR)) {
            return Some(dir.to_path_buf());
        }
        if dir.file_name().is_some_and(|n| n == PROJECT_DIR) && has_project_file(dir) {
            return dir.parent().map(Path::to_path_buf);
        }
    }

    None
}

/// Looser lookup used when editing dependencies: any folder that has
/// `Project/Sources/` qualifies, even before a `.4DProject` exists.
pub fn find_sources_root(start: &Path) -> Option<PathBuf> {
    let start = absolute(start);

    for dir in start.ancestors() {
        if dir.join(PROJECT_DIR).join(SOURCES_DIR).is_dir() {
            return Some(dir.to_path_buf());
        }

        let name = dir.file_name().map(|n| n.to_string_lossy().to_string());
        let parent_name = dir
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string());

        if name.as_deref() == Some(SOURCES_DIR) && parent_name.as_deref() == Some(PROJECT_DIR) {
            return dir.parent().and_then(Path::parent).map(Path::to_path_buf);
        }
        if name.as_deref() == Some(PROJECT_DIR) && dir.join(SOURCES_DIR).is_dir() {
            return dir.parent().map(Path::to_path_buf);
        }
    }

    None
}

/// Locate the project or fail with `project.not_found`.
pub fn locate(start: Option<&Path>) -> Result<ProjectLayout> {
    let start = resolve_start(start)?;
    find_project_root(&start)
        .map(ProjectLayout::new)
        .ok_or_else(|| Error::project_not_found(start.display().to_string()))
}

/// Locate with the looser `Project/Sources` rule.
pub fn locate_sources(start: Option<&Path>) -> Result<ProjectLayout> {
    let start = resolve_start(start)?;
    find_sources_root(&start)
        .map(ProjectLayout::new)
        .ok_or_else(|| Error::project_not_found(start.display().to_string()))
}

/// Root used by the publishing commands: the start folder when it holds a
/// project, else its parent when that does, else the start folder as-is.
pub fn publish_root(start: &Path) -> PathBuf {
    let start = absolute(start);
    if has_project_file(&start.join(PROJECT_DIR)) {
        return start;
    }
    if let Some(parent) = start.parent() {
        if has_project_file(&parent.join(PROJECT_DIR)) {
            return parent.to_path_buf();
        }
    }
    start
}

fn resolve_start(start: Option<&Path>) -> Result<PathBuf> {
    match start {
        Some(path) => Ok(absolute(path)),
        None => std::env::current_dir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("read current dir".to_string()))),
    }
}

/// Absolute, normalized form of `path` (symlinks resolved when it exists).
///
/// A missing path is normalized lexically, with its closest existing
/// ancestor canonicalized.
pub fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let normalized = normalize_lexically(&joined);
    if let Ok(canonical) = normalized.canonicalize() {
        return canonical;
    }

    let mut missing = Vec::new();
    let mut existing = normalized.as_path();
    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            missing.push(name.to_os_string());
        }
        existing = parent;
        if let Ok(mut canonical) = existing.canonicalize() {
            for name in missing.iter().rev() {
                canonical.push(name);
            }
            return canonical;
        }
    }
    normalized
}

/// Collapses `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_project(root: &Path, name: &str) {
        let project = root.join("Project");
        fs::create_dir_all(project.join("Sources").join("Methods")).unwrap();
        fs::write(project.join(format!("{}.4DProject", name)), "{}").unwrap();
    }

    #[test]
    fn finds_root_from_nested_folder() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path(), "Invoices");
        let nested = dir.path().join("Project/Sources/Methods");

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn absolute_collapses_parent_components_of_missing_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("App")).unwrap();
        let missing = dir.path().join("App").join("..").join("NotClonedYet");

        assert_eq!(
            absolute(&missing),
            dir.path().canonicalize().unwrap().join("NotClonedYet")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn finds_root_from_file_path() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path(), "Invoices");
        let file = dir.path().join("Project/Sources/Methods/hello.4dm");
        fs::write(&file, "").unwrap();

        assert_eq!(
            find_project_root(&file).unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn missing_project_is_none() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Project")).unwrap();
        assert!(find_project_root(dir.path()).is_none());
    }

    #[test]
    fn locate_reports_where_it_searched() {
        let dir = TempDir::new().unwrap();
        let err = locate(Some(dir.path())).unwrap_err();
        assert_eq!(err.code.as_str(), "project.not_found");
        assert!(err.details["searchedFrom"].as_str().is_some());
    }

    #[test]
    fn sources_root_accepts_inside_sources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Project/Sources")).unwrap();
        let root = find_sources_root(&dir.path().join("Project/Sources")).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn name_comes_from_project_file() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path(), "Invoices");
        let layout = ProjectLayout::new(dir.path());
        assert_eq!(layout.name(), "Invoices");
    }

    #[test]
    fn name_falls_back_to_folder() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Scratch");
        fs::create_dir_all(&root).unwrap();
        assert_eq!(ProjectLayout::new(&root).name(), "Scratch");
    }

    #[test]
    fn publish_root_checks_parent() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path(), "Invoices");
        let sub = dir.path().join("Resources");
        fs::create_dir_all(&sub).unwrap();

        assert_eq!(publish_root(&sub), dir.path().canonicalize().unwrap());
        let elsewhere = TempDir::new().unwrap();
        assert_eq!(
            publish_root(elsewhere.path()),
            elsewhere.path().canonicalize().unwrap()
        );
    }
}
