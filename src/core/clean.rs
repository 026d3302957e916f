//! Removal of generated files and caches from a 4D project.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::project;
use crate::scaffold::relative;

const SYSTEM_FILES: &[&str] = &[".DS_Store", "ehthumbs.db", "Thumbs.db"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub root: String,
    pub removed: Vec<String>,
    pub dry_run: bool,
}

/// Locate the project from `start` and clean it.
pub fn clean(start: Option<&Path>, dry_run: bool) -> Result<CleanResult> {
    let layout = project::locate(start)?;
    let removed = clean_root(&layout.root, dry_run)?;

    Ok(CleanResult {
        root: layout.root.display().to_string(),
        removed,
        dry_run,
    })
}

/// Remove generated artifacts below `root`, returning what was (or would be)
/// removed as root-relative paths. Directories carry a trailing `/`.
pub fn clean_root(root: &Path, dry_run: bool) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for derived in glob_paths(root, "**/DerivedData") {
        if derived.is_dir() && !is_inside_removed(&derived, root, &removed) {
            remove(&derived, dry_run)?;
            removed.push(format!("{}/", relative(root, &derived)));
        }
    }

    let libraries = root.join("Libraries");
    if libraries.is_dir() {
        remove(&libraries, dry_run)?;
        removed.push("Libraries/".to_string());
    }

    for prefs in glob_paths(root, "userPreferences.*") {
        if prefs.is_dir() {
            remove(&prefs, dry_run)?;
            removed.push(format!("{}/", relative(root, &prefs)));
        }
    }

    let trash = root.join("Project").join("Trash");
    if trash.is_dir() {
        remove(&trash, dry_run)?;
        removed.push("Project/Trash/".to_string());
    }

    let logs = root.join("Logs");
    if logs.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(&logs)
            .map_err(|e| Error::internal_io(e.to_string(), Some("list Logs".to_string())))?
            .flatten()
            .map(|e| e.path())
            .collect();
        entries.sort();

        for entry in entries {
            let suffix = if entry.is_dir() { "/" } else { "" };
            remove(&entry, dry_run)?;
            removed.push(format!("Logs/{}{}", project::dir_name(&entry), suffix));
        }
    }

    for name in SYSTEM_FILES {
        for file in glob_paths(root, &format!("**/{}", name)) {
            if file.is_file() && !is_inside_removed(&file, root, &removed) {
                remove(&file, dry_run)?;
                removed.push(relative(root, &file));
            }
        }
    }

    if removed.is_empty() {
        crate::log_status!("clean", "Nothing to clean");
    } else {
        crate::log_status!("clean", "Removed {} items", removed.len());
    }

    Ok(removed)
}

fn glob_paths(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        pattern
    );
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut paths: Vec<PathBuf> = match glob::glob_with(&full, options) {
        Ok(paths) => paths.flatten().collect(),
        Err(_) => Vec::new(),
    };
    paths.sort();
    paths
}

/// In dry-run mode nothing is deleted, so nested matches below an already
/// listed directory must be skipped explicitly.
fn is_inside_removed(path: &Path, root: &Path, removed: &[String]) -> bool {
    let rel = relative(root, path);
    removed
        .iter()
        .filter(|r| r.ends_with('/'))
        .any(|dir| rel.starts_with(dir.as_str()))
}

fn remove(path: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }

    crate::log_status!("clean", "Removing {}", path.display());

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("remove {}", path.display())))
    })
}
