//! Git primitives used by `create`, `publish` and `workflows`.

use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command;

pub fn is_installed() -> bool {
    which::which("git").is_ok()
}

/// A folder is treated as a repository when it has its own `.git` entry.
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

pub fn init(path: &Path) -> Result<()> {
    git(path, &["init"]).map(|_| ())
}

pub fn add(path: &Path, pathspec: &str) -> Result<()> {
    git(path, &["add", pathspec]).map(|_| ())
}

pub fn commit(path: &Path, message: &str) -> Result<()> {
    git(path, &["commit", "-m", message]).map(|_| ())
}

/// `git init && git add . && git commit -m "Initial commit"`.
pub fn init_with_initial_commit(path: &Path) -> Result<()> {
    init(path)?;
    add(path, ".")?;
    commit(path, "Initial commit")
}

/// URL of `origin`, or None when there is no such remote.
pub fn origin_url(path: &Path) -> Option<String> {
    command::run_in_optional(path, "git", &["remote", "get-url", "origin"])
}

pub fn has_remote(path: &Path) -> bool {
    origin_url(path).is_some()
}

pub fn push(path: &Path) -> Result<()> {
    git(path, &["push"]).map(|_| ())
}

pub fn push_set_upstream(path: &Path) -> Result<()> {
    git(path, &["push", "--set-upstream", "origin", "HEAD"]).map(|_| ())
}

/// Porcelain status restricted to `pathspec`; empty when nothing changed.
pub fn status_porcelain(path: &Path, pathspec: &str) -> Result<String> {
    git(path, &["status", "--porcelain", pathspec])
}

fn git(path: &Path, args: &[&str]) -> Result<String> {
    command::run_in(path, "git", args).map_err(|e| {
        let mut err = Error::git_command_failed(format!(
            "{} failed",
            command::command_line("git", args)
        ));
        err.details = e.details;
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn plain_folder_is_not_a_repo() {
        let dir = TempDir::new().unwrap();
        assert!(!is_git_repo(dir.path()));
        assert!(!has_remote(dir.path()));
    }

    #[test]
    fn dot_git_marks_a_repo() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(is_git_repo(dir.path()));
    }

    #[test]
    fn failed_git_command_maps_to_git_error() {
        if !is_installed() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let err = status_porcelain(dir.path(), ".").unwrap_err();
        assert_eq!(err.code.as_str(), "git.command_failed");
    }
}
