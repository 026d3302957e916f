//! GitHub Actions workflows for 4D projects.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::git;
use crate::project;
use crate::publish::Prompter;
use crate::utils::io;

const BUILD_WORKFLOW: &str = include_str!("../../assets/workflows/build.yml");
const RELEASE_ON_TAG_WORKFLOW: &str = include_str!("../../assets/workflows/releaseOnTag.yml");
const RELEASE_ON_CREATE_WORKFLOW: &str = include_str!("../../assets/workflows/releaseOnCreate.yml");

pub const WORKFLOWS_DIR: &str = ".github/workflows";
const BUILD_FILE: &str = "build.yml";
const RELEASE_FILE: &str = "release.yml";
const RELEASE_FILES: &[&str] = &["release.yml", "releaseOnTag.yml", "releaseOnCreate.yml"];
const COMMIT_MESSAGE: &str = "Add CI/CD workflows";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseTrigger {
    /// Build and release when a tag is pushed.
    Tag,
    /// Build when a release is created on GitHub.
    Create,
}

impl ReleaseTrigger {
    fn template(&self) -> &'static str {
        match self {
            ReleaseTrigger::Tag => RELEASE_ON_TAG_WORKFLOW,
            ReleaseTrigger::Create => RELEASE_ON_CREATE_WORKFLOW,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub path: Option<PathBuf>,
    pub build: bool,
    pub release: Option<ReleaseTrigger>,
    pub push: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub root: String,
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub committed: bool,
    pub pushed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

pub fn install(options: &InstallOptions, prompter: &mut dyn Prompter) -> Result<InstallResult> {
    let start = match &options.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("read current dir".to_string())))?,
    };
    let root = project::publish_root(&start);
    let dir = root.join(WORKFLOWS_DIR);

    let mut result = InstallResult {
        root: root.display().to_string(),
        ..Default::default()
    };

    let build_exists = dir.join(BUILD_FILE).exists();
    let release_exists = RELEASE_FILES.iter().any(|f| dir.join(f).exists());

    if build_exists {
        result.skipped.push(format!("{} (already exists)", BUILD_FILE));
    }
    if release_exists {
        result
            .skipped
            .push("release workflow (already exists)".to_string());
    }
    if build_exists && release_exists {
        result
            .messages
            .push("Workflows already configured".to_string());
        return Ok(result);
    }

    let mut install_build = options.build || !build_exists;
    let mut release = options.release;

    if prompter.is_interactive() {
        if !build_exists && !options.build {
            install_build = prompter.confirm("Add build.yml workflow? (builds on .4dm changes)");
        }
        if !release_exists && release.is_none() {
            let choice = prompter
                .ask(
                    "Add release workflow?\n  1. Release on tag push\n  2. Release on create (build when you create a release on GitHub)\n  3. No release workflow\nChoice [1/2/3]: ",
                )
                .unwrap_or_default();
            release = match choice.trim() {
                "1" => Some(ReleaseTrigger::Tag),
                "2" => Some(ReleaseTrigger::Create),
                _ => None,
            };
        }
    }

    if install_build && !build_exists {
        write_workflow(&dir, BUILD_FILE, BUILD_WORKFLOW)?;
        result.installed.push(BUILD_FILE.to_string());
    }
    if let Some(trigger) = release.filter(|_| !release_exists) {
        write_workflow(&dir, RELEASE_FILE, trigger.template())?;
        result.installed.push(RELEASE_FILE.to_string());
    }

    if result.installed.is_empty() || !options.push {
        return Ok(result);
    }

    commit_and_push(&root, prompter, &mut result)?;
    Ok(result)
}

fn write_workflow(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    io::write_file(&path, content, &format!("write {}", path.display()))?;
    crate::log_status!("workflows", "Added: {}", name);
    Ok(())
}

fn commit_and_push(
    root: &Path,
    prompter: &mut dyn Prompter,
    result: &mut InstallResult,
) -> Result<()> {
    if !git::is_git_repo(root) {
        result
            .messages
            .push("Not a git repository; workflows left uncommitted".to_string());
        return Ok(());
    }

    let pathspec = format!("{}/", WORKFLOWS_DIR);
    if git::status_porcelain(root, &pathspec)?.is_empty() {
        return Ok(());
    }

    if prompter.is_interactive() && !prompter.confirm("Commit and push workflow changes?") {
        result.messages.push(format!(
            "Changes not committed. Run: git add {} && git commit -m \"{}\" && git push",
            pathspec, COMMIT_MESSAGE
        ));
        return Ok(());
    }

    git::add(root, &pathspec)?;
    git::commit(root, COMMIT_MESSAGE)?;
    result.committed = true;

    if git::has_remote(root) {
        git::push(root)?;
        result.pushed = true;
    } else {
        result
            .messages
            .push("Workflows committed (no remote to push)".to_string());
    }

    Ok(())
}
