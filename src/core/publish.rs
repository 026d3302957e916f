//! Publishing a local 4D project to GitHub or GitLab.
//!
//! Every step either runs, is skipped because the repository already has
//! what it needs, or ends the flow. Decisions go through a [`Prompter`];
//! with [`NonInteractive`] the flow runs with defaults and fails instead of
//! asking.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::git;
use crate::host::{self, Provider};
use crate::project::{self, ProjectLayout};
use crate::utils::{command, io};

/// Questions asked during an interactive publish.
pub trait Prompter {
    fn is_interactive(&self) -> bool {
        true
    }

    /// Yes/no question defaulting to yes; only an explicit "n" declines.
    fn confirm(&mut self, question: &str) -> bool;

    /// Free-text answer; `None` when left empty.
    fn ask(&mut self, question: &str) -> Option<String>;
}

/// Accepts every default without asking (`--yes`).
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn confirm(&mut self, _question: &str) -> bool {
        true
    }

    fn ask(&mut self, _question: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Internal,
    Public,
}

impl Visibility {
    pub fn flag(&self) -> &'static str {
        match self {
            Visibility::Private => "--private",
            Visibility::Internal => "--internal",
            Visibility::Public => "--public",
        }
    }

    /// Menu answer for a provider; anything unrecognized keeps private.
    pub fn from_choice(provider: Provider, choice: &str) -> Self {
        match (provider, choice.trim()) {
            (Provider::Github, "2") => Visibility::Public,
            (Provider::Gitlab, "2") => Visibility::Internal,
            (Provider::Gitlab, "3") => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    fn menu(provider: Provider) -> &'static str {
        match provider {
            Provider::Github => "Repository visibility:\n  1. Private (default)\n  2. Public\nChoice [1/2]: ",
            Provider::Gitlab => {
                "Repository visibility:\n  1. Private (default)\n  2. Internal\n  3. Public\nChoice [1/2/3]: "
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub provider: Provider,
    pub path: Option<PathBuf>,
    pub visibility: Visibility,
    pub description: Option<String>,
    /// GitLab only.
    pub hostname: Option<String>,
    /// GitLab only.
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Done,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishStep {
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PublishStep {
    fn done(step: &str, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Done,
            detail: Some(detail.into()),
        }
    }

    fn skipped(step: &str, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Skipped,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishResult {
    pub provider: Provider,
    pub project: String,
    pub root: String,
    pub steps: Vec<PublishStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

pub fn publish(options: &PublishOptions, prompter: &mut dyn Prompter) -> Result<PublishResult> {
    let provider = options.provider;
    let start = match &options.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("read current dir".to_string())))?,
    };
    let root = project::publish_root(&start);
    let name = ProjectLayout::new(&root).name();

    let mut steps = Vec::new();
    steps.extend(ensure_tools(provider, &root, prompter)?);

    crate::log_status!("publish", "{} -> {} ({})", name, provider.label(), root.display());

    steps.push(prepare_repository(&root, prompter)?);

    if let Some(remote) = git::origin_url(&root) {
        steps.push(PublishStep::skipped(
            "create-repository",
            format!("{} remote already configured", provider.label()),
        ));
        return Ok(PublishResult {
            provider,
            project: name,
            root: root.display().to_string(),
            steps,
            remote: Some(remote),
        });
    }

    steps.push(ensure_authenticated(
        provider,
        &root,
        options.hostname.as_deref(),
        prompter,
    )?);

    let mut description = options.description.clone();
    let mut group = options.group.clone();
    let mut visibility = options.visibility;

    if prompter.is_interactive() {
        if !prompter.confirm(&format!("Create {} repository '{}'?", provider.label(), name)) {
            return Err(Error::publish_cancelled("create-repository"));
        }
        if description.is_none() {
            description = prompter.ask("Repository description (optional, press Enter to skip): ");
        }
        if provider == Provider::Gitlab && group.is_none() {
            group = prompter.ask(
                "GitLab group/namespace (optional, press Enter for personal namespace): ",
            );
        }
        if let Some(choice) = prompter.ask(Visibility::menu(provider)) {
            visibility = Visibility::from_choice(provider, &choice);
        }
    }

    if let Some(description) = description.as_deref().filter(|d| !d.is_empty()) {
        if create_readme(&root, &name, description)? {
            git::add(&root, "README.md")?;
            git::commit(&root, "Add README.md")?;
            steps.push(PublishStep::done("readme", "Created README.md"));
        }
    }

    let hostname = options.hostname.as_deref();
    let args = match provider {
        Provider::Github => github_create_args(&name, visibility, description.as_deref()),
        Provider::Gitlab => gitlab_create_args(
            &name,
            visibility,
            description.as_deref(),
            hostname,
            group.as_deref(),
        ),
    };
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = command::run_in(&root, provider.cli(), &arg_refs)?;
    steps.push(PublishStep::done(
        "create-repository",
        if output.is_empty() {
            format!("Repository created: {}", name)
        } else {
            output
        },
    ));

    if provider == Provider::Gitlab {
        git::push_set_upstream(&root)?;
        steps.push(PublishStep::done("push", "Code pushed to GitLab"));
    }

    crate::log_status!("publish", "Repository published to {}", provider.label());

    Ok(PublishResult {
        provider,
        project: name,
        root: root.display().to_string(),
        steps,
        remote: git::origin_url(&root),
    })
}

/// git and the provider CLI must both be on PATH. On macOS with Homebrew an
/// interactive run may install the provider CLI.
pub fn ensure_tools(
    provider: Provider,
    root: &Path,
    prompter: &mut dyn Prompter,
) -> Result<Vec<PublishStep>> {
    host::require_git()?;

    if provider.is_installed() {
        return Ok(Vec::new());
    }

    if prompter.is_interactive()
        && host::can_brew_install()
        && prompter.confirm(&format!("Install {} using Homebrew?", provider.cli()))
    {
        if host::brew_install(root, provider.cli())? && provider.is_installed() {
            return Ok(vec![PublishStep::done(
                "install-cli",
                format!("{} installed with Homebrew", provider.cli()),
            )]);
        }
        return Err(
            Error::tool_not_installed(provider.cli(), provider.install_hints())
                .with_hint("Homebrew installation failed"),
        );
    }

    Err(Error::tool_not_installed(
        provider.cli(),
        provider.install_hints(),
    ))
}

/// Initialize the repository with an initial commit unless one exists.
pub fn prepare_repository(root: &Path, prompter: &mut dyn Prompter) -> Result<PublishStep> {
    if git::is_git_repo(root) {
        return Ok(PublishStep::skipped(
            "git-init",
            "Git repository already initialized",
        ));
    }

    if prompter.is_interactive() && !prompter.confirm("Initialize git repository?") {
        return Err(Error::publish_cancelled("git-init")
            .with_hint("A git repository is required to publish"));
    }

    git::init_with_initial_commit(root)?;
    Ok(PublishStep::done("git-init", "Git repository initialized"))
}

fn ensure_authenticated(
    provider: Provider,
    root: &Path,
    hostname: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<PublishStep> {
    if provider.is_authenticated(root, hostname) {
        return Ok(PublishStep::skipped("auth", "Already authenticated"));
    }

    let login = provider.login_command(hostname);
    if !prompter.is_interactive() {
        return Err(Error::publish_not_authenticated(provider.label(), login));
    }

    if !prompter.confirm(&format!(
        "{} CLI not authenticated. Run '{}' now?",
        provider.label(),
        login
    )) {
        return Err(Error::publish_cancelled("auth").with_hint(format!("Please run: {}", login)));
    }

    if provider.login(root, hostname)? && provider.is_authenticated(root, hostname) {
        return Ok(PublishStep::done("auth", "Authenticated"));
    }

    Err(Error::publish_not_authenticated(provider.label(), login))
}

/// Write `README.md` unless one exists. Returns whether it was written.
pub fn create_readme(root: &Path, name: &str, description: &str) -> Result<bool> {
    let path = root.join("README.md");
    if path.exists() {
        return Ok(false);
    }
    io::write_file(
        &path,
        &format!("# {}\n\n{}\n", name, description),
        "write README.md",
    )?;
    Ok(true)
}

pub fn github_create_args(
    name: &str,
    visibility: Visibility,
    description: Option<&str>,
) -> Vec<String> {
    let visibility = match visibility {
        Visibility::Internal => Visibility::Private,
        other => other,
    };

    let mut args = vec![
        "repo".to_string(),
        "create".to_string(),
        name.to_string(),
        "--source=.".to_string(),
        "--push".to_string(),
        visibility.flag().to_string(),
    ];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        args.push("--description".to_string());
        args.push(description.to_string());
    }
    args
}

/// `<host>/<group>/<name>` or `<host>/<name>` on a named instance, else
/// just the name (the group then goes through `--group`).
pub fn gitlab_repo_path(name: &str, hostname: Option<&str>, group: Option<&str>) -> String {
    match (hostname, group) {
        (Some(host), Some(group)) => format!("{}/{}/{}", host.trim_end_matches('/'), group, name),
        (Some(host), None) => format!("{}/{}", host.trim_end_matches('/'), name),
        (None, _) => name.to_string(),
    }
}

pub fn gitlab_create_args(
    name: &str,
    visibility: Visibility,
    description: Option<&str>,
    hostname: Option<&str>,
    group: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "repo".to_string(),
        "create".to_string(),
        gitlab_repo_path(name, hostname, group),
        visibility.flag().to_string(),
    ];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        args.push("--description".to_string());
        args.push(description.to_string());
    }
    if let (None, Some(group)) = (hostname, group) {
        args.push("--group".to_string());
        args.push(group.to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    struct Scripted {
        answers: VecDeque<&'static str>,
    }

    impl Prompter for Scripted {
        fn confirm(&mut self, _question: &str) -> bool {
            self.answers.pop_front().unwrap_or("") != "n"
        }

        fn ask(&mut self, _question: &str) -> Option<String> {
            self.answers
                .pop_front()
                .filter(|a| !a.is_empty())
                .map(str::to_string)
        }
    }

    #[test]
    fn visibility_choices_per_provider() {
        assert_eq!(Visibility::from_choice(Provider::Github, "2"), Visibility::Public);
        assert_eq!(Visibility::from_choice(Provider::Github, "3"), Visibility::Private);
        assert_eq!(Visibility::from_choice(Provider::Gitlab, "2"), Visibility::Internal);
        assert_eq!(Visibility::from_choice(Provider::Gitlab, " 3 "), Visibility::Public);
        assert_eq!(Visibility::from_choice(Provider::Gitlab, ""), Visibility::Private);
    }

    #[test]
    fn github_command_line() {
        assert_eq!(
            github_create_args("Invoices", Visibility::Public, Some("Billing \"tools\"")),
            vec![
                "repo",
                "create",
                "Invoices",
                "--source=.",
                "--push",
                "--public",
                "--description",
                "Billing \"tools\"",
            ]
        );
        assert!(github_create_args("App", Visibility::Private, Some(""))
            .iter()
            .all(|a| a != "--description"));
    }

    #[test]
    fn gitlab_paths() {
        assert_eq!(gitlab_repo_path("App", None, None), "App");
        assert_eq!(gitlab_repo_path("App", None, Some("team")), "App");
        assert_eq!(
            gitlab_repo_path("App", Some("gitlab.example.com/"), Some("team")),
            "gitlab.example.com/team/App"
        );
        assert_eq!(
            gitlab_repo_path("App", Some("gitlab.example.com"), None),
            "gitlab.example.com/App"
        );
    }

    #[test]
    fn gitlab_group_flag_only_without_hostname() {
        let args = gitlab_create_args("App", Visibility::Internal, None, None, Some("team"));
        assert_eq!(
            args,
            vec!["repo", "create", "App", "--internal", "--group", "team"]
        );

        let args = gitlab_create_args(
            "App",
            Visibility::Private,
            None,
            Some("gitlab.example.com"),
            Some("team"),
        );
        assert!(!args.contains(&"--group".to_string()));
    }

    #[test]
    fn readme_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        assert!(create_readme(dir.path(), "App", "Invoicing").unwrap());
        assert_eq!(
            fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "# App\n\nInvoicing\n"
        );
        assert!(!create_readme(dir.path(), "App", "Other").unwrap());
    }

    #[test]
    fn existing_repository_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let step = prepare_repository(dir.path(), &mut NonInteractive).unwrap();
        assert_eq!(step.status, StepStatus::Skipped);
    }

    #[test]
    fn declining_git_init_cancels() {
        let dir = TempDir::new().unwrap();
        let mut prompter = Scripted {
            answers: VecDeque::from(vec!["n"]),
        };
        let err = prepare_repository(dir.path(), &mut prompter).unwrap_err();
        assert_eq!(err.code.as_str(), "publish.cancelled");
        assert!(!dir.path().join(".git").exists());
    }
}
