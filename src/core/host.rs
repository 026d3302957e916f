//! Git hosting CLIs (`gh`, `glab`): availability, install hints and auth.

use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Gitlab,
}

impl Provider {
    pub fn cli(&self) -> &'static str {
        match self {
            Provider::Github => "gh",
            Provider::Gitlab => "glab",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Github => "GitHub",
            Provider::Gitlab => "GitLab",
        }
    }

    /// How to install the CLI on the current OS.
    pub fn install_hints(&self) -> Vec<String> {
        let hints: &[&str] = match (self, std::env::consts::OS) {
            (Provider::Github, "macos") => &["brew install gh"],
            (Provider::Github, "linux") => {
                &["See https://github.com/cli/cli/blob/trunk/docs/install_linux.md"]
            }
            (Provider::Github, _) => &["See https://cli.github.com/"],
            (Provider::Gitlab, "macos") => &["brew install glab"],
            (Provider::Gitlab, _) => &["See https://gitlab.com/gitlab-org/cli#installation"],
        };
        hints.iter().map(|h| h.to_string()).collect()
    }

    pub fn is_installed(&self) -> bool {
        is_command_available(self.cli())
    }

    pub fn auth_args(&self, action: &str, hostname: Option<&str>) -> Vec<String> {
        let mut args = vec!["auth".to_string(), action.to_string()];
        if let (Provider::Gitlab, Some(host)) = (self, hostname) {
            args.push("--hostname".to_string());
            args.push(host.to_string());
        }
        args
    }

    /// Printable login command, used in hints.
    pub fn login_command(&self, hostname: Option<&str>) -> String {
        let args = self.auth_args("login", hostname);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        command::command_line(self.cli(), &args)
    }

    pub fn is_authenticated(&self, dir: &Path, hostname: Option<&str>) -> bool {
        let args = self.auth_args("status", hostname);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        command::succeeded_in(dir, self.cli(), &args)
    }

    /// Run the interactive login flow attached to the terminal.
    pub fn login(&self, dir: &Path, hostname: Option<&str>) -> Result<bool> {
        let args = self.auth_args("login", hostname);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(command::run_attached_in(dir, self.cli(), &args)? == 0)
    }
}

pub fn is_command_available(name: &str) -> bool {
    which::which(name).is_ok()
}

pub fn git_install_hints() -> Vec<String> {
    let hints: &[&str] = match std::env::consts::OS {
        "macos" => &["brew install git", "or: xcode-select --install"],
        "linux" => &[
            "sudo apt install git  (Debian/Ubuntu)",
            "sudo dnf install git  (Fedora)",
        ],
        _ => &["See https://git-scm.com/downloads"],
    };
    hints.iter().map(|h| h.to_string()).collect()
}

pub fn require_git() -> Result<()> {
    if is_command_available("git") {
        return Ok(());
    }
    Err(Error::tool_not_installed("git", git_install_hints()))
}

/// Homebrew installs are only offered on macOS when `brew` is present.
pub fn can_brew_install() -> bool {
    cfg!(target_os = "macos") && is_command_available("brew")
}

pub fn brew_install(dir: &Path, formula: &str) -> Result<bool> {
    crate::log_status!("publish", "Installing {}...", formula);
    Ok(command::run_attached_in(dir, "brew", &["install", formula])? == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gitlab_commands_carry_hostname() {
        assert_eq!(
            Provider::Gitlab.login_command(Some("gitlab.example.com")),
            "glab auth login --hostname gitlab.example.com"
        );
        assert_eq!(Provider::Gitlab.login_command(None), "glab auth login");
    }

    #[test]
    fn github_ignores_hostname() {
        assert_eq!(
            Provider::Github.auth_args("status", Some("ignored")),
            vec!["auth", "status"]
        );
        assert_eq!(Provider::Github.login_command(None), "gh auth login");
    }

    #[test]
    fn every_provider_has_install_hints() {
        assert!(!Provider::Github.install_hints().is_empty());
        assert!(!Provider::Gitlab.install_hints().is_empty());
        assert!(!git_install_hints().is_empty());
    }
}
