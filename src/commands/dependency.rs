use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use skill4d::dependency::{self, AddOptions, AddResult, DependencyList, RemoveResult};

use super::CmdResult;

#[derive(Args)]
pub struct DependencyArgs {
    #[command(subcommand)]
    command: DependencyCommand,
}

#[derive(Subcommand)]
enum DependencyCommand {
    /// Add a GitHub or local component to dependencies.json
    Add {
        /// GitHub URL, owner/repo shorthand, or local path
        repo: String,

        /// Dependency name (default: derived from the repo)
        #[arg(long)]
        name: Option<String>,

        /// Release tag to pin
        #[arg(long)]
        tag: Option<String>,

        /// Version requirement ("latest" or a semver range)
        #[arg(long)]
        version: Option<String>,

        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// List declared dependencies and local overrides
    List {
        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Remove a dependency
    Remove {
        /// Dependency name
        name: String,

        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum DependencyOutput {
    #[serde(rename = "dependency.add")]
    Add(AddResult),

    #[serde(rename = "dependency.list")]
    List(DependencyList),

    #[serde(rename = "dependency.remove")]
    Remove(RemoveResult),
}

pub fn run(args: DependencyArgs, _global: &super::GlobalArgs) -> CmdResult<DependencyOutput> {
    let output = match args.command {
        DependencyCommand::Add {
            repo,
            name,
            tag,
            version,
            project,
        } => DependencyOutput::Add(dependency::add(&AddOptions {
            repo,
            name,
            tag,
            version,
            project,
        })?),
        DependencyCommand::List { project } => {
            DependencyOutput::List(dependency::list(project.as_deref())?)
        }
        DependencyCommand::Remove { name, project } => {
            DependencyOutput::Remove(dependency::remove(&name, project.as_deref())?)
        }
    };

    Ok((output, 0))
}
