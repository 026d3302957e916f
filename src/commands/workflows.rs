use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use skill4d::workflows::{self, InstallOptions, InstallResult, ReleaseTrigger};

use super::CmdResult;

#[derive(Args)]
pub struct WorkflowsArgs {
    #[command(subcommand)]
    command: WorkflowsCommand,
}

#[derive(Subcommand)]
enum WorkflowsCommand {
    /// Add GitHub Actions build/release workflows to the project
    Install {
        /// Accept defaults without prompting
        #[arg(long, short = 'y')]
        yes: bool,

        /// Install the build workflow
        #[arg(long)]
        build: bool,

        /// Release workflow triggered by pushing a tag
        #[arg(long, conflicts_with = "release_on_create")]
        release_on_tag: bool,

        /// Release workflow triggered by creating a GitHub release
        #[arg(long)]
        release_on_create: bool,

        /// Leave the new workflow files uncommitted
        #[arg(long)]
        no_push: bool,

        /// Project directory (default: current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum WorkflowsOutput {
    #[serde(rename = "workflows.install")]
    Install(InstallResult),
}

pub fn run(args: WorkflowsArgs, _global: &super::GlobalArgs) -> CmdResult<WorkflowsOutput> {
    match args.command {
        WorkflowsCommand::Install {
            yes,
            build,
            release_on_tag,
            release_on_create,
            no_push,
            path,
        } => {
            let release = if release_on_tag {
                Some(ReleaseTrigger::Tag)
            } else if release_on_create {
                Some(ReleaseTrigger::Create)
            } else {
                None
            };

            let options = InstallOptions {
                path,
                build,
                release,
                push: !no_push,
            };

            let mut prompter = crate::tty::TtyPrompter::for_flags(yes);
            let result = workflows::install(&options, &mut *prompter)?;
            Ok((WorkflowsOutput::Install(result), 0))
        }
    }
}
