use clap::{Args, Subcommand};
use std::path::PathBuf;

use skill4d::host::Provider;
use skill4d::publish::{self, PublishOptions, PublishResult, Visibility};

use super::CmdResult;

#[derive(Args)]
pub struct PublishArgs {
    #[command(subcommand)]
    command: PublishCommand,
}

#[derive(Subcommand)]
enum PublishCommand {
    /// Create a GitHub repository for the project and push it
    Github {
        #[command(flatten)]
        common: CommonPublishArgs,
    },
    /// Create a GitLab project for the project and push it
    Gitlab {
        #[command(flatten)]
        common: CommonPublishArgs,

        /// Self-hosted GitLab instance (e.g. gitlab.example.com)
        #[arg(long)]
        hostname: Option<String>,

        /// Group or namespace for the project
        #[arg(long)]
        group: Option<String>,
    },
}

#[derive(Args)]
struct CommonPublishArgs {
    /// Accept defaults without prompting
    #[arg(long, short = 'y')]
    yes: bool,

    /// Create a public repository (default: private)
    #[arg(long)]
    public: bool,

    /// Repository description
    #[arg(long)]
    description: Option<String>,

    /// Project directory (default: current directory)
    #[arg(long)]
    path: Option<PathBuf>,
}

pub fn run(args: PublishArgs, _global: &super::GlobalArgs) -> CmdResult<PublishResult> {
    let (provider, common, hostname, group) = match args.command {
        PublishCommand::Github { common } => (Provider::Github, common, None, None),
        PublishCommand::Gitlab {
            common,
            hostname,
            group,
        } => (Provider::Gitlab, common, hostname, group),
    };

    let options = PublishOptions {
        provider,
        path: common.path,
        visibility: if common.public {
            Visibility::Public
        } else {
            Visibility::Private
        },
        description: common.description,
        hostname,
        group,
    };

    let mut prompter = crate::tty::TtyPrompter::for_flags(common.yes);
    let result = publish::publish(&options, &mut *prompter)?;
    Ok((result, 0))
}
