use clap::Args;
use std::path::PathBuf;

use skill4d::defaults;
use skill4d::scaffold::{self, CreateOptions, CreateResult};

use super::CmdResult;

#[derive(Args)]
pub struct CreateArgs {
    /// Project name (also the .4DProject file name)
    pub name: String,

    /// Parent directory (default: current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// compatibilityVersion written to the .4DProject file
    #[arg(long)]
    pub compatibility_version: Option<u32>,

    /// Skip git init
    #[arg(long)]
    pub no_git: bool,

    /// Write into an existing non-empty directory
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: CreateArgs, _global: &super::GlobalArgs) -> CmdResult<CreateResult> {
    let parent = match args.path {
        Some(path) => path,
        None => super::current_dir()?,
    };
    let compatibility_version = args
        .compatibility_version
        .unwrap_or_else(|| defaults::load_config().compatibility_version);

    let result = scaffold::create(&CreateOptions {
        name: args.name,
        parent,
        compatibility_version,
        init_git: !args.no_git,
        force: args.force,
    })?;

    Ok((result, 0))
}
