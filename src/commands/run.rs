use clap::Args;
use std::path::PathBuf;

use skill4d::tool4d::{self, RunOptions, Tool4dReport};

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Project method to run as the startup method
    pub method: String,

    /// Project directory or .4DProject file (default: current directory)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Value passed to the method through --user-param
    #[arg(long)]
    pub user_param: Option<String>,

    /// Explicit tool4d binary
    #[arg(long)]
    pub tool4d: Option<PathBuf>,
}

pub fn run(args: RunArgs, _global: &super::GlobalArgs) -> CmdResult<Tool4dReport> {
    let report = tool4d::run(&RunOptions {
        method: args.method,
        project: args.project,
        user_param: args.user_param,
        tool4d: args.tool4d,
    })?;

    let exit_code = if report.success { 0 } else { 1 };
    Ok((report, exit_code))
}
