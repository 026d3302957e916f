use clap::Args;
use std::path::PathBuf;

use skill4d::tool4d::{self, CompileOptions, Tool4dReport};

use super::CmdResult;

#[derive(Args)]
pub struct CompileArgs {
    /// Project directory or .4DProject file (default: current directory)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Explicit tool4d binary
    #[arg(long)]
    pub tool4d: Option<PathBuf>,

    /// Keep the temporary runner project for inspection
    #[arg(long)]
    pub keep_runner: bool,
}

pub fn run(args: CompileArgs, _global: &super::GlobalArgs) -> CmdResult<Tool4dReport> {
    let report = tool4d::compile(&CompileOptions {
        project: args.project,
        tool4d: args.tool4d,
        keep_runner: args.keep_runner,
    })?;

    if report.success {
        crate::tty::status("Compilation succeeded");
    }

    let exit_code = if report.success { 0 } else { 1 };
    Ok((report, exit_code))
}
