use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use skill4d::inspect::{self, CompactReport, ProjectReport};

use super::CmdResult;

#[derive(Args)]
pub struct InfoArgs {
    /// Project directory or any path inside it (default: current directory)
    pub path: Option<PathBuf>,

    /// Only list method, class and form names
    #[arg(long)]
    pub compact: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum InfoOutput {
    Full(ProjectReport),
    Compact(CompactReport),
}

pub fn run(args: InfoArgs, _global: &super::GlobalArgs) -> CmdResult<InfoOutput> {
    let report = inspect::inspect(args.path.as_deref())?;

    let output = if args.compact {
        InfoOutput::Compact(report.compact())
    } else {
        InfoOutput::Full(report)
    };

    Ok((output, 0))
}
