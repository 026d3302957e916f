use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use skill4d::tool4d::{self, Tool4dLocation};

use super::CmdResult;

#[derive(Args)]
pub struct Tool4dArgs {
    #[command(subcommand)]
    command: Tool4dCommand,
}

#[derive(Subcommand)]
enum Tool4dCommand {
    /// Show which tool4d binary would be used
    Locate {
        /// Explicit tool4d binary
        #[arg(long)]
        tool4d: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum Tool4dOutput {
    #[serde(rename = "tool4d.locate")]
    Locate(Tool4dLocation),
}

pub fn run(args: Tool4dArgs, _global: &super::GlobalArgs) -> CmdResult<Tool4dOutput> {
    match args.command {
        Tool4dCommand::Locate { tool4d } => {
            let location = tool4d::locate(tool4d.as_deref())?;
            Ok((Tool4dOutput::Locate(location), 0))
        }
    }
}
