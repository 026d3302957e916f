use clap::Args;
use std::path::PathBuf;

use skill4d::clean::{self, CleanResult};

use super::CmdResult;

#[derive(Args)]
pub struct CleanArgs {
    /// Project directory or any path inside it (default: current directory)
    pub path: Option<PathBuf>,

    /// List what would be removed without deleting
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: CleanArgs, _global: &super::GlobalArgs) -> CmdResult<CleanResult> {
    let result = clean::clean(args.path.as_deref(), args.dry_run)?;

    if result.removed.is_empty() {
        crate::tty::status("Nothing to clean");
    }

    Ok((result, 0))
}
