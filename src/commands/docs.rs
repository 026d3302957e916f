use clap::Args;

use skill4d::defaults;
use skill4d::docs::{self, DocLookup};

use super::CmdResult;

#[derive(Args)]
pub struct DocsArgs {
    /// Command, class, or topic (e.g. "OPEN URL", "4D.File", "orda")
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Fetch the page and include its text
    #[arg(long)]
    pub fetch: bool,

    /// Truncate fetched text to this many characters
    #[arg(long)]
    pub max_chars: Option<usize>,
}

pub fn run(args: DocsArgs, _global: &super::GlobalArgs) -> CmdResult<DocLookup> {
    let config = defaults::load_config();
    let lookup = docs::lookup(&args.query.join(" "), args.fetch, args.max_chars, &config)?;
    Ok((lookup, 0))
}
