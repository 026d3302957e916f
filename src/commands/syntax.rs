use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use skill4d::grammar::{self, FindOptions, FindResult, ThemesResult, DEFAULT_LIMIT};

use super::CmdResult;

#[derive(Args)]
pub struct SyntaxArgs {
    #[command(subcommand)]
    command: SyntaxCommand,
}

#[derive(Subcommand)]
enum SyntaxCommand {
    /// Find 4D commands by name
    Find {
        /// Search terms; every term must match
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Grammar file (default: SKILL4D_GRAMMAR, config, bundled asset)
        #[arg(long)]
        grammar: Option<PathBuf>,

        /// Only commands whose theme contains this text
        #[arg(long)]
        theme: Option<String>,

        /// Also match terms against the syntax
        #[arg(long)]
        in_syntax: bool,

        /// Maximum matches (0 for unlimited)
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// List command themes with their command counts
    Themes {
        /// Grammar file (default: SKILL4D_GRAMMAR, config, bundled asset)
        #[arg(long)]
        grammar: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum SyntaxOutput {
    #[serde(rename = "syntax.find")]
    Find(FindResult),

    #[serde(rename = "syntax.themes")]
    Themes(ThemesResult),
}

pub fn run(args: SyntaxArgs, _global: &super::GlobalArgs) -> CmdResult<SyntaxOutput> {
    let output = match args.command {
        SyntaxCommand::Find {
            query,
            grammar,
            theme,
            in_syntax,
            limit,
        } => {
            let options = FindOptions {
                theme,
                in_syntax,
                limit,
            };
            SyntaxOutput::Find(grammar::find(&query.join(" "), grammar.as_deref(), &options)?)
        }
        SyntaxCommand::Themes { grammar } => {
            SyntaxOutput::Themes(grammar::themes(grammar.as_deref())?)
        }
    };

    Ok((output, 0))
}
