use std::path::PathBuf;

pub type CmdResult<T> = skill4d::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod clean;
pub mod compile;
pub mod config;
pub mod create;
pub mod dependency;
pub mod docs;
pub mod form;
pub mod guide;
pub mod info;
pub mod publish;
pub mod run;
pub mod syntax;
pub mod tool4d;
pub mod workflows;

/// Current directory, for commands whose path argument is optional.
pub(crate) fn current_dir() -> skill4d::Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| skill4d::Error::internal_io(e.to_string(), Some("read current dir".to_string())))
}

pub(crate) fn run_markdown(
    command: crate::Commands,
    _global: &GlobalArgs,
) -> skill4d::Result<(String, i32)> {
    match command {
        crate::Commands::Guide(args) => guide::run_markdown(args),
        _ => Err(skill4d::Error::validation_invalid_argument(
            "output_mode",
            "Command does not support markdown output",
            None,
            None,
        )),
    }
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (skill4d::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Info(args) => dispatch!(args, global, info),
        crate::Commands::Create(args) => dispatch!(args, global, create),
        crate::Commands::Clean(args) => dispatch!(args, global, clean),
        crate::Commands::Dependency(args) => dispatch!(args, global, dependency),
        crate::Commands::Form(args) => dispatch!(args, global, form),
        crate::Commands::Syntax(args) => dispatch!(args, global, syntax),
        crate::Commands::Tool4d(args) => dispatch!(args, global, tool4d),
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Compile(args) => dispatch!(args, global, compile),
        crate::Commands::Docs(args) => dispatch!(args, global, docs),
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
        crate::Commands::Workflows(args) => dispatch!(args, global, workflows),
        crate::Commands::Config(args) => dispatch!(args, global, config),

        // Guide uses raw output mode
        crate::Commands::Guide(_) => {
            let err = skill4d::Error::validation_invalid_argument(
                "output_mode",
                "Guide command uses raw output mode",
                None,
                None,
            );
            crate::output::map_cmd_result_to_json::<serde_json::Value>(Err(err))
        }
    }
}
