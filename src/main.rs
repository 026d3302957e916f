use clap::{Parser, Subcommand};

use commands::GlobalArgs;

#[derive(Debug, Clone, Copy)]
enum ResponseMode {
    Json,
    Markdown,
}

mod commands;
mod output;
mod tty;

use commands::{
    clean, compile, config, create, dependency, docs, form, guide, info, publish, run, syntax,
    tool4d, workflows,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "skill4d")]
#[command(version = VERSION)]
#[command(about = "Command-line toolkit for 4D projects: inspect, scaffold, validate, compile and publish")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a 4D project (methods, classes, forms, settings)
    Info(info::InfoArgs),
    /// Create a new 4D project skeleton
    Create(create::CreateArgs),
    /// Remove generated artifacts (DerivedData, Libraries, logs, ...)
    Clean(clean::CleanArgs),
    /// Manage component dependencies
    #[command(visible_alias = "deps")]
    Dependency(dependency::DependencyArgs),
    /// Validate forms against the 4D forms JSON schema
    Form(form::FormArgs),
    /// Look up 4D command syntax
    Syntax(syntax::SyntaxArgs),
    /// Inspect the tool4d installation
    Tool4d(tool4d::Tool4dArgs),
    /// Run a project method headless with tool4d
    Run(run::RunArgs),
    /// Compile a project with tool4d and report diagnostics
    Compile(compile::CompileArgs),
    /// Resolve (and optionally fetch) 4D documentation pages
    Docs(docs::DocsArgs),
    /// Publish the project to GitHub or GitLab
    Publish(publish::PublishArgs),
    /// Manage GitHub Actions workflows
    Workflows(workflows::WorkflowsArgs),
    /// Print skill instructions as markdown
    Guide(guide::GuideArgs),
    /// Manage global skill4d configuration
    Config(config::ConfigArgs),
}

fn response_mode(command: &Commands) -> ResponseMode {
    match command {
        Commands::Guide(_) => ResponseMode::Markdown,
        _ => ResponseMode::Json,
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    if let ResponseMode::Markdown = response_mode(&cli.command) {
        return match commands::run_markdown(cli.command, &global) {
            Ok((content, exit_code)) => {
                let _ = output::print_markdown(&content);
                std::process::ExitCode::from(exit_code_to_u8(exit_code))
            }
            Err(err) => {
                let exit_code = output::exit_code_for_error(err.code);
                let _ = output::print_result::<serde_json::Value>(Err(err));
                std::process::ExitCode::from(exit_code_to_u8(exit_code))
            }
        };
    }

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
