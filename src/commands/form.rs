use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use skill4d::form::{self, FormValidation, ProjectFormsValidation};

use super::CmdResult;

#[derive(Args)]
pub struct FormArgs {
    #[command(subcommand)]
    command: FormCommand,
}

#[derive(Subcommand)]
enum FormCommand {
    /// Validate one form.4DForm file against the forms JSON schema
    Validate {
        /// Path to the form file
        form: PathBuf,

        /// Schema file (default: SKILL4D_FORMS_SCHEMA, config, bundled asset)
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Validate every form of a project
    ValidateAll {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,

        /// Schema file (default: SKILL4D_FORMS_SCHEMA, config, bundled asset)
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum FormOutput {
    #[serde(rename = "form.validate")]
    Validate(FormValidation),

    #[serde(rename = "form.validate-all")]
    ValidateAll(ProjectFormsValidation),
}

/// Exit 1 when any form fails validation.
pub fn run(args: FormArgs, _global: &super::GlobalArgs) -> CmdResult<FormOutput> {
    match args.command {
        FormCommand::Validate { form, schema } => {
            let result = form::validate(&form, schema.as_deref())?;
            let exit_code = if result.valid { 0 } else { 1 };
            Ok((FormOutput::Validate(result), exit_code))
        }
        FormCommand::ValidateAll { path, schema } => {
            let result = form::validate_all(path.as_deref(), schema.as_deref())?;
            let exit_code = if result.invalid == 0 { 0 } else { 1 };
            Ok((FormOutput::ValidateAll(result), exit_code))
        }
    }
}
