use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    ProjectNotFound,
    ProjectAlreadyExists,
    DependencyNotFound,
    FormNotFound,
    SchemaNotFound,
    GrammarNotFound,
    SkillNotFound,
    Tool4dNotFound,
    ToolNotInstalled,

    PublishNotAuthenticated,
    PublishCancelled,

    Tool4dLaunchFailed,
    GitCommandFailed,
    HostCommandFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::ProjectNotFound => "project.not_found",
            ErrorCode::ProjectAlreadyExists => "project.already_exists",
            ErrorCode::DependencyNotFound => "dependency.not_found",
            ErrorCode::FormNotFound => "form.not_found",
            ErrorCode::SchemaNotFound => "schema.not_found",
            ErrorCode::GrammarNotFound => "grammar.not_found",
            ErrorCode::SkillNotFound => "skill.not_found",
            ErrorCode::Tool4dNotFound => "tool4d.not_found",
            ErrorCode::ToolNotInstalled => "tool.not_installed",

            ErrorCode::PublishNotAuthenticated => "publish.not_authenticated",
            ErrorCode::PublishCancelled => "publish.cancelled",

            ErrorCode::Tool4dLaunchFailed => "tool4d.launch_failed",
            ErrorCode::GitCommandFailed => "git.command_failed",
            ErrorCode::HostCommandFailed => "host.command_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCommandFailedDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            details,
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "line": err.line(),
            "column": err.column(),
            "context": context,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = serde_json::json!({
            "path": path.into(),
            "error": err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn project_not_found(searched_from: impl Into<String>) -> Self {
        let details = serde_json::json!({ "searchedFrom": searched_from.into() });
        Self::new(ErrorCode::ProjectNotFound, "No 4D project found", details)
            .with_hint("Run inside a folder containing Project/<Name>.4DProject, or pass its path")
    }

    pub fn project_already_exists(path: impl Into<String>) -> Self {
        let details = serde_json::json!({ "path": path.into() });
        Self::new(
            ErrorCode::ProjectAlreadyExists,
            "Target directory already exists and is not empty",
            details,
        )
        .with_hint("Pick another name or pass --force to write into it")
    }

    pub fn dependency_not_found(name: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::DependencyNotFound, "Dependency not found", name, None)
            .with_hint("Run 'skill4d dependency list' to see declared dependencies")
    }

    pub fn form_not_found(path: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::FormNotFound, "Form file not found", path, None)
    }

    pub fn schema_not_found(tried: Vec<String>) -> Self {
        Self::not_found(
            ErrorCode::SchemaNotFound,
            "Schema file not found",
            "formsSchema.json",
            Some(tried),
        )
        .with_hint("Pass --schema <file> or set SKILL4D_FORMS_SCHEMA")
    }

    pub fn grammar_not_found(tried: Vec<String>) -> Self {
        Self::not_found(
            ErrorCode::GrammarNotFound,
            "Command grammar file not found",
            "commands.tsv",
            Some(tried),
        )
        .with_hint("Pass --grammar <file> or set SKILL4D_GRAMMAR")
    }

    pub fn skill_not_found(id: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::SkillNotFound, "Skill not found", id, None)
            .with_hint("Run 'skill4d guide' to list available skills")
    }

    pub fn tool4d_not_found(tried: Vec<String>) -> Self {
        Self::not_found(
            ErrorCode::Tool4dNotFound,
            "tool4d binary not found",
            "tool4d",
            Some(tried),
        )
        .with_hint("Pass --tool4d <path>, set TOOL4D, or run 'skill4d config set tool4dPath <path>'")
    }

    pub fn tool_not_installed(tool: impl Into<String>, install_hints: Vec<String>) -> Self {
        let tool = tool.into();
        let mut err = Self::new(
            ErrorCode::ToolNotInstalled,
            format!("{} is not installed", tool),
            serde_json::json!({ "tool": tool }),
        );
        for hint in install_hints {
            err = err.with_hint(hint);
        }
        err
    }

    pub fn publish_not_authenticated(provider: &str, login_command: impl Into<String>) -> Self {
        let login_command = login_command.into();
        Self::new(
            ErrorCode::PublishNotAuthenticated,
            format!("{} CLI not authenticated", provider),
            serde_json::json!({ "provider": provider, "loginCommand": login_command }),
        )
        .with_hint(format!("Please run: {}", login_command))
    }

    pub fn publish_cancelled(step: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PublishCancelled,
            "Cancelled by user",
            serde_json::json!({ "step": step.into() }),
        )
    }

    pub fn tool4d_launch_failed(binary: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Tool4dLaunchFailed,
            "Failed to launch tool4d",
            serde_json::json!({ "binary": binary.into(), "error": error.into() }),
        )
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn host_command_failed(details: ExternalCommandFailedDetails) -> Self {
        let message = format!("Command failed: {}", details.command);
        Self::new(ErrorCode::HostCommandFailed, message, to_details(details))
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::internal_unexpected(message)
    }

    fn not_found(
        code: ErrorCode,
        message: &str,
        id: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(NotFoundDetails {
            id: id.into(),
            tried,
        });
        Self::new(code, message, details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_carries_problem_in_message() {
        let err = Error::validation_invalid_argument(
            "tag",
            "Cannot specify both --tag and --version",
            None,
            None,
        );
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert!(err.message.contains("--tag"));
        assert_eq!(err.details["field"], "tag");
    }

    #[test]
    fn tool_not_installed_turns_install_steps_into_hints() {
        let err = Error::tool_not_installed(
            "gh",
            vec!["brew install gh".to_string(), "https://cli.github.com/".to_string()],
        );
        assert_eq!(err.hints.len(), 2);
        assert_eq!(err.details["tool"], "gh");
    }

    #[test]
    fn schema_not_found_lists_tried_locations() {
        let err = Error::schema_not_found(vec!["/a/formsSchema.json".to_string()]);
        assert_eq!(err.code, ErrorCode::SchemaNotFound);
        assert_eq!(err.details["tried"][0], "/a/formsSchema.json");
    }
}
