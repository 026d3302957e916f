//! Driving the `tool4d` headless runtime: locating it, running a project
//! method, compiling a project, and reading diagnostics out of its output.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::defaults::{self, expand_path};
use crate::error::{Error, Result};
use crate::project::{self, ProjectLayout};
use crate::utils::{command, io};

pub const TOOL4D_ENV_VAR: &str = "TOOL4D";
const RUNNER_NAME: &str = "Runner";
const COMPILE_METHOD: &str = "compile";

const COMPILE_METHOD_SOURCE: &str = r#"//%attributes = {"invisible":true}
var $target : Text
var $status : Real
var $result : Object

$status:=Get database parameter(User param value; $target)
$result:=Compile project(File($target; fk platform path))
LOG EVENT(Into system standard outputs; JSON Stringify($result)+Char(Line feed))
QUIT 4D
"#;

/// Where the binary was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationSource {
    Argument,
    Environment,
    Config,
    Path,
    PlatformDefault,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool4dLocation {
    pub path: String,
    pub source: LocationSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedOutput {
    /// The `Compile project` result object, when one was printed.
    pub compile_result: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedOutput {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool4dReport {
    pub command: String,
    pub project_file: String,
    pub tool4d: String,
    pub exit_code: i32,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub method: String,
    pub project: Option<PathBuf>,
    pub user_param: Option<String>,
    pub tool4d: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub project: Option<PathBuf>,
    pub tool4d: Option<PathBuf>,
    pub keep_runner: bool,
}

/// Find the binary: explicit path alone when given, else `TOOL4D`, config
/// `tool4dPath`, `PATH`, then platform install locations.
pub fn locate(explicit: Option<&Path>) -> Result<Tool4dLocation> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(found(path.to_path_buf(), LocationSource::Argument));
        }
        return Err(Error::tool4d_not_found(vec![path.display().to_string()]));
    }

    let mut tried = Vec::new();

    if let Ok(value) = std::env::var(TOOL4D_ENV_VAR) {
        if !value.trim().is_empty() {
            let path = expand_path(&value);
            if path.is_file() {
                return Ok(found(path, LocationSource::Environment));
            }
            tried.push(path.display().to_string());
        }
    }

    if let Some(path) = defaults::load_config().tool4d_path() {
        if path.is_file() {
            return Ok(found(path, LocationSource::Config));
        }
        tried.push(path.display().to_string());
    }

    match which::which("tool4d") {
        Ok(path) => return Ok(found(path, LocationSource::Path)),
        Err(_) => tried.push("tool4d (PATH)".to_string()),
    }

    for path in platform_defaults() {
        if path.is_file() {
            return Ok(found(path, LocationSource::PlatformDefault));
        }
        tried.push(path.display().to_string());
    }

    Err(Error::tool4d_not_found(tried))
}

fn found(path: PathBuf, source: LocationSource) -> Tool4dLocation {
    Tool4dLocation {
        path: path.display().to_string(),
        source,
    }
}

/// Default install locations for the current OS.
pub fn platform_defaults() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/Applications/tool4d.app/Contents/MacOS/tool4d"),
            expand_path("~/Applications/tool4d.app/Contents/MacOS/tool4d"),
        ]
    } else if cfg!(windows) {
        vec![PathBuf::from(r"C:\Program Files\tool4d\tool4d.exe")]
    } else {
        vec![
            PathBuf::from("/opt/tool4d/tool4d"),
            expand_path("~/.local/bin/tool4d"),
        ]
    }
}

/// The fixed headless flag set.
pub fn launch_args(project_file: &Path, method: &str, user_param: Option<&str>) -> Vec<String> {
    let mut args = vec![
        format!("--project={}", project_file.display()),
        "--dataless".to_string(),
        "--skip-onstartup".to_string(),
        format!("--startup-method={}", method),
    ];
    if let Some(param) = user_param {
        args.push(format!("--user-param={}", param));
    }
    args
}

/// Run `method` of the located project.
pub fn run(options: &RunOptions) -> Result<Tool4dReport> {
    if options.method.trim().is_empty() {
        return Err(Error::validation_missing_argument(vec!["method".to_string()]));
    }

    let layout = project::locate(options.project.as_deref())?;
    let project_file = require_project_file(&layout)?;
    let binary = locate(options.tool4d.as_deref())?;

    let args = launch_args(&project_file, &options.method, options.user_param.as_deref());
    crate::log_status!("run", "{} {}", binary.path, options.method);

    let outcome = launch(&binary.path, &layout.root, &args)?;
    let parsed = parse_output(&outcome.output.stdout, &outcome.output.stderr);
    let success = outcome.exit_code == 0 && parsed.error_count() == 0;

    Ok(report("run", &project_file, &binary, outcome, parsed, success, None))
}

/// Compile the located project through a throwaway runner project.
pub fn compile(options: &CompileOptions) -> Result<Tool4dReport> {
    let layout = project::locate(options.project.as_deref())?;
    let project_file = require_project_file(&layout)?;
    let binary = locate(options.tool4d.as_deref())?;

    let runner_dir = tempfile::Builder::new()
        .prefix("skill4d-runner-")
        .tempdir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create runner project".to_string())))?;
    let runner_file = write_runner_project(runner_dir.path())?;

    let target = project_file.display().to_string();
    let args = launch_args(&runner_file, COMPILE_METHOD, Some(&target));
    crate::log_status!("compile", "Compiling {}", target);

    let outcome = launch(&binary.path, runner_dir.path(), &args)?;
    let parsed = parse_output(&outcome.output.stdout, &outcome.output.stderr);

    let success = match parsed
        .compile_result
        .as_ref()
        .and_then(|r| r.get("success"))
        .and_then(Value::as_bool)
    {
        Some(success) => success,
        None => outcome.exit_code == 0 && parsed.error_count() == 0,
    };

    let runner = if options.keep_runner {
        Some(runner_dir.keep().display().to_string())
    } else {
        None
    };

    Ok(report(
        "compile",
        &project_file,
        &binary,
        outcome,
        parsed,
        success,
        runner,
    ))
}

/// Lay out `Project/Runner.4DProject` with a single compile method.
pub fn write_runner_project(dir: &Path) -> Result<PathBuf> {
    let layout = ProjectLayout::new(dir);
    let project_file = layout
        .project_dir()
        .join(format!("{}.{}", RUNNER_NAME, project::PROJECT_FILE_EXTENSION));

    io::write_json_tabbed(
        &project_file,
        &serde_json::json!({
            "compatibilityVersion": defaults::load_config().compatibility_version,
            "tokenizedText": false,
        }),
    )?;
    io::write_file(
        &layout.methods_dir().join(format!("{}.4dm", COMPILE_METHOD)),
        COMPILE_METHOD_SOURCE,
        "write runner method",
    )?;

    Ok(project_file)
}

fn require_project_file(layout: &ProjectLayout) -> Result<PathBuf> {
    layout
        .project_file()
        .ok_or_else(|| Error::project_not_found(layout.root.display().to_string()))
}

fn launch(binary: &str, dir: &Path, args: &[String]) -> Result<command::CommandOutcome> {
    command::capture_in(dir, binary, args)
        .map_err(|e| Error::tool4d_launch_failed(binary, e.to_string()))
}

fn report(
    command: &str,
    project_file: &Path,
    binary: &Tool4dLocation,
    outcome: command::CommandOutcome,
    parsed: ParsedOutput,
    success: bool,
    runner: Option<String>,
) -> Tool4dReport {
    Tool4dReport {
        command: command.to_string(),
        project_file: project_file.display().to_string(),
        tool4d: binary.path.clone(),
        exit_code: outcome.exit_code,
        success,
        errors: parsed.error_count(),
        warnings: parsed.warning_count(),
        diagnostics: parsed.diagnostics,
        stdout: outcome.output.stdout,
        stderr: outcome.output.stderr,
        runner,
    }
}

fn diagnostic_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:(?P<file>(?:[A-Za-z]:)?[^:\s][^:]*?):(?P<line>\d+):\s*)?(?P<severity>error|warning)\s*[:\-]\s*(?P<message>.+?)\s*$",
        )
        .expect("valid regex")
    })
}

/// Pull diagnostics out of a tool4d run.
///
/// A JSON object with a `success` key on stdout (the last one wins) is a
/// compile result and its `errors` array is authoritative. Without one, lines
/// of both streams shaped like `[file:line:] error|warning: message` are used.
pub fn parse_output(stdout: &str, stderr: &str) -> ParsedOutput {
    let compile_result = stdout
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
        .find(|value| value.as_object().is_some_and(|o| o.contains_key("success")));

    if let Some(result) = compile_result {
        let diagnostics = result
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| errors.iter().map(compile_diagnostic).collect())
            .unwrap_or_default();

        return ParsedOutput {
            compile_result: Some(result),
            diagnostics,
        };
    }

    let diagnostics = stdout
        .lines()
        .chain(stderr.lines())
        .filter_map(text_diagnostic)
        .collect();

    ParsedOutput {
        compile_result: None,
        diagnostics,
    }
}

fn compile_diagnostic(error: &Value) -> Diagnostic {
    let severity = if error.get("isError").and_then(Value::as_bool) == Some(false) {
        Severity::Warning
    } else {
        Severity::Error
    };

    let code = error.get("code");
    let method = code
        .and_then(|c| c.get("path").or_else(|| c.get("methodName")))
        .and_then(Value::as_str)
        .map(str::to_string);
    let line = error
        .get("lineInFile")
        .or_else(|| error.get("line"))
        .and_then(Value::as_u64);

    Diagnostic {
        severity,
        message: error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        file: None,
        method,
        line,
    }
}

fn text_diagnostic(line: &str) -> Option<Diagnostic> {
    let caps = diagnostic_line_regex().captures(line)?;
    let severity = if caps["severity"].eq_ignore_ascii_case("warning") {
        Severity::Warning
    } else {
        Severity::Error
    };

    Some(Diagnostic {
        severity,
        message: caps["message"].to_string(),
        file: caps.name("file").map(|m| m.as_str().to_string()),
        method: None,
        line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn launch_args_are_fixed() {
        let args = launch_args(Path::new("/p/Project/App.4DProject"), "test_all", Some("x"));
        assert_eq!(
            args,
            vec![
                "--project=/p/Project/App.4DProject",
                "--dataless",
                "--skip-onstartup",
                "--startup-method=test_all",
                "--user-param=x",
            ]
        );
        assert_eq!(launch_args(Path::new("a"), "m", None).len(), 4);
    }

    #[test]
    fn compile_result_json_wins() {
        let stdout = "starting\n\
            {\"success\":false,\"errors\":[\
            {\"isError\":true,\"message\":\"Unknown command\",\"code\":{\"path\":\"Methods/main\"},\"lineInFile\":12},\
            {\"isError\":false,\"message\":\"Unused variable\",\"code\":{\"methodName\":\"helper\"},\"line\":3}]}\n";
        let parsed = parse_output(stdout, "error: ignored when a result exists");

        assert!(parsed.compile_result.is_some());
        assert_eq!(parsed.error_count(), 1);
        assert_eq!(parsed.warning_count(), 1);
        assert_eq!(parsed.diagnostics[0].method.as_deref(), Some("Methods/main"));
        assert_eq!(parsed.diagnostics[0].line, Some(12));
        assert_eq!(parsed.diagnostics[1].method.as_deref(), Some("helper"));
        assert_eq!(parsed.diagnostics[1].line, Some(3));
    }

    #[test]
    fn last_result_object_is_used() {
        let stdout = "{\"success\":false,\"errors\":[{\"message\":\"old\"}]}\n\
            {\"other\":1}\n\
            {\"success\":true,\"errors\":[]}\n";
        let parsed = parse_output(stdout, "");
        assert_eq!(parsed.compile_result.unwrap()["success"], true);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn textual_diagnostics_keep_windows_paths() {
        let parsed = parse_output("C:\\proj\\m.4dm:7: error: x\n", "");

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].file.as_deref(), Some("C:\\proj\\m.4dm"));
        assert_eq!(parsed.diagnostics[0].line, Some(7));
        assert_eq!(parsed.diagnostics[0].message, "x");
    }

    #[test]
    fn textual_diagnostics() {
        let stdout = "Loading project\nERROR: Table not found\n";
        let stderr = "Methods/main.4dm:7: warning - deprecated command\nerrors are fine here\n";
        let parsed = parse_output(stdout, stderr);

        assert_eq!(
            parsed.diagnostics,
            vec![
                Diagnostic {
                    severity: Severity::Error,
                    message: "Table not found".to_string(),
                    file: None,
                    method: None,
                    line: None,
                },
                Diagnostic {
                    severity: Severity::Warning,
                    message: "deprecated command".to_string(),
                    file: Some("Methods/main.4dm".to_string()),
                    method: None,
                    line: Some(7),
                },
            ]
        );
    }

    #[test]
    fn explicit_missing_binary_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = locate(Some(&dir.path().join("tool4d"))).unwrap_err();
        assert_eq!(err.code.as_str(), "tool4d.not_found");
        assert!(!err.hints.is_empty());
    }

    #[test]
    fn explicit_binary_is_used() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("tool4d");
        fs::write(&bin, "").unwrap();
        let location = locate(Some(&bin)).unwrap();
        assert_eq!(location.source, LocationSource::Argument);
    }

    #[test]
    fn runner_project_is_locatable() {
        let dir = TempDir::new().unwrap();
        let project_file = write_runner_project(dir.path()).unwrap();
        assert!(project_file.ends_with("Project/Runner.4DProject"));

        let method = dir.path().join("Project/Sources/Methods/compile.4dm");
        let source = fs::read_to_string(method).unwrap();
        assert!(source.contains("Compile project"));
        assert!(source.contains("QUIT 4D"));
        assert!(project::find_project_root(dir.path()).is_some());
    }

    #[test]
    fn run_requires_a_method() {
        let err = run(&RunOptions::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_script_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("App");
        fs::create_dir_all(root.join("Project/Sources")).unwrap();
        fs::write(root.join("Project/App.4DProject"), "{}").unwrap();

        let bin = dir.path().join("tool4d");
        fs::write(&bin, "#!/bin/sh\necho \"$4\"\necho 'error: boom' >&2\nexit 3\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let report = run(&RunOptions {
            method: "main".to_string(),
            project: Some(root),
            user_param: None,
            tool4d: Some(bin),
        })
        .unwrap();

        assert_eq!(report.exit_code, 3);
        assert!(!report.success);
        assert_eq!(report.errors, 1);
        assert_eq!(report.stdout.trim(), "--startup-method=main");
    }

    #[cfg(unix)]
    #[test]
    fn compile_keeps_runner_when_asked() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("App");
        fs::create_dir_all(root.join("Project/Sources")).unwrap();
        fs::write(root.join("Project/App.4DProject"), "{}").unwrap();

        let bin = dir.path().join("tool4d");
        fs::write(&bin, "#!/bin/sh\necho '{\"success\":true,\"errors\":[]}'\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let report = compile(&CompileOptions {
            project: Some(root),
            tool4d: Some(bin),
            keep_runner: true,
        })
        .unwrap();

        assert!(report.success);
        let runner = PathBuf::from(report.runner.unwrap());
        assert!(runner.join("Project/Runner.4DProject").is_file());
        fs::remove_dir_all(runner).unwrap();
    }
}
