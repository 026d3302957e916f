//! Editing `Project/Sources/dependencies.json` and `environment4d.json`.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::defaults::DEPENDENCIES_FORMAT_VERSION;
use crate::error::{Error, Result};
use crate::project::{self, ProjectLayout};
use crate::utils::io;

pub const ENVIRONMENT_FILE: &str = "environment4d.json";
const COMPONENT_SUFFIX: &str = ".4dbase";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Github,
    Local,
}

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub repo: String,
    pub name: Option<String>,
    pub tag: Option<String>,
    pub version: Option<String>,
    pub project: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResult {
    pub name: String,
    pub kind: DependencyKind,
    pub entry: Value,
    pub files_modified: Vec<String>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyList {
    pub root: String,
    pub dependencies_file: String,
    pub dependencies: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_file: Option<String>,
    pub environment: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    pub name: String,
    pub files_modified: Vec<String>,
    pub messages: Vec<String>,
}

fn github_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://github\.com/([^/]+/[^/]+?)(?:\.git)?(?:/releases/tag/([^/]+))?/?$")
            .expect("valid regex")
    })
}

/// `owner/repo` and optional release tag of a GitHub URL.
pub fn parse_github_url(url: &str) -> Option<(String, Option<String>)> {
    let caps = github_url_regex().captures(url)?;
    let repo = caps.get(1)?.as_str().to_string();
    let tag = caps.get(2).map(|m| m.as_str().to_string());
    Some((repo, tag))
}

pub fn is_github_url(repo: &str) -> bool {
    repo.starts_with("https://github.com/") || repo.starts_with("http://github.com/")
}

/// GitHub URL, or `owner/repo` shorthand that is not an existing path.
pub fn is_github_repo(repo: &str) -> bool {
    if is_github_url(repo) {
        return true;
    }
    if Path::new(repo).exists() {
        return false;
    }
    repo.split('/').count() == 2 && !repo.starts_with('/') && !repo.starts_with('.')
}

pub fn dependency_name(repo: &str, name_override: Option<&str>) -> String {
    if let Some(name) = name_override.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if is_github_url(repo) {
        if let Some((parsed, _)) = parse_github_url(repo) {
            return last_segment(&parsed);
        }
    }
    if is_github_repo(repo) {
        return last_segment(repo);
    }

    let path = Path::new(repo);
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => project::dir_name(&project::absolute(path)),
    };
    name.strip_suffix(COMPONENT_SUFFIX)
        .map(str::to_string)
        .unwrap_or(name)
}

fn last_segment(repo: &str) -> String {
    repo.rsplit('/').next().unwrap_or(repo).to_string()
}

/// `--version` accepts `latest` or a semver requirement such as `1.1.0` or `^2.0`.
pub fn validate_version(version: &str) -> Result<()> {
    if version == "latest" || semver::VersionReq::parse(version).is_ok() {
        return Ok(());
    }
    Err(Error::validation_invalid_argument(
        "version",
        "Version must be 'latest' or a semantic version requirement",
        Some(version.to_string()),
        None,
    ))
}

pub fn add(options: &AddOptions) -> Result<AddResult> {
    if options.tag.is_some() && options.version.is_some() {
        return Err(Error::validation_invalid_argument(
            "tag",
            "Cannot specify both --tag and --version",
            None,
            None,
        ));
    }
    if let Some(version) = &options.version {
        validate_version(version)?;
    }

    let layout = project::locate_sources(options.project.as_deref())?;
    let repo = options.repo.as_str();
    let name = dependency_name(repo, options.name.as_deref());
    let github = is_github_repo(repo);

    let mut entry = Map::new();
    if github {
        let (github_path, url_tag) = match parse_github_url(repo) {
            Some((parsed, tag)) => (parsed, tag),
            None => (repo.to_string(), None),
        };
        entry.insert("github".to_string(), Value::String(github_path));

        if let Some(tag) = options.tag.clone().or(url_tag) {
            entry.insert("tag".to_string(), Value::String(tag));
        } else if let Some(version) = &options.version {
            entry.insert("version".to_string(), Value::String(version.clone()));
        }
    }
    let entry = Value::Object(entry);

    let mut files_modified = Vec::new();
    let mut messages = Vec::new();

    let deps_file = layout.dependencies_file();
    let mut deps = io::read_json_object_or_default(&deps_file)?;
    let mut declared = object_at(&deps, "dependencies");
    declared.insert(name.clone(), entry.clone());
    deps.insert("dependencies".to_string(), Value::Object(declared));
    if !deps.contains_key("version") {
        deps.insert(
            "version".to_string(),
            Value::from(DEPENDENCIES_FORMAT_VERSION),
        );
    }
    io::write_json_tabbed(&deps_file, &Value::Object(deps))?;

    files_modified.push(deps_file.display().to_string());
    messages.push(format!("Added '{}' to {}", name, deps_file.display()));
    crate::log_status!("dependency", "Added '{}'", name);

    if !github {
        let repo_path = project::absolute(Path::new(repo));

        if is_sibling(&layout.root, &repo_path) {
            messages.push(format!(
                "'{}' is a sibling folder, no {} update needed",
                name, ENVIRONMENT_FILE
            ));
        } else {
            let env_file = match find_environment_file(&layout.root) {
                Some(file) => file,
                None => {
                    let file = environment_file_default(&layout);
                    messages.push(format!("Creating new {}", file.display()));
                    file
                }
            };

            let mut env = io::read_json_object_or_default(&env_file)?;
            let mut env_deps = object_at(&env, "dependencies");
            env_deps.insert(name.clone(), Value::String(local_file_url(&repo_path)));
            env.insert("dependencies".to_string(), Value::Object(env_deps));
            if !env.contains_key("devDependencies") {
                env.insert("devDependencies".to_string(), Value::Object(Map::new()));
            }
            io::write_json_tabbed(&env_file, &Value::Object(env))?;

            files_modified.push(env_file.display().to_string());
            messages.push(format!("Added '{}' to {}", name, env_file.display()));
        }
    }

    Ok(AddResult {
        name,
        kind: if github {
            DependencyKind::Github
        } else {
            DependencyKind::Local
        },
        entry,
        files_modified,
        messages,
    })
}

pub fn list(project: Option<&Path>) -> Result<DependencyList> {
    let layout = project::locate_sources(project)?;
    let deps_file = layout.dependencies_file();
    let deps = io::read_json_object_or_default(&deps_file)?;

    let env_file = find_environment_file(&layout.root);
    let environment = match &env_file {
        Some(file) => object_at(&io::read_json_object_or_default(file)?, "dependencies"),
        None => Map::new(),
    };

    Ok(DependencyList {
        root: layout.root.display().to_string(),
        dependencies_file: deps_file.display().to_string(),
        dependencies: object_at(&deps, "dependencies"),
        environment_file: env_file.map(|f| f.display().to_string()),
        environment,
    })
}

pub fn remove(name: &str, project: Option<&Path>) -> Result<RemoveResult> {
    let layout = project::locate_sources(project)?;
    let deps_file = layout.dependencies_file();
    let mut deps = io::read_json_object_or_default(&deps_file)?;

    let declared = object_at(&deps, "dependencies");
    if !declared.contains_key(name) {
        return Err(Error::dependency_not_found(name));
    }

    let mut files_modified = Vec::new();
    let mut messages = Vec::new();

    deps.insert(
        "dependencies".to_string(),
        Value::Object(without_key(declared, name)),
    );
    io::write_json_tabbed(&deps_file, &Value::Object(deps))?;
    files_modified.push(deps_file.display().to_string());
    messages.push(format!("Removed '{}' from {}", name, deps_file.display()));

    if let Some(env_file) = find_environment_file(&layout.root) {
        let mut env = io::read_json_object_or_default(&env_file)?;
        let env_deps = object_at(&env, "dependencies");
        if env_deps.contains_key(name) {
            env.insert(
                "dependencies".to_string(),
                Value::Object(without_key(env_deps, name)),
            );
            io::write_json_tabbed(&env_file, &Value::Object(env))?;
            files_modified.push(env_file.display().to_string());
            messages.push(format!("Removed '{}' from {}", name, env_file.display()));
        }
    }

    crate::log_status!("dependency", "Removed '{}'", name);

    Ok(RemoveResult {
        name: name.to_string(),
        files_modified,
        messages,
    })
}

/// Nearest `environment4d.json` at or above `start`.
pub fn find_environment_file(start: &Path) -> Option<PathBuf> {
    project::absolute(start)
        .ancestors()
        .map(|dir| dir.join(ENVIRONMENT_FILE))
        .find(|file| file.is_file())
}

fn environment_file_default(layout: &ProjectLayout) -> PathBuf {
    layout
        .root
        .parent()
        .unwrap_or(&layout.root)
        .join(ENVIRONMENT_FILE)
}

fn is_sibling(project_root: &Path, repo_path: &Path) -> bool {
    let project_parent = project::absolute(project_root)
        .parent()
        .map(Path::to_path_buf);
    let repo_parent = repo_path.parent().map(Path::to_path_buf);
    project_parent.is_some() && project_parent == repo_parent
}

/// `file://` URL for a local component, preferring an existing `.4dbase`
/// folder next to or inside the given path.
pub fn local_file_url(repo_path: &Path) -> String {
    let display = repo_path.display().to_string();
    if display.ends_with(COMPONENT_SUFFIX) {
        return format!("file://{}", display);
    }

    let beside = PathBuf::from(format!("{}{}", display, COMPONENT_SUFFIX));
    if beside.is_dir() {
        return format!("file://{}", beside.display());
    }

    let inside = repo_path.join(format!(
        "{}{}",
        project::dir_name(repo_path),
        COMPONENT_SUFFIX
    ));
    if inside.is_dir() {
        return format!("file://{}", inside.display());
    }

    format!("file://{}", display)
}

fn object_at(map: &Map<String, Value>, key: &str) -> Map<String, Value> {
    map.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Rebuild without `key`, keeping the order of the remaining entries.
fn without_key(map: Map<String, Value>, key: &str) -> Map<String, Value> {
    map.into_iter().filter(|(k, _)| k != key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sources_project(parent: &Path, name: &str) -> PathBuf {
        let root = parent.join(name);
        fs::create_dir_all(root.join("Project/Sources")).unwrap();
        root
    }

    fn add_opts(repo: &str, project: &Path) -> AddOptions {
        AddOptions {
            repo: repo.to_string(),
            project: Some(project.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_github_urls() {
        assert_eq!(
            parse_github_url("https://github.com/mesopelagique/SemVer"),
            Some(("mesopelagique/SemVer".to_string(), None))
        );
        assert_eq!(
            parse_github_url("https://github.com/mesopelagique/SemVer/releases/tag/0.2.0"),
            Some(("mesopelagique/SemVer".to_string(), Some("0.2.0".to_string())))
        );
        assert_eq!(
            parse_github_url("https://github.com/owner/repo.git/"),
            Some(("owner/repo".to_string(), None))
        );
        assert!(parse_github_url("https://gitlab.com/owner/repo").is_none());
    }

    #[test]
    fn derives_names() {
        assert_eq!(dependency_name("owner/JSONRPC", None), "JSONRPC");
        assert_eq!(
            dependency_name("https://github.com/owner/SemVer/releases/tag/1", None),
            "SemVer"
        );
        assert_eq!(dependency_name("/some/where/Comp.4dbase", None), "Comp");
        assert_eq!(dependency_name("owner/repo", Some("Custom")), "Custom");
    }

    #[test]
    fn shorthand_rules() {
        assert!(is_github_repo("owner/repo"));
        assert!(!is_github_repo("a/b/c"));
        assert!(!is_github_repo("./a"));
        assert!(!is_github_repo("/abs"));
    }

    #[test]
    fn tag_and_version_conflict() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let mut opts = add_opts("owner/repo", &root);
        opts.tag = Some("1.0.0".to_string());
        opts.version = Some("1.0.0".to_string());

        let err = add(&opts).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn version_must_be_semver_or_latest() {
        assert!(validate_version("latest").is_ok());
        assert!(validate_version("1.1.0").is_ok());
        assert!(validate_version("^2.0").is_ok());
        assert!(validate_version("banana").is_err());
    }

    #[test]
    fn github_entry_prefers_cli_tag_over_url_tag() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let mut opts = add_opts("https://github.com/owner/Lib/releases/tag/0.1.0", &root);
        opts.tag = Some("0.2.0".to_string());

        let result = add(&opts).unwrap();
        assert_eq!(result.kind, DependencyKind::Github);
        assert_eq!(result.entry["github"], "owner/Lib");
        assert_eq!(result.entry["tag"], "0.2.0");

        let deps = io::read_json(&root.join("Project/Sources/dependencies.json")).unwrap();
        assert_eq!(deps["version"], 2130);
        assert_eq!(deps["dependencies"]["Lib"]["tag"], "0.2.0");
    }

    #[test]
    fn existing_keys_are_preserved() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let deps_file = root.join("Project/Sources/dependencies.json");
        fs::write(
            &deps_file,
            r#"{"version": 1, "custom": true, "dependencies": {"Old": {}}}"#,
        )
        .unwrap();

        add(&add_opts("owner/New", &root)).unwrap();

        let deps = io::read_json(&deps_file).unwrap();
        assert_eq!(deps["version"], 1);
        assert_eq!(deps["custom"], true);
        assert!(deps["dependencies"]["Old"].is_object());
        assert_eq!(deps["dependencies"]["New"]["github"], "owner/New");
    }

    #[test]
    fn sibling_local_dependency_skips_environment() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let sibling = dir.path().join("Widgets");
        fs::create_dir_all(&sibling).unwrap();

        let result = add(&add_opts(sibling.to_str().unwrap(), &root)).unwrap();
        assert_eq!(result.kind, DependencyKind::Local);
        assert_eq!(result.entry, serde_json::json!({}));
        assert_eq!(result.files_modified.len(), 1);
        assert!(!dir.path().join(ENVIRONMENT_FILE).exists());
    }

    #[test]
    fn missing_sibling_with_parent_components_is_still_a_sibling() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let repo = root.join("..").join("NotClonedYet");

        let result = add(&add_opts(repo.to_str().unwrap(), &root)).unwrap();
        assert_eq!(result.name, "NotClonedYet");
        assert_eq!(result.files_modified.len(), 1);
        assert!(!dir.path().join(ENVIRONMENT_FILE).exists());
    }

    #[test]
    fn distant_local_dependency_writes_environment() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let component = dir.path().join("vendor/Charts");
        fs::create_dir_all(component.join("Charts.4dbase")).unwrap();

        let result = add(&add_opts(component.to_str().unwrap(), &root)).unwrap();
        assert_eq!(result.files_modified.len(), 2);

        let env = io::read_json(&dir.path().join(ENVIRONMENT_FILE)).unwrap();
        let url = env["dependencies"]["Charts"].as_str().unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("Charts/Charts.4dbase"));
        assert!(env["devDependencies"].is_object());
    }

    #[test]
    fn list_and_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let component = dir.path().join("vendor/Charts");
        fs::create_dir_all(&component).unwrap();
        add(&add_opts("owner/Lib", &root)).unwrap();
        add(&add_opts(component.to_str().unwrap(), &root)).unwrap();

        let listed = list(Some(&root)).unwrap();
        let names: Vec<&String> = listed.dependencies.keys().collect();
        assert_eq!(names, vec!["Lib", "Charts"]);
        assert!(listed.environment.contains_key("Charts"));

        let removed = remove("Charts", Some(&root)).unwrap();
        assert_eq!(removed.files_modified.len(), 2);

        let listed = list(Some(&root)).unwrap();
        assert!(!listed.dependencies.contains_key("Charts"));
        assert!(listed.environment.is_empty());
    }

    #[test]
    fn removing_unknown_dependency_fails() {
        let dir = TempDir::new().unwrap();
        let root = sources_project(dir.path(), "App");
        let err = remove("Ghost", Some(&root)).unwrap_err();
        assert_eq!(err.code.as_str(), "dependency.not_found");
    }
}
