use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::paths;

/// Root configuration structure for skill4d.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill4dConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool4d_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forms_schema_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_path: Option<String>,

    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    #[serde(default = "default_compatibility_version")]
    pub compatibility_version: u32,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_max_doc_chars")]
    pub max_doc_chars: usize,
}

impl Default for Skill4dConfig {
    fn default() -> Self {
        Self {
            tool4d_path: None,
            forms_schema_path: None,
            grammar_path: None,
            docs_base_url: default_docs_base_url(),
            compatibility_version: default_compatibility_version(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_doc_chars: default_max_doc_chars(),
        }
    }
}

impl Skill4dConfig {
    pub fn tool4d_path(&self) -> Option<PathBuf> {
        self.tool4d_path.as_deref().map(expand_path)
    }

    pub fn forms_schema_path(&self) -> Option<PathBuf> {
        self.forms_schema_path.as_deref().map(expand_path)
    }

    pub fn grammar_path(&self) -> Option<PathBuf> {
        self.grammar_path.as_deref().map(expand_path)
    }
}

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "tool4dPath",
    "formsSchemaPath",
    "grammarPath",
    "docsBaseUrl",
    "compatibilityVersion",
    "fetchTimeoutSecs",
    "maxDocChars",
];

/// dependencies.json format version written when the file has none.
pub const DEPENDENCIES_FORMAT_VERSION: u32 = 2130;

// =============================================================================
// Default value functions
// =============================================================================

fn default_docs_base_url() -> String {
    "https://developer.4d.com/docs".to_string()
}

fn default_compatibility_version() -> u32 {
    2100
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_doc_chars() -> usize {
    4000
}

/// Expand `~` and `$VARS` in a configured path, keeping the raw value on failure.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load the full skill4d.json config, falling back to defaults on any error.
pub fn load_config() -> Skill4dConfig {
    load_config_from_file().unwrap_or_default()
}

/// Attempt to load config from skill4d.json file.
fn load_config_from_file() -> crate::Result<Skill4dConfig> {
    let path = paths::skill4d_json()?;

    if !path.exists() {
        return Err(crate::Error::other("skill4d.json not found"));
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))
}

/// Save config to skill4d.json file (creates if missing).
pub fn save_config(config: &Skill4dConfig) -> crate::Result<()> {
    let path = paths::skill4d_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize skill4d.json".to_string()))
    })?;

    fs::write(&path, content).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })
}

/// Return a copy of `config` with `key` set to `raw`.
///
/// `raw` is parsed as JSON first and falls back to a plain string, so
/// `compatibilityVersion 2050` and `tool4dPath ~/bin/tool4d` both work.
pub fn with_value(config: &Skill4dConfig, key: &str, raw: &str) -> crate::Result<Skill4dConfig> {
    require_known_key(key)?;

    let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let mut json = to_object(config)?;
    json.insert(key.to_string(), value);

    serde_json::from_value(Value::Object(json)).map_err(|e| {
        crate::Error::config_invalid_value(key, Some(raw.to_string()), e.to_string())
    })
}

/// Return a copy of `config` with `key` restored to its built-in default.
pub fn without_value(config: &Skill4dConfig, key: &str) -> crate::Result<Skill4dConfig> {
    require_known_key(key)?;

    let mut json = to_object(config)?;
    json.remove(key);

    serde_json::from_value(Value::Object(json))
        .map_err(|e| crate::Error::config_invalid_value(key, None, e.to_string()))
}

fn require_known_key(key: &str) -> crate::Result<()> {
    if CONFIG_KEYS.contains(&key) {
        return Ok(());
    }
    Err(crate::Error::config_invalid_value(
        key,
        None,
        format!("Unknown key. Valid keys: {}", CONFIG_KEYS.join(", ")),
    ))
}

fn to_object(config: &Skill4dConfig) -> crate::Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(crate::Error::internal_unexpected("config did not serialize to an object")),
        Err(e) => Err(crate::Error::internal_json(
            e.to_string(),
            Some("serialize config".to_string()),
        )),
    }
}

/// Check if skill4d.json file exists
pub fn config_exists() -> bool {
    paths::skill4d_json().map(|p| p.exists()).unwrap_or(false)
}

/// Delete skill4d.json file (reset to defaults)
pub fn reset_config() -> crate::Result<bool> {
    let path = paths::skill4d_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to skill4d.json (for display purposes)
pub fn config_path() -> crate::Result<String> {
    Ok(paths::skill4d_json()?.display().to_string())
}
