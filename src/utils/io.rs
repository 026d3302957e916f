//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent, operation)?;
    }
    fs::write(path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file atomically (write to .tmp, then rename).
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    ensure_dir(parent, operation)?;
    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation))))?;

    Ok(())
}

/// Create a directory and its parents.
pub fn ensure_dir(dir: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("{} (create {})", operation, dir.display())),
        )
    })
}

/// Parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = read_file(path, &format!("read {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::validation_invalid_json(e, Some(path.display().to_string())))
}

/// Load a JSON object file, or an empty object when the file does not exist.
///
/// Key order is preserved so rewriting a user file only changes what we touched.
pub fn read_json_object_or_default(path: &Path) -> Result<Map<String, Value>> {
    if !path.is_file() {
        return Ok(Map::new());
    }

    match read_json(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation_invalid_argument(
            "file",
            format!("{} does not contain a JSON object", path.display()),
            None,
            None,
        )),
    }
}

/// Render JSON the way 4D writes its project files: tab indentation,
/// non-ASCII kept verbatim, trailing newline.
pub fn to_tabbed_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize JSON".to_string())))?;

    let mut out = String::from_utf8(buf)
        .map_err(|e| Error::internal_json(e.to_string(), Some("encode JSON".to_string())))?;
    out.push('\n');
    Ok(out)
}

/// Write JSON with [`to_tabbed_json`] formatting.
pub fn write_json_tabbed<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = to_tabbed_json(value)?;
    write_file_atomic(path, &content, &format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file.txt");
        write_file(&path, "new content", "test write").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
    }

    #[test]
    fn missing_json_object_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let map = read_json_object_or_default(&dir.path().join("nope.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn non_object_json_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "[1, 2]").unwrap();
        let err = read_json_object_or_default(temp.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn invalid_json_reports_location() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{\"a\": }}").unwrap();
        let err = read_json(temp.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
        assert_eq!(err.details["line"], 1);
    }

    #[test]
    fn tabbed_json_keeps_order_and_unicode() {
        let value = serde_json::json!({ "version": 2130, "dependencies": { "Élan": {} } });
        let text = to_tabbed_json(&value).unwrap();
        assert_eq!(
            text,
            "{\n\t\"version\": 2130,\n\t\"dependencies\": {\n\t\t\"Élan\": {}\n\t}\n}\n"
        );
    }

    #[test]
    fn write_json_tabbed_replaces_file_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dependencies.json");
        write_json_tabbed(&path, &serde_json::json!({"a": 1})).unwrap();
        write_json_tabbed(&path, &serde_json::json!({"a": 2})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n\t\"a\": 2\n}\n");
        assert!(!dir.path().join("dependencies.json.tmp").exists());
    }
}
