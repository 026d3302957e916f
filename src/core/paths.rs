use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base skill4d config directory (~/.config/skill4d/ on Unix, %APPDATA%\skill4d on Windows)
pub fn skill4d() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("skill4d"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("skill4d"))
    }
}

/// Global skill4d.json config file path
pub fn skill4d_json() -> Result<PathBuf> {
    Ok(skill4d()?.join("skill4d.json"))
}

/// Directories searched for bundled assets (formsSchema.json, commands.tsv).
///
/// Order: `<exe dir>/assets`, `<exe dir>/../assets`, `./assets`.
pub fn asset_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(exe) = env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            dirs.push(exe_dir.join("assets"));
            if let Some(parent) = exe_dir.parent() {
                dirs.push(parent.join("assets"));
            }
        }
    }

    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd.join("assets"));
    }

    dirs
}

/// Resolve a bundled data file.
///
/// An explicit path is used alone. Otherwise the environment variable, the
/// configured path and finally `<asset dir>/<file_name>` are tried in order.
/// On failure the list of tried locations is returned.
pub fn resolve_asset(
    explicit: Option<&Path>,
    env_var: &str,
    configured: Option<PathBuf>,
    file_name: &str,
) -> std::result::Result<PathBuf, Vec<String>> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let mut candidates = Vec::new();
            if let Ok(value) = env::var(env_var) {
                if !value.trim().is_empty() {
                    candidates.push(crate::defaults::expand_path(&value));
                }
            }
            candidates.extend(configured);
            candidates.extend(asset_dirs().into_iter().map(|dir| dir.join(file_name)));
            candidates
        }
    };

    match candidates.iter().find(|path| path.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect()),
    }
}
