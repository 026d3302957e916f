use clap::{Args, Subcommand};
use serde::Serialize;

use skill4d::defaults::{self, Skill4dConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (skill4d.json merged over built-in defaults)
    Show {
        /// Show only built-in defaults (ignore skill4d.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Set a configuration key
    Set {
        /// Key (e.g. tool4dPath, compatibilityVersion)
        key: String,
        /// Value (parsed as JSON, otherwise kept as text)
        value: String,
    },
    /// Restore a key to its built-in default
    Unset {
        /// Key to restore
        key: String,
    },
    /// Reset configuration to built-in defaults (deletes skill4d.json)
    Reset,
    /// Show the path to skill4d.json
    Path,
}

#[derive(Debug, Serialize, Default)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<Skill4dConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

pub fn run(args: ConfigArgs, _global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin),
        ConfigCommand::Set { key, value } => set(&key, &value),
        ConfigCommand::Unset { key } => unset(&key),
        ConfigCommand::Reset => reset(),
        ConfigCommand::Path => path(),
    }
}

fn show(builtin: bool) -> CmdResult<ConfigOutput> {
    let config = if builtin {
        Skill4dConfig::default()
    } else {
        defaults::load_config()
    };

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            config: Some(config),
            ..Default::default()
        },
        0,
    ))
}

fn set(key: &str, value: &str) -> CmdResult<ConfigOutput> {
    let config = defaults::with_value(&defaults::load_config(), key, value)?;
    defaults::save_config(&config)?;

    Ok((
        ConfigOutput {
            command: "config.set".to_string(),
            config: Some(config),
            key: Some(key.to_string()),
            ..Default::default()
        },
        0,
    ))
}

fn unset(key: &str) -> CmdResult<ConfigOutput> {
    let config = defaults::without_value(&defaults::load_config(), key)?;
    defaults::save_config(&config)?;

    Ok((
        ConfigOutput {
            command: "config.unset".to_string(),
            config: Some(config),
            key: Some(key.to_string()),
            ..Default::default()
        },
        0,
    ))
}

fn reset() -> CmdResult<ConfigOutput> {
    let deleted = defaults::reset_config()?;

    Ok((
        ConfigOutput {
            command: "config.reset".to_string(),
            config: Some(Skill4dConfig::default()),
            deleted: Some(deleted),
            ..Default::default()
        },
        0,
    ))
}

fn path() -> CmdResult<ConfigOutput> {
    Ok((
        ConfigOutput {
            command: "config.path".to_string(),
            path: Some(defaults::config_path()?),
            exists: Some(defaults::config_exists()),
            ..Default::default()
        },
        0,
    ))
}
