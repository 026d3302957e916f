//! Command grammar lookup.
//!
//! The grammar file is tab-separated text, one command per line:
//! `id<TAB>name<TAB>theme<TAB>syntax`. Blank lines and `#` comments are
//! ignored; shorter lines are counted as malformed and skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

pub const GRAMMAR_ENV_VAR: &str = "SKILL4D_GRAMMAR";
pub const GRAMMAR_FILE_NAME: &str = "commands.tsv";
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEntry {
    pub id: String,
    pub name: String,
    pub theme: String,
    pub syntax: String,
}

impl CommandEntry {
    /// `NAME ( params ) : Result`, or just `NAME` without syntax.
    pub fn signature(&self) -> String {
        let syntax = self.syntax.trim();
        if syntax.is_empty() {
            return self.name.clone();
        }

        let (params, result) = match syntax.split_once("->") {
            Some((params, result)) => (params.trim(), Some(result_type(result))),
            None => (syntax, None),
        };

        let mut signature = if params.is_empty() {
            self.name.clone()
        } else {
            format!("{} ( {} )", self.name, params)
        };
        if let Some(result) = result.filter(|r| !r.is_empty()) {
            signature.push_str(" : ");
            signature.push_str(&result);
        }
        signature
    }
}

/// `Function result : Text` → `Text`.
fn result_type(result: &str) -> String {
    let result = result.trim();
    match result.rsplit_once(':') {
        Some((_, ty)) => ty.trim().to_string(),
        None => result.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    pub path: PathBuf,
    pub entries: Vec<CommandEntry>,
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub theme: Option<String>,
    pub in_syntax: bool,
    /// 0 means unlimited.
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandMatch {
    pub id: String,
    pub name: String,
    pub theme: String,
    pub syntax: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    pub query: String,
    pub grammar: String,
    /// Matches before the limit is applied.
    pub total: usize,
    pub truncated: bool,
    pub matches: Vec<CommandMatch>,
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemesResult {
    pub grammar: String,
    pub themes: Vec<ThemeCount>,
}

impl Grammar {
    pub fn parse(path: PathBuf, content: &str) -> Self {
        let mut entries = Vec::new();
        let mut malformed_lines = 0;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.trim_end_matches('\r').splitn(4, '\t').collect();
            if fields.len() < 4 {
                malformed_lines += 1;
                continue;
            }

            entries.push(CommandEntry {
                id: fields[0].trim().to_string(),
                name: fields[1].trim().to_string(),
                theme: fields[2].trim().to_string(),
                syntax: fields[3].trim().to_string(),
            });
        }

        Self {
            path,
            entries,
            malformed_lines,
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_grammar_path(explicit)?;
        let content = io::read_file(&path, "read command grammar")?;
        Ok(Self::parse(path, &content))
    }

    /// Entries matching every query term, best matches first.
    pub fn find(&self, query: &str, options: &FindOptions) -> Vec<&CommandEntry> {
        let query = query.trim().to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        let theme = options.theme.as_ref().map(|t| t.to_lowercase());

        let mut ranked: Vec<(u8, String, &CommandEntry)> = self
            .entries
            .iter()
            .filter(|entry| match &theme {
                Some(theme) => entry.theme.to_lowercase().contains(theme.as_str()),
                None => true,
            })
            .filter_map(|entry| {
                let name = entry.name.to_lowercase();
                let haystack = if options.in_syntax {
                    format!("{} {}", name, entry.syntax.to_lowercase())
                } else {
                    name.clone()
                };

                if !terms.iter().all(|term| haystack.contains(term)) {
                    return None;
                }

                let rank = if name == query {
                    0
                } else if name.starts_with(&query) {
                    1
                } else {
                    2
                };
                Some((rank, name, entry))
            })
            .collect();

        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let limit = if options.limit == 0 {
            usize::MAX
        } else {
            options.limit
        };
        ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, entry)| entry)
            .collect()
    }

    /// Distinct themes with their entry counts, sorted by theme.
    pub fn themes(&self) -> Vec<ThemeCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.theme.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(theme, count)| ThemeCount {
                theme: theme.to_string(),
                count,
            })
            .collect()
    }
}

/// Grammar lookup: explicit path, `SKILL4D_GRAMMAR`, config `grammarPath`,
/// then the bundled `assets/commands.tsv`.
pub fn resolve_grammar_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let configured = defaults::load_config().grammar_path();
    paths::resolve_asset(explicit, GRAMMAR_ENV_VAR, configured, GRAMMAR_FILE_NAME)
        .map_err(Error::grammar_not_found)
}

pub fn find(query: &str, grammar: Option<&Path>, options: &FindOptions) -> Result<FindResult> {
    if query.trim().is_empty() {
        return Err(Error::validation_missing_argument(vec!["query".to_string()]));
    }

    let grammar = Grammar::load(grammar)?;
    let unlimited = FindOptions {
        limit: 0,
        ..options.clone()
    };
    let found = grammar.find(query, &unlimited);
    let total = found.len();
    let limit = if options.limit == 0 { total } else { options.limit };

    let matches: Vec<CommandMatch> = found
        .into_iter()
        .take(limit)
        .map(|entry| CommandMatch {
            id: entry.id.clone(),
            name: entry.name.clone(),
            theme: entry.theme.clone(),
            syntax: entry.syntax.clone(),
            signature: entry.signature(),
        })
        .collect();

    Ok(FindResult {
        query: query.trim().to_string(),
        grammar: grammar.path.display().to_string(),
        total,
        truncated: total > matches.len(),
        matches,
        malformed_lines: grammar.malformed_lines,
    })
}

pub fn themes(grammar: Option<&Path>) -> Result<ThemesResult> {
    let grammar = Grammar::load(grammar)?;
    Ok(ThemesResult {
        grammar: grammar.path.display().to_string(),
        themes: grammar.themes(),
    })
}
