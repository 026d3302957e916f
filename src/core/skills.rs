//! Skill instruction files embedded at build time from `skills/<id>/SKILL.md`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};

include!(concat!(env!("OUT_DIR"), "/generated_skills.rs"));

fn skills_index() -> &'static BTreeMap<&'static str, &'static str> {
    static SKILLS: OnceLock<BTreeMap<&'static str, &'static str>> = OnceLock::new();

    SKILLS.get_or_init(|| GENERATED_SKILLS.iter().copied().collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillSummary {
    pub id: String,
    pub description: String,
}

/// Full `SKILL.md` content of a skill. The `4d-` prefix may be omitted.
pub fn get(id: &str) -> Result<&'static str> {
    let id = id.trim().to_lowercase();
    let index = skills_index();

    index
        .get(id.as_str())
        .or_else(|| index.get(format!("4d-{}", id).as_str()))
        .copied()
        .ok_or_else(|| Error::skill_not_found(id))
}

pub fn list() -> Vec<SkillSummary> {
    skills_index()
        .iter()
        .map(|(id, content)| SkillSummary {
            id: id.to_string(),
            description: frontmatter_value(content, "description").unwrap_or_default(),
        })
        .collect()
}

/// Markdown index printed by `guide` without an argument.
pub fn index_markdown() -> String {
    let mut out = String::from("# skill4d skills\n\n");
    for skill in list() {
        out.push_str(&format!("- **{}**: {}\n", skill.id, skill.description));
    }
    out.push_str("\nRun `skill4d guide <skill>` for the full instructions.\n");
    out
}

/// `key: value` from the leading `---` block.
fn frontmatter_value(content: &str, key: &str) -> Option<String> {
    let mut lines = content.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }

    lines
        .take_while(|line| line.trim() != "---")
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().to_string())
}
