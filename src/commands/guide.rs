use clap::Args;

use skill4d::skills;

#[derive(Args)]
pub struct GuideArgs {
    /// Skill id (e.g. 4d-validate-form or validate-form); omit for the index
    pub skill: Option<String>,
}

pub fn run_markdown(args: GuideArgs) -> skill4d::Result<(String, i32)> {
    let content = match args.skill {
        Some(id) => skills::get(&id)?.to_string(),
        None => skills::index_markdown(),
    };
    Ok((content, 0))
}
