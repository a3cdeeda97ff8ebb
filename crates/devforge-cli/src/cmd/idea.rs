use crate::cmd::run_step;
use devforge_core::payload::{parse_list, IdeaInput};
use std::path::Path;

pub struct IdeaArgs {
    pub description: String,
    pub tags: String,
    pub constraints: String,
    pub goals: String,
}

pub fn run(root: &Path, id: &str, args: IdeaArgs, json: bool) -> anyhow::Result<()> {
    let idea = IdeaInput {
        description: args.description,
        tags: parse_list(&args.tags),
        constraints: parse_list(&args.constraints),
        goals: parse_list(&args.goals),
    };
    run_step(root, id, json, |wizard, project| async move {
        wizard.submit_idea(&project, idea).await
    })
}
