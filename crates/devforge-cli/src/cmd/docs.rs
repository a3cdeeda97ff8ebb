use crate::cmd::plan::read_json;
use crate::cmd::{run_step, step};
use clap::Subcommand;
use devforge_core::orchestrator;
use devforge_core::payload::GeneratedDocs;
use devforge_core::types::Step;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum DocsSubcommand {
    /// Generate README, roadmap, getting-started and feature list
    Generate {
        /// Project id
        id: String,
    },
    /// Generate starter code for the planned stack
    Scaffold {
        /// Project id
        id: String,
    },
    /// Generate AI_RULES.md
    Policy {
        /// Project id
        id: String,
    },
    /// Commit docs, scaffold and policy to the repository
    Commit {
        /// Project id
        id: String,
    },
    /// Replace the docs with the contents of a JSON file
    Edit {
        /// Project id
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Approve the committed docs and move to the deploy step
    Approve {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: DocsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DocsSubcommand::Generate { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.generate_docs(&project).await
        }),
        DocsSubcommand::Scaffold { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.generate_scaffold(&project).await
        }),
        DocsSubcommand::Policy { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.generate_policy(&project).await
        }),
        DocsSubcommand::Commit { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.commit_docs(&project).await
        }),
        DocsSubcommand::Edit { id, file } => {
            let docs: GeneratedDocs = read_json(&file)?;
            step::apply(root, &id, json, |p| orchestrator::edit_docs(p, docs))
        }
        DocsSubcommand::Approve { id } => step::approve(root, &id, Step::Docs, json),
    }
}
