use crate::cmd::{run_step, step};
use anyhow::Context;
use clap::Subcommand;
use devforge_core::orchestrator;
use devforge_core::payload::ProjectPlan;
use devforge_core::types::Step;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Generate a plan from the approved idea
    Generate {
        /// Project id
        id: String,
    },
    /// Replace the plan with the contents of a JSON file
    Edit {
        /// Project id
        id: String,
        /// Path to a plan JSON document
        #[arg(long)]
        file: PathBuf,
    },
    /// Approve the plan and move to the repository step
    Approve {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PlanSubcommand::Generate { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.generate_plan(&project).await
        }),
        PlanSubcommand::Edit { id, file } => {
            let plan: ProjectPlan = read_json(&file)?;
            step::apply(root, &id, json, |p| orchestrator::edit_plan(p, plan))
        }
        PlanSubcommand::Approve { id } => step::approve(root, &id, Step::Plan, json),
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
