use crate::cmd::Workspace;
use clap::Subcommand;
use devforge_core::orchestrator;
use devforge_core::types::Step;
use std::path::Path;

#[derive(Subcommand)]
pub enum StepSubcommand {
    /// Approve a completed step and move to the next one
    Approve {
        /// Project id
        id: String,
        /// Step name (idea, plan, repo, docs, deploy)
        step: Step,
    },
    /// Put a failed step back to in-progress
    Retry {
        /// Project id
        id: String,
        step: Step,
    },
    /// Mark the active step as failed
    Fail {
        /// Project id
        id: String,
        step: Step,
        /// Reason shown in the activity log
        message: String,
    },
    /// Return to the previous step
    Back {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: StepSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StepSubcommand::Approve { id, step } => approve(root, &id, step, json),
        StepSubcommand::Retry { id, step } => {
            apply(root, &id, json, |p| orchestrator::retry(p, step))
        }
        StepSubcommand::Fail { id, step, message } => {
            apply(root, &id, json, |p| orchestrator::fail(p, step, &message))
        }
        StepSubcommand::Back { id } => apply(root, &id, json, orchestrator::go_back),
    }
}

/// Shared by the per-step `approve` subcommands.
pub fn approve(root: &Path, id: &str, step: Step, json: bool) -> anyhow::Result<()> {
    apply(root, id, json, |p| orchestrator::approve(p, step))
}

/// Load, run one synchronous engine operation, save.
pub fn apply<F>(root: &Path, id: &str, json: bool, op: F) -> anyhow::Result<()>
where
    F: FnOnce(&devforge_core::Project) -> devforge_core::Result<devforge_core::Project>,
{
    let ws = Workspace::open(root)?;
    let project = ws.load(id)?;
    let next = op(&project)?;
    ws.commit(next, json)
}
