use crate::cmd::{run_step, step};
use clap::Subcommand;
use devforge_core::orchestrator;
use devforge_core::payload::RepoConfig;
use devforge_core::types::Step;
use std::path::Path;

#[derive(Subcommand)]
pub enum RepoSubcommand {
    /// Create the GitHub repository
    Create {
        /// Project id
        id: String,
        /// Repository name (defaults to one derived from the plan)
        #[arg(long)]
        name: Option<String>,
        /// Repository description (defaults to the plan summary)
        #[arg(long)]
        description: Option<String>,
        /// Create a private repository
        #[arg(long)]
        private: bool,
        /// Organization to create the repository under
        #[arg(long, default_value = "")]
        owner: String,
    },
    /// Approve the repository and move to the docs step
    Approve {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: RepoSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RepoSubcommand::Create {
            id,
            name,
            description,
            private,
            owner,
        } => run_step(root, &id, json, |wizard, project| async move {
            let plan = project.plan.as_ref();
            let config = RepoConfig {
                name: name
                    .or_else(|| plan.map(orchestrator::suggested_repo_name))
                    .unwrap_or_default(),
                description: description
                    .or_else(|| plan.map(|p| p.headline().to_string()))
                    .unwrap_or_default(),
                is_private: private,
                owner,
            };
            wizard.create_repository(&project, config).await
        }),
        RepoSubcommand::Approve { id } => step::approve(root, &id, Step::Repo, json),
    }
}
