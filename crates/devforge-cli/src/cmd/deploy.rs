use crate::cmd::{run_step, step};
use anyhow::bail;
use clap::Subcommand;
use devforge_core::types::Step;
use std::path::Path;

#[derive(Subcommand)]
pub enum DeploySubcommand {
    /// Generate the Netlify build configuration
    Generate {
        /// Project id
        id: String,
    },
    /// Create the Netlify site and deploy the committed files
    Launch {
        /// Project id
        id: String,
        /// Site name (defaults to the repository name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Set environment variables on the launched site
    Env {
        /// Project id
        id: String,
        /// Variables as KEY=VALUE
        #[arg(required = true)]
        vars: Vec<String>,
    },
    /// Approve the deployment and finish the project
    Approve {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: DeploySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DeploySubcommand::Generate { id } => run_step(root, &id, json, |wizard, project| async move {
            wizard.generate_deploy_config(&project).await
        }),
        DeploySubcommand::Launch { id, name } => {
            run_step(root, &id, json, |wizard, project| async move {
                wizard.launch_site(&project, name).await
            })
        }
        DeploySubcommand::Env { id, vars } => {
            let vars = parse_vars(&vars)?;
            run_step(root, &id, json, |wizard, project| async move {
                wizard.configure_env(&project, vars).await
            })
        }
        DeploySubcommand::Approve { id } => step::approve(root, &id, Step::Deploy, json),
    }
}

fn parse_vars(raw: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => Ok((key.trim().to_string(), value.to_string())),
            None => bail!("expected KEY=VALUE, got '{pair}'"),
        })
        .collect()
}
