use crate::cmd::Workspace;
use crate::output::{emit_project, print_json, print_table};
use clap::Subcommand;
use devforge_core::Project;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Start a new project at the idea step
    New,
    /// List all projects
    List,
    /// Show a project's steps and recent activity
    Show {
        /// Project id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::New => new(root, json),
        ProjectSubcommand::List => list(root, json),
        ProjectSubcommand::Show { id } => show(root, &id, json),
    }
}

fn new(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let mut project = Project::create_initial();
    project.settings = ws
        .store
        .load_settings()
        .unwrap_or_else(|| ws.config.default_settings());
    ws.save(&project)?;

    if json {
        print_json(&project)
    } else {
        println!("Created project: {}", project.id);
        println!("Next: devforge idea {} \"<what you want to build>\"", project.id);
        Ok(())
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let projects: Vec<Project> = ws
        .store
        .list()
        .iter()
        .filter_map(|id| ws.store.load(id))
        .collect();

    if json {
        let list: Vec<serde_json::Value> = projects
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "current_step": p.current_step,
                    "status": p.status(p.current_step),
                    "updated_at": p.updated_at,
                })
            })
            .collect();
        return print_json(&list);
    }

    if projects.is_empty() {
        println!("No projects. Create one with: devforge project new");
        return Ok(());
    }
    let rows: Vec<[String; 4]> = projects
        .iter()
        .map(|p| {
            [
                p.id.clone(),
                p.current_step.to_string(),
                p.status(p.current_step).to_string(),
                p.idea
                    .as_ref()
                    .map(|i| i.description.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(["ID", "STEP", "STATUS", "IDEA"], &rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let project = ws.load(id)?;
    emit_project(&project, json)
}
