mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    deploy::DeploySubcommand, docs::DocsSubcommand, plan::PlanSubcommand,
    project::ProjectSubcommand, repo::RepoSubcommand, settings::SettingsSubcommand,
    step::StepSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devforge",
    about = "Step-gated wizard from idea to plan, repository, docs and a deployed site",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .devforge/ or .git/)
    #[arg(long, global = true, env = "DEVFORGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize devforge in the current directory
    Init,

    /// Create, list and inspect projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Submit the idea for a project and generate its plan
    Idea {
        /// Project id
        id: String,
        /// What to build
        description: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Comma-separated constraints
        #[arg(long, default_value = "")]
        constraints: String,
        /// Comma-separated goals
        #[arg(long, default_value = "")]
        goals: String,
    },

    /// Review the plan
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Create the GitHub repository
    Repo {
        #[command(subcommand)]
        subcommand: RepoSubcommand,
    },

    /// Generate and commit docs, scaffold and AI rules
    Docs {
        #[command(subcommand)]
        subcommand: DocsSubcommand,
    },

    /// Configure and launch the Netlify site
    Deploy {
        #[command(subcommand)]
        subcommand: DeploySubcommand,
    },

    /// Approve, retry, fail or step back
    Step {
        #[command(subcommand)]
        subcommand: StepSubcommand,
    },

    /// Show or change AI settings
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },

    /// List an existing repository or read one of its files
    Scan {
        /// GitHub repository as owner/name
        #[arg(long, conflicts_with_all = ["local", "project"])]
        github: Option<String>,
        /// Local directory
        #[arg(long, conflicts_with = "project")]
        local: Option<PathBuf>,
        /// Use this project's connected repository
        #[arg(long)]
        project: Option<String>,
        /// Read this file instead of listing
        #[arg(long)]
        file: Option<String>,
    },

    /// Run the JSON API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
        /// Open the API in a browser
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Idea {
            id,
            description,
            tags,
            constraints,
            goals,
        } => cmd::idea::run(
            &root,
            &id,
            cmd::idea::IdeaArgs {
                description,
                tags,
                constraints,
                goals,
            },
            cli.json,
        ),
        Commands::Plan { subcommand } => cmd::plan::run(&root, subcommand, cli.json),
        Commands::Repo { subcommand } => cmd::repo::run(&root, subcommand, cli.json),
        Commands::Docs { subcommand } => cmd::docs::run(&root, subcommand, cli.json),
        Commands::Deploy { subcommand } => cmd::deploy::run(&root, subcommand, cli.json),
        Commands::Step { subcommand } => cmd::step::run(&root, subcommand, cli.json),
        Commands::Settings { subcommand } => cmd::settings::run(&root, subcommand, cli.json),
        Commands::Scan {
            github,
            local,
            project,
            file,
        } => cmd::scan::run(
            &root,
            cmd::scan::ScanArgs {
                github,
                local,
                project,
                file,
            },
            cli.json,
        ),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
