use crate::cmd::{block_on, Workspace};
use crate::output::print_json;
use anyhow::bail;
use devforge_clients::GitHubClient;
use devforge_core::scan::{self, ScanReport};
use devforge_core::settings::RepoSource;
use std::path::{Path, PathBuf};

pub struct ScanArgs {
    pub github: Option<String>,
    pub local: Option<PathBuf>,
    pub project: Option<String>,
    pub file: Option<String>,
}

pub fn run(root: &Path, args: ScanArgs, json: bool) -> anyhow::Result<()> {
    let source = resolve_source(root, &args)?;

    if let Some(file) = &args.file {
        let content = match &source {
            RepoSource::Local { path } => scan::read_local_file(path, file)?,
            RepoSource::Github { .. } => {
                let host = github(root)?;
                block_on(scan::read_file(&source, &host, file))??
            }
        };
        if json {
            return print_json(&serde_json::json!({ "path": file, "content": content }));
        }
        print!("{content}");
        return Ok(());
    }

    let report = match &source {
        RepoSource::Local { path } => scan::scan_local(path)?,
        RepoSource::Github { .. } => {
            let host = github(root)?;
            block_on(scan::scan(&source, &host))??
        }
    };
    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

/// Flags first, then the project's connected source, then the global one.
fn resolve_source(root: &Path, args: &ScanArgs) -> anyhow::Result<RepoSource> {
    if let Some(full_name) = &args.github {
        return Ok(RepoSource::Github {
            full_name: full_name.clone(),
        });
    }
    if let Some(path) = &args.local {
        return Ok(RepoSource::Local { path: path.clone() });
    }
    let ws = Workspace::open(root)?;
    if let Some(id) = &args.project {
        if let Some(source) = ws.load(id)?.settings.repo_source {
            return Ok(source);
        }
    }
    match ws.store.load_settings().and_then(|s| s.repo_source) {
        Some(source) => Ok(source),
        None => bail!("no repository source: pass --github or --local, or connect one with `devforge settings set`"),
    }
}

fn github(root: &Path) -> anyhow::Result<GitHubClient> {
    let config = devforge_core::config::Config::load_or_default(root)?;
    Ok(GitHubClient::from_env(config.github.api_url)?)
}

fn print_report(report: &ScanReport) {
    for (name, present) in &report.detected {
        let mark = if *present { "x" } else { " " };
        println!("[{mark}] {name}");
    }
    println!("\n{} files", report.files.len());
    for file in &report.files {
        println!("  {file}");
    }
}
