//! Inspect an existing repository: list its files and detect the documents
//! the wizard itself produces.

use crate::collab::RepoHost;
use crate::error::{ForgeError, Result};
use crate::settings::RepoSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

pub const KNOWN_FILES: &[&str] = &[
    "AI_RULES.md",
    "README.md",
    "ROADMAP.md",
    "GETTING_STARTED.md",
    "FEATURES.md",
    "package.json",
    "netlify.toml",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub files: Vec<String>,
    /// Every entry of [`KNOWN_FILES`] mapped to whether it exists at the root.
    pub detected: BTreeMap<String, bool>,
}

impl ScanReport {
    pub fn from_files(files: Vec<String>) -> Self {
        let detected = KNOWN_FILES
            .iter()
            .map(|known| (known.to_string(), files.iter().any(|f| f == known)))
            .collect();
        Self { files, detected }
    }

    pub fn has(&self, file: &str) -> bool {
        self.detected.get(file).copied().unwrap_or(false)
    }
}

/// Scan either source. GitHub sources go through `host`.
pub async fn scan(source: &RepoSource, host: &dyn RepoHost) -> Result<ScanReport> {
    match source {
        RepoSource::Github { full_name } => {
            let files = host.list_files(full_name).await?;
            Ok(ScanReport::from_files(files))
        }
        RepoSource::Local { path } => scan_local(path),
    }
}

pub async fn read_file(source: &RepoSource, host: &dyn RepoHost, file: &str) -> Result<String> {
    match source {
        RepoSource::Github { full_name } => Ok(host.read_file(full_name, file).await?),
        RepoSource::Local { path } => read_local_file(path, file),
    }
}

/// Walk `dir` recursively, skipping dot-entries and `node_modules`. Paths are
/// `/`-separated and relative to `dir`, sorted.
pub fn scan_local(dir: &Path) -> Result<ScanReport> {
    if !dir.is_dir() {
        return Err(ForgeError::InvalidInput(format!(
            "directory not found: {}",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    walk(dir, "", &mut files);
    files.sort();
    Ok(ScanReport::from_files(files))
}

fn walk(dir: &Path, base: &str, out: &mut Vec<String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == "node_modules" {
            continue;
        }
        let rel = if base.is_empty() {
            name
        } else {
            format!("{base}/{name}")
        };
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => walk(&entry.path(), &rel, out),
            Ok(_) => out.push(rel),
            Err(_) => {}
        }
    }
}

/// Read `file` under `root`. Absolute paths and `..` are rejected.
pub fn read_local_file(root: &Path, file: &str) -> Result<String> {
    let rel = Path::new(file);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ForgeError::InvalidInput(format!(
            "file path must stay inside the repository: {file}"
        )));
    }
    let path = root.join(rel);
    if !path.is_file() {
        return Err(ForgeError::InvalidInput(format!("file not found: {file}")));
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("README.md"), "# App").unwrap();
        std::fs::write(root.join("package.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("src/components")).unwrap();
        std::fs::write(root.join("src/main.ts"), "").unwrap();
        std::fs::write(root.join("src/components/App.tsx"), "").unwrap();
        std::fs::create_dir_all(root.join("node_modules/react")).unwrap();
        std::fs::write(root.join("node_modules/react/index.js"), "").unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "").unwrap();
        std::fs::write(root.join(".env"), "SECRET=1").unwrap();
        dir
    }

    #[test]
    fn local_scan_skips_hidden_and_node_modules() {
        let dir = fixture();
        let report = scan_local(dir.path()).unwrap();
        assert_eq!(
            report.files,
            vec![
                "README.md",
                "package.json",
                "src/components/App.tsx",
                "src/main.ts"
            ]
        );
    }

    #[test]
    fn detects_known_files() {
        let dir = fixture();
        let report = scan_local(dir.path()).unwrap();
        assert_eq!(report.detected.len(), KNOWN_FILES.len());
        assert!(report.has("README.md"));
        assert!(report.has("package.json"));
        assert!(!report.has("AI_RULES.md"));
    }

    #[test]
    fn nested_known_name_does_not_count() {
        let report = ScanReport::from_files(vec!["docs/README.md".into()]);
        assert!(!report.has("README.md"));
    }

    #[test]
    fn missing_directory_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let err = scan_local(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidInput(_)));
    }

    #[test]
    fn read_local_file_guards_traversal() {
        let dir = fixture();
        assert_eq!(read_local_file(dir.path(), "README.md").unwrap(), "# App");
        assert!(read_local_file(dir.path(), "../etc/passwd").is_err());
        assert!(read_local_file(dir.path(), "/etc/passwd").is_err());
        assert!(read_local_file(dir.path(), "MISSING.md").is_err());
    }
}
