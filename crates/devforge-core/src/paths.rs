use crate::error::{ForgeError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEVFORGE_DIR: &str = ".devforge";
pub const CONFIG_FILE: &str = ".devforge/config.yaml";
pub const STATE_DB: &str = ".devforge/state.redb";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn default_store_path(root: &Path) -> PathBuf {
    root.join(STATE_DB)
}

// ---------------------------------------------------------------------------
// Repository names
// ---------------------------------------------------------------------------

pub const REPO_NAME_MAX: usize = 100;
const SUGGESTED_NAME_MAX: usize = 60;

static REPO_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn repo_name_re() -> &'static Regex {
    REPO_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap())
}

pub fn validate_repo_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.len() > REPO_NAME_MAX
        || name == "."
        || name == ".."
        || !repo_name_re().is_match(name)
    {
        return Err(ForgeError::InvalidRepoName(name.to_string()));
    }
    Ok(())
}

/// Lowercase `text`, collapse every run of non-alphanumerics into one `-`,
/// trim dashes and cap the length.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out.truncate(SUGGESTED_NAME_MAX);
    out.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_repo_names() {
        for name in ["task-tracker", "a", "My.App_2", "x1"] {
            validate_repo_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_repo_names() {
        let long = "a".repeat(101);
        for name in ["", "has space", "slash/name", "..", "emoji🚀", long.as_str()] {
            assert!(validate_repo_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("A Task Tracker, for teams!"), "a-task-tracker-for-teams");
        assert_eq!(slugify("  --Hello--World--  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_caps_length() {
        let s = slugify(&"word ".repeat(30));
        assert!(s.len() <= 60);
        assert!(!s.ends_with('-'));
        validate_repo_name(&s).unwrap();
    }

    #[test]
    fn config_path_is_under_root() {
        let root = Path::new("/tmp/proj");
        assert_eq!(config_path(root), PathBuf::from("/tmp/proj/.devforge/config.yaml"));
        assert_eq!(
            default_store_path(root),
            PathBuf::from("/tmp/proj/.devforge/state.redb")
        );
    }
}
