//! Per-step payload types carried in the project aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Idea
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaInput {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl IdeaInput {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            tags: Vec::new(),
            constraints: Vec::new(),
            goals: Vec::new(),
        }
    }

    /// Trim the description and drop blank list entries.
    pub fn normalized(mut self) -> Self {
        self.description = self.description.trim().to_string();
        for list in [&mut self.tags, &mut self.constraints, &mut self.goals] {
            *list = list
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self
    }
}

/// Split a comma-separated form field into trimmed, non-empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Must,
    Should,
    Could,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Must => "must",
            Priority::Should => "should",
            Priority::Could => "could",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpFeature {
    pub name: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechChoice {
    pub category: String,
    pub choice: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub summary: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub non_goals: Vec<String>,
    #[serde(default)]
    pub mvp_features: Vec<MvpFeature>,
    #[serde(default)]
    pub tech_stack: Vec<TechChoice>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

impl ProjectPlan {
    /// `"category: choice"` pairs joined with `sep`.
    pub fn tech_stack_summary(&self, sep: &str) -> String {
        self.tech_stack
            .iter()
            .map(|t| format!("{}: {}", t.category, t.choice))
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// First sentence of the summary, used to suggest a repository name.
    pub fn headline(&self) -> &str {
        self.summary.split('.').next().unwrap_or("").trim()
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoResult {
    pub url: String,
    pub clone_url: String,
    pub full_name: String,
    pub default_branch: String,
}

impl RepoResult {
    /// Repository name without the owner prefix.
    pub fn short_name(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A batched commit recorded against the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub files: Vec<String>,
    pub committed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Docs, scaffold and policy
// ---------------------------------------------------------------------------

pub const README_MD: &str = "README.md";
pub const ROADMAP_MD: &str = "ROADMAP.md";
pub const GETTING_STARTED_MD: &str = "GETTING_STARTED.md";
pub const FEATURES_MD: &str = "FEATURES.md";
pub const AI_RULES_MD: &str = "AI_RULES.md";
pub const NETLIFY_TOML: &str = "netlify.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocs {
    pub readme: String,
    pub roadmap: String,
    pub getting_started: String,
    pub feature_list: String,
}

impl GeneratedDocs {
    pub fn files(&self) -> Vec<FileEntry> {
        vec![
            FileEntry::new(README_MD, &self.readme),
            FileEntry::new(ROADMAP_MD, &self.roadmap),
            FileEntry::new(GETTING_STARTED_MD, &self.getting_started),
            FileEntry::new(FEATURES_MD, &self.feature_list),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScaffold {
    pub files: Vec<FileEntry>,
    pub build_command: String,
    pub publish_dir: String,
}

/// Coding rules handed to AI assistants working in the generated repo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPolicy {
    #[serde(default)]
    pub project_context: String,
    #[serde(default)]
    pub code_style_rules: Vec<String>,
    #[serde(default)]
    pub architecture_rules: Vec<String>,
    #[serde(default)]
    pub dos: Vec<String>,
    #[serde(default)]
    pub donts: Vec<String>,
}

impl PromptPolicy {
    pub fn is_empty(&self) -> bool {
        self.project_context.is_empty()
            && self.code_style_rules.is_empty()
            && self.architecture_rules.is_empty()
            && self.dos.is_empty()
            && self.donts.is_empty()
    }

    /// Append every rule list of `other`; a non-empty context replaces ours.
    pub fn merge(&mut self, other: &PromptPolicy) {
        if !other.project_context.is_empty() {
            self.project_context = other.project_context.clone();
        }
        self.code_style_rules
            .extend(other.code_style_rules.iter().cloned());
        self.architecture_rules
            .extend(other.architecture_rules.iter().cloned());
        self.dos.extend(other.dos.iter().cloned());
        self.donts.extend(other.donts.iter().cloned());
    }

    /// Render as the `AI_RULES.md` document.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# AI Rules\n");
        if !self.project_context.is_empty() {
            out.push_str("\n## Project Context\n\n");
            out.push_str(self.project_context.trim());
            out.push('\n');
        }
        let sections = [
            ("Code Style", &self.code_style_rules),
            ("Architecture", &self.architecture_rules),
            ("Do", &self.dos),
            ("Don't", &self.donts),
        ];
        for (title, rules) in sections {
            if rules.is_empty() {
                continue;
            }
            out.push_str(&format!("\n## {title}\n\n"));
            for rule in rules {
                out.push_str(&format!("- {rule}\n"));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Deploy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarSpec {
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub netlify_toml: String,
    #[serde(default)]
    pub env_vars: Vec<EnvVarSpec>,
}

/// The live site produced by the deploy step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub site_id: String,
    pub site_url: String,
    #[serde(default)]
    pub admin_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_url: Option<String>,
    /// Whether the site builds from the repository (false for direct file deploys).
    pub linked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_keys: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> ProjectPlan {
        ProjectPlan {
            summary: "A task tracker for small teams. Built for speed.".into(),
            goals: vec!["ship".into()],
            non_goals: vec![],
            mvp_features: vec![],
            tech_stack: vec![
                TechChoice {
                    category: "Frontend".into(),
                    choice: "React".into(),
                    rationale: String::new(),
                },
                TechChoice {
                    category: "Styling".into(),
                    choice: "Tailwind".into(),
                    rationale: String::new(),
                },
            ],
            open_questions: vec![],
        }
    }

    #[test]
    fn parse_list_drops_blanks() {
        assert_eq!(parse_list(" a, b ,, c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn idea_normalized_trims() {
        let idea = IdeaInput {
            description: "  A task tracker ".into(),
            tags: vec![" web ".into(), "".into()],
            constraints: vec![],
            goals: vec!["  ".into()],
        }
        .normalized();
        assert_eq!(idea.description, "A task tracker");
        assert_eq!(idea.tags, vec!["web"]);
        assert!(idea.goals.is_empty());
    }

    #[test]
    fn tech_stack_summary_joins_pairs() {
        assert_eq!(
            plan().tech_stack_summary(", "),
            "Frontend: React, Styling: Tailwind"
        );
        assert_eq!(plan().headline(), "A task tracker for small teams");
    }

    #[test]
    fn docs_files_use_fixed_names() {
        let docs = GeneratedDocs {
            readme: "r".into(),
            roadmap: "m".into(),
            getting_started: "g".into(),
            feature_list: "f".into(),
        };
        let paths: Vec<_> = docs.files().into_iter().map(|f| f.path).collect();
        assert_eq!(
            paths,
            vec!["README.md", "ROADMAP.md", "GETTING_STARTED.md", "FEATURES.md"]
        );
    }

    #[test]
    fn policy_markdown_skips_empty_sections() {
        let policy = PromptPolicy {
            project_context: "Task tracker".into(),
            code_style_rules: vec!["Use strict mode".into()],
            architecture_rules: vec![],
            dos: vec![],
            donts: vec!["Never use any".into()],
        };
        let md = policy.to_markdown();
        assert!(md.starts_with("# AI Rules"));
        assert!(md.contains("## Code Style\n\n- Use strict mode"));
        assert!(md.contains("## Don't\n\n- Never use any"));
        assert!(!md.contains("## Architecture"));
    }

    #[test]
    fn policy_merge_appends_rules() {
        let mut base = PromptPolicy {
            dos: vec!["a".into()],
            ..Default::default()
        };
        base.merge(&PromptPolicy {
            dos: vec!["b".into()],
            ..Default::default()
        });
        assert_eq!(base.dos, vec!["a", "b"]);
        assert!(base.project_context.is_empty());
    }

    #[test]
    fn repo_short_name() {
        let r = RepoResult {
            url: "u".into(),
            clone_url: "c".into(),
            full_name: "octo/task-tracker".into(),
            default_branch: "main".into(),
        };
        assert_eq!(r.short_name(), "task-tracker");
    }
}
