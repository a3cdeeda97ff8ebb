//! GitHub REST client.
//!
//! Multi-file commits are built bottom-up with the git data API: read the
//! branch head, create one blob per file, one tree on top of the head's
//! tree, one commit, and only then move the branch ref. Any failure before
//! the final `PATCH` leaves the branch exactly where it was; orphaned blobs
//! and trees are garbage-collected by GitHub.

use async_trait::async_trait;
use base64::Engine as _;
use devforge_core::collab::{CollabResult, RepoHost};
use devforge_core::payload::{FileEntry, RepoConfig, RepoResult};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ClientError, Result};
use crate::http;

pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct RepoResponse {
    html_url: String,
    clone_url: String,
    full_name: String,
    default_branch: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: ShaRef,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    tree: ShaRef,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct KeyResponse {
    id: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http::client()?,
            api_url: api_url.into(),
            token,
        })
    }

    /// Client authenticated with `GITHUB_TOKEN`, if set.
    pub fn from_env(api_url: impl Into<String>) -> Result<Self> {
        Self::new(api_url, http::env_token(TOKEN_VAR))
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or(ClientError::MissingCredential(TOKEN_VAR))?;
        Ok(self
            .http
            .request(method, http::join(&self.api_url, path))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    pub async fn login(&self) -> Result<String> {
        let resp = self.request(Method::GET, "/user")?.send().await?;
        let user: UserResponse = http::json(resp, "GitHub user lookup").await?;
        Ok(user.login)
    }

    /// Create a repository for the authenticated user, initialised with a
    /// first commit so the default branch exists.
    pub async fn create_repo(&self, config: &RepoConfig) -> Result<RepoResult> {
        let body = json!({
            "name": config.name,
            "description": config.description,
            "private": config.is_private,
            "auto_init": true,
        });
        let resp = self
            .request(Method::POST, "/user/repos")?
            .json(&body)
            .send()
            .await?;
        let repo: RepoResponse = http::json(resp, "GitHub repository creation").await?;
        tracing::info!(repo = %repo.full_name, "repository created");
        Ok(RepoResult {
            url: repo.html_url,
            clone_url: repo.clone_url,
            full_name: repo.full_name,
            default_branch: repo.default_branch,
        })
    }

    /// Write `files` as a single commit on `branch` and return its sha.
    pub async fn commit(
        &self,
        full_name: &str,
        branch: &str,
        files: &[FileEntry],
        message: &str,
    ) -> Result<String> {
        let base = format!("/repos/{full_name}/git");

        let resp = self
            .request(Method::GET, &format!("{base}/ref/heads/{branch}"))?
            .send()
            .await?;
        let head: RefResponse = http::json(resp, "GitHub ref lookup").await?;
        let parent = head.object.sha;

        let resp = self
            .request(Method::GET, &format!("{base}/commits/{parent}"))?
            .send()
            .await?;
        let parent_commit: CommitResponse = http::json(resp, "GitHub commit lookup").await?;

        let mut tree = Vec::with_capacity(files.len());
        for file in files {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&file.content);
            let resp = self
                .request(Method::POST, &format!("{base}/blobs"))?
                .json(&json!({ "content": encoded, "encoding": "base64" }))
                .send()
                .await?;
            let blob: ShaRef =
                http::json(resp, &format!("GitHub blob upload for {}", file.path)).await?;
            tree.push(json!({
                "path": file.path,
                "mode": "100644",
                "type": "blob",
                "sha": blob.sha,
            }));
        }

        let resp = self
            .request(Method::POST, &format!("{base}/trees"))?
            .json(&json!({ "base_tree": parent_commit.tree.sha, "tree": tree }))
            .send()
            .await?;
        let new_tree: ShaRef = http::json(resp, "GitHub tree creation").await?;

        let resp = self
            .request(Method::POST, &format!("{base}/commits"))?
            .json(&json!({
                "message": message,
                "tree": new_tree.sha,
                "parents": [parent],
            }))
            .send()
            .await?;
        let new_commit: ShaRef = http::json(resp, "GitHub commit creation").await?;

        let resp = self
            .request(Method::PATCH, &format!("{base}/refs/heads/{branch}"))?
            .json(&json!({ "sha": new_commit.sha, "force": false }))
            .send()
            .await?;
        http::check(resp, "GitHub ref update").await?;

        tracing::info!(
            repo = full_name,
            sha = %new_commit.sha,
            files = files.len(),
            "files committed"
        );
        Ok(new_commit.sha)
    }

    pub async fn add_key(&self, full_name: &str, title: &str, key: &str) -> Result<u64> {
        let resp = self
            .request(Method::POST, &format!("/repos/{full_name}/keys"))?
            .json(&json!({ "title": title, "key": key, "read_only": true }))
            .send()
            .await?;
        let created: KeyResponse = http::json(resp, "GitHub deploy key creation").await?;
        Ok(created.id)
    }

    /// Every blob path on the default branch.
    pub async fn tree(&self, full_name: &str) -> Result<Vec<String>> {
        let resp = self
            .request(Method::GET, &format!("/repos/{full_name}"))?
            .send()
            .await?;
        let repo: RepoResponse = http::json(resp, "GitHub repository lookup").await?;

        let resp = self
            .request(
                Method::GET,
                &format!(
                    "/repos/{full_name}/git/trees/{}?recursive=1",
                    repo.default_branch
                ),
            )?
            .send()
            .await?;
        let tree: TreeResponse = http::json(resp, "GitHub tree listing").await?;
        if tree.truncated {
            tracing::warn!(repo = full_name, "tree listing truncated by GitHub");
        }
        Ok(tree
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .map(|e| e.path)
            .collect())
    }

    pub async fn file(&self, full_name: &str, path: &str) -> Result<String> {
        let context = format!("GitHub read of {path}");
        let resp = self
            .request(Method::GET, &format!("/repos/{full_name}/contents/{path}"))?
            .send()
            .await?;
        let content: ContentResponse = http::json(resp, &context).await?;
        if content.encoding != "base64" {
            return Ok(content.content);
        }
        let compact: String = content
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| ClientError::Decode {
                context: context.clone(),
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| ClientError::Decode {
            context,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn authenticated_user(&self) -> CollabResult<String> {
        Ok(self.login().await?)
    }

    async fn create_repository(&self, config: &RepoConfig) -> CollabResult<RepoResult> {
        Ok(self.create_repo(config).await?)
    }

    async fn commit_files(
        &self,
        full_name: &str,
        branch: &str,
        files: &[FileEntry],
        message: &str,
    ) -> CollabResult<String> {
        Ok(self.commit(full_name, branch, files, message).await?)
    }

    async fn add_deploy_key(&self, full_name: &str, title: &str, key: &str) -> CollabResult<u64> {
        Ok(self.add_key(full_name, title, key).await?)
    }

    async fn list_files(&self, full_name: &str) -> CollabResult<Vec<String>> {
        Ok(self.tree(full_name).await?)
    }

    async fn read_file(&self, full_name: &str, path: &str) -> CollabResult<String> {
        Ok(self.file(full_name, path).await?)
    }
}
