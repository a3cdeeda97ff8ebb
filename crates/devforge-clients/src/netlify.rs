//! Netlify API client.
//!
//! Direct deploys use the digest protocol: the deploy is created with a
//! `path -> sha1` manifest, Netlify answers with the digests it does not
//! already hold, and only those files are uploaded.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use devforge_core::collab::{CollabResult, DeployHost, DeployKey, DeployResult, SiteParams, SiteResult};
use devforge_core::payload::FileEntry;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use sha1::{Digest, Sha1};

use crate::error::{ClientError, Result};
use crate::http;

pub const TOKEN_VAR: &str = "NETLIFY_TOKEN";

pub struct NetlifyClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SiteResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    admin_url: Option<String>,
}

#[derive(Deserialize)]
struct KeyResponse {
    id: String,
    public_key: String,
}

#[derive(Deserialize)]
struct DeployResponse {
    id: String,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    deploy_ssl_url: Option<String>,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Hex SHA-1 of a file body, as Netlify expects in deploy manifests.
pub fn sha1_hex(content: &[u8]) -> String {
    let digest = Sha1::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Manifest path for a repository-relative file.
fn manifest_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl NetlifyClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http::client()?,
            api_url: api_url.into(),
            token,
        })
    }

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
            .bearer_auth(token))
    }

    pub async fn new_deploy_key(&self) -> Result<DeployKey> {
        let resp = self.request(Method::POST, "/deploy_keys")?.send().await?;
        let key: KeyResponse = http::json(resp, "Netlify deploy key creation").await?;
        Ok(DeployKey {
            id: key.id,
            public_key: key.public_key,
        })
    }

    /// Create a site. With `repo_full_name` set the site builds from that
    /// GitHub repository; otherwise it is an empty site for direct deploys.
    pub async fn site(&self, params: &SiteParams) -> Result<SiteResult> {
        let mut body = json!({ "name": params.name });
        if let Some(repo) = &params.repo_full_name {
            let mut link = json!({
                "provider": "github",
                "repo_path": repo,
                "repo_branch": params.branch,
                "cmd": params.build_command,
                "dir": params.publish_dir,
            });
            if let Some(key_id) = &params.deploy_key_id {
                link["deploy_key_id"] = json!(key_id);
            }
            body["repo"] = link;
        }
        let resp = self
            .request(Method::POST, "/sites")?
            .json(&body)
            .send()
            .await?;
        let site: SiteResponse = http::json(resp, "Netlify site creation").await?;
        let site_url = site
            .ssl_url
            .filter(|u| !u.is_empty())
            .or(site.url)
            .unwrap_or_default();
        tracing::info!(site_id = %site.id, linked = params.repo_full_name.is_some(), "site created");
        Ok(SiteResult {
            site_id: site.id,
            site_url,
            admin_url: site.admin_url.unwrap_or_default(),
        })
    }

    pub async fn deploy(&self, site_id: &str, files: &[FileEntry]) -> Result<DeployResult> {
        let mut manifest = BTreeMap::new();
        let mut by_digest: BTreeMap<String, &FileEntry> = BTreeMap::new();
        for file in files {
            let digest = sha1_hex(file.content.as_bytes());
            manifest.insert(manifest_path(&file.path), digest.clone());
            by_digest.entry(digest).or_insert(file);
        }

        let resp = self
            .request(Method::POST, &format!("/sites/{site_id}/deploys"))?
            .json(&json!({ "files": manifest }))
            .send()
            .await?;
        let deploy: DeployResponse = http::json(resp, "Netlify deploy creation").await?;

        let required: HashSet<&str> = deploy.required.iter().map(String::as_str).collect();
        let mut uploaded = 0usize;
        for (digest, file) in &by_digest {
            if !required.contains(digest.as_str()) {
                continue;
            }
            let path = manifest_path(&file.path);
            let resp = self
                .request(Method::PUT, &format!("/deploys/{}/files{path}", deploy.id))?
                .header("Content-Type", "application/octet-stream")
                .body(file.content.clone())
                .send()
                .await?;
            http::check(resp, &format!("Netlify upload of {}", file.path)).await?;
            uploaded += 1;
        }
        tracing::info!(
            site_id,
            deploy_id = %deploy.id,
            total = files.len(),
            uploaded,
            "files deployed"
        );

        let deploy_url = deploy
            .deploy_ssl_url
            .or(deploy.ssl_url)
            .or(deploy.url)
            .unwrap_or_default();
        Ok(DeployResult { deploy_url })
    }

    pub async fn env(&self, site_id: &str, vars: &[(String, String)]) -> Result<()> {
        for (key, value) in vars {
            let resp = self
                .request(Method::PATCH, &format!("/sites/{site_id}/env/{key}"))?
                .json(&json!({ "values": [{ "value": value, "context": "production" }] }))
                .send()
                .await?;
            http::check(resp, &format!("Netlify env update of {key}")).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeployHost for NetlifyClient {
    async fn create_deploy_key(&self) -> CollabResult<DeployKey> {
        Ok(self.new_deploy_key().await?)
    }

    async fn create_site(&self, params: &SiteParams) -> CollabResult<SiteResult> {
        Ok(self.site(params).await?)
    }

    async fn deploy_files(&self, site_id: &str, files: &[FileEntry]) -> CollabResult<DeployResult> {
        Ok(self.deploy(site_id, files).await?)
    }

    async fn set_env_vars(&self, site_id: &str, vars: &[(String, String)]) -> CollabResult<()> {
        Ok(self.env(site_id, vars).await?)
    }
}
