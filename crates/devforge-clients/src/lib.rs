//! HTTP implementations of the devforge collaborator ports.
//!
//! - [`GitHubClient`] implements [`RepoHost`](devforge_core::collab::RepoHost)
//!   over the GitHub REST API, writing multi-file changes as one
//!   blob/tree/commit/ref sequence.
//! - [`NetlifyClient`] implements [`DeployHost`](devforge_core::collab::DeployHost):
//!   sites, deploy keys, SHA-1 digest deploys and environment variables.
//! - [`AiGenerator`] implements [`Generator`](devforge_core::collab::Generator)
//!   against OpenAI or Anthropic, chosen per request from the project settings.
//!
//! Credentials are read from the environment (`GITHUB_TOKEN`, `NETLIFY_TOKEN`,
//! `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`). A missing credential only fails
//! the calls that need it.

pub mod ai;
pub mod error;
pub mod github;
pub mod netlify;

mod http;

pub use ai::AiGenerator;
pub use error::{ClientError, Result};
pub use github::GitHubClient;
pub use netlify::NetlifyClient;
