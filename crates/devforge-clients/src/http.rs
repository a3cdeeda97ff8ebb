use crate::error::{ClientError, Result};
use serde::de::DeserializeOwned;

pub(crate) const USER_AGENT: &str = concat!("devforge/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Turn a non-2xx response into [`ClientError::Api`], pulling a `message`
/// (or `error.message`) out of a JSON body when there is one.
pub(crate) async fn check(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ClientError::Api {
        context: context.to_string(),
        status: status.as_u16(),
        message,
        body,
    })
}

pub(crate) async fn json<T: DeserializeOwned>(resp: reqwest::Response, context: &str) -> Result<T> {
    let resp = check(resp, context).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        context: context.to_string(),
        reason: e.to_string(),
    })
}

/// Read a credential from the environment.
pub(crate) fn env_token(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
