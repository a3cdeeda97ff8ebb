//! Anthropic messages API. Structured output is obtained by forcing a single
//! tool call whose input schema is the wanted shape.

use serde::Deserialize;
use serde_json::{json, Value};

use super::Task;
use crate::error::{ClientError, Result};
use crate::http;

pub const KEY_VAR: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    input: Option<Value>,
}

pub(crate) async fn complete(
    client: &reqwest::Client,
    base_url: &str,
    key: &str,
    model: &str,
    temperature: f32,
    task: &Task,
) -> Result<Value> {
    let context = format!("Anthropic {} generation", task.kind);
    let tool = task.kind.as_str();
    let body = json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "temperature": temperature,
        "system": task.system,
        "messages": [{ "role": "user", "content": task.user }],
        "tools": [{
            "name": tool,
            "description": format!("Record the generated {tool}"),
            "input_schema": task.schema,
        }],
        "tool_choice": { "type": "tool", "name": tool },
    });
    let resp = client
        .post(http::join(base_url, "/messages"))
        .header("x-api-key", key)
        .header("anthropic-version", API_VERSION)
        .json(&body)
        .send()
        .await?;
    let message: MessagesResponse = http::json(resp, &context).await?;

    message
        .content
        .into_iter()
        .find(|b| b.kind == "tool_use")
        .and_then(|b| b.input)
        .ok_or_else(|| ClientError::Decode {
            context,
            reason: "no tool_use block in response".into(),
        })
}
