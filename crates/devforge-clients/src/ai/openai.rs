//! OpenAI chat completions with `json_schema` structured output.

use serde::Deserialize;
use serde_json::{json, Value};

use super::Task;
use crate::error::{ClientError, Result};
use crate::http;

pub const KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

pub(crate) async fn complete(
    client: &reqwest::Client,
    base_url: &str,
    key: &str,
    model: &str,
    temperature: f32,
    task: &Task,
) -> Result<Value> {
    let context = format!("OpenAI {} generation", task.kind);
    let body = json!({
        "model": model,
        "temperature": temperature,
        "messages": [
            { "role": "system", "content": task.system },
            { "role": "user", "content": task.user },
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": task.kind.as_str(),
                "strict": true,
                "schema": task.schema,
            },
        },
    });
    let resp = client
        .post(http::join(base_url, "/chat/completions"))
        .bearer_auth(key)
        .json(&body)
        .send()
        .await?;
    let chat: ChatResponse = http::json(resp, &context).await?;

    let message = chat
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ClientError::Decode {
            context: context.clone(),
            reason: "no choices returned".into(),
        })?;
    if let Some(refusal) = message.refusal {
        return Err(ClientError::Decode {
            context,
            reason: format!("model refused: {refusal}"),
        });
    }
    let content = message.content.ok_or_else(|| ClientError::Decode {
        context: context.clone(),
        reason: "empty message content".into(),
    })?;
    serde_json::from_str(&content).map_err(|e| ClientError::Decode {
        context,
        reason: e.to_string(),
    })
}
