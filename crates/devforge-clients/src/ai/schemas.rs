//! JSON Schemas for structured model output. Field names match the serde
//! names of the `devforge_core::payload` types so responses deserialize
//! directly. Every object lists all of its properties as required and
//! forbids extras, which OpenAI's strict mode demands.

use serde_json::{json, Value};

fn object(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn strings(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

pub fn plan() -> Value {
    object(json!({
        "summary": string("A 2-3 sentence project summary"),
        "goals": strings("3-5 project goals"),
        "non_goals": strings("2-3 things explicitly out of scope"),
        "mvp_features": {
            "type": "array",
            "description": "5-10 MVP features ranked by priority",
            "items": object(json!({
                "name": string("Feature name"),
                "description": string("What the feature does"),
                "priority": { "type": "string", "enum": ["must", "should", "could"] },
            })),
        },
        "tech_stack": {
            "type": "array",
            "items": object(json!({
                "category": string("e.g. Frontend, Backend, Database"),
                "choice": string("The specific technology"),
                "rationale": string("Why it fits"),
            })),
        },
        "open_questions": strings("Unresolved decisions or questions"),
    }))
}

pub fn docs() -> Value {
    object(json!({
        "readme": string("Full README.md content in markdown"),
        "roadmap": string("Full ROADMAP.md content in markdown"),
        "getting_started": string("Full GETTING_STARTED.md content"),
        "feature_list": string("Feature list as markdown"),
    }))
}

pub fn scaffold() -> Value {
    object(json!({
        "files": {
            "type": "array",
            "description": "Source files of a minimal runnable app",
            "items": object(json!({
                "path": string("Repository-relative path using forward slashes"),
                "content": string("Full file content"),
            })),
        },
        "build_command": string("Command that builds the app, e.g. npm run build"),
        "publish_dir": string("Directory holding the built site, e.g. dist"),
    }))
}

pub fn deploy_config() -> Value {
    object(json!({
        "netlify_toml": string("Contents of netlify.toml"),
        "env_vars": {
            "type": "array",
            "items": object(json!({
                "key": string("Environment variable name"),
                "description": string("What it is used for"),
                "required": { "type": "boolean" },
            })),
        },
    }))
}

pub fn policy() -> Value {
    object(json!({
        "project_context": string("One paragraph describing the project for an AI assistant"),
        "code_style_rules": strings("Code style rules"),
        "architecture_rules": strings("Architecture and layout rules"),
        "dos": strings("Things to always do"),
        "donts": strings("Things to never do"),
    }))
}
