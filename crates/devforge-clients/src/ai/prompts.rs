use devforge_core::collab::DeployRequest;
use devforge_core::payload::{IdeaInput, ProjectPlan, PromptPolicy};

pub const PLANNER_SYSTEM: &str = "\
You are a senior software architect helping a solo developer plan a new project.
Given the developer's idea, generate a structured project plan.
Be practical and opinionated: recommend specific technologies, not vague categories.
Focus on MVP scope. Be concise.";

pub const DOCS_SYSTEM: &str = "\
You are a technical writer creating project documentation.
Given a project plan, generate professional, developer-friendly documentation.
Use clear markdown formatting. Be concise but thorough.";

pub const SCAFFOLD_SYSTEM: &str = "\
You are a senior engineer bootstrapping a new repository.
Given a project plan, generate the smallest runnable app that uses the chosen stack:
package manifest, entry point, one page or route per must-have feature, and build config.
Do not generate README or other documentation files.";

pub const DEPLOY_SYSTEM: &str = "\
You are a DevOps engineer generating deployment configuration.
Given the project's tech stack, generate a netlify.toml and identify required environment variables.";

pub const POLICY_SYSTEM: &str = "\
You write AI_RULES.md files: concise rules an AI coding assistant must follow in a repository.
Given a project plan and any existing rules, produce a consolidated policy.
Keep existing rules unless they conflict with the plan, remove duplicates, and add
project-specific rules the existing ones miss.";

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

pub fn plan(idea: &IdeaInput) -> String {
    format!(
        "Project Idea:\n{}\n\nTags: {}\nConstraints: {}\nGoals: {}",
        idea.description,
        list_or_none(&idea.tags),
        list_or_none(&idea.constraints),
        list_or_none(&idea.goals),
    )
}

pub fn docs(plan: &ProjectPlan, repo_name: &str) -> String {
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
    format!(
        "Project Plan:\n{plan_json}\n\nRepository: {repo_name}\nTech Stack: {}",
        plan.tech_stack_summary("\n")
    )
}

pub fn scaffold(plan: &ProjectPlan) -> String {
    let features = plan
        .mvp_features
        .iter()
        .map(|f| format!("- {}: {} ({})", f.name, f.description, f.priority))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Summary:\n{}\n\nFeatures:\n{features}\n\nTech Stack:\n{}",
        plan.summary,
        plan.tech_stack_summary("\n")
    )
}

pub fn deploy(request: &DeployRequest) -> String {
    format!(
        "Tech Stack:\n{}\n\nProject Type: {}\nHas Server-Side Routes: {}",
        request.tech_stack, request.project_type, request.has_api
    )
}

pub fn policy(plan: &ProjectPlan, existing: &PromptPolicy) -> String {
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
    let existing = if existing.is_empty() {
        "none".to_string()
    } else {
        existing.to_markdown()
    };
    format!("Project Plan:\n{plan_json}\n\nExisting Rules:\n{existing}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_render_as_none() {
        let prompt = plan(&IdeaInput::new("A task tracker"));
        assert!(prompt.contains("Tags: none"));
        assert!(prompt.starts_with("Project Idea:\nA task tracker"));
    }

    #[test]
    fn deploy_prompt_includes_flags() {
        let prompt = deploy(&DeployRequest {
            tech_stack: "Frontend: React".into(),
            project_type: "web-app".into(),
            has_api: true,
        });
        assert!(prompt.contains("Has Server-Side Routes: true"));
    }
}
