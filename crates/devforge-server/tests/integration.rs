use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use devforge_core::collab::{
    CollabResult, CollaboratorError, DeployHost, DeployKey, DeployRequest, DeployResult,
    Generator, RepoHost, SiteParams, SiteResult,
};
use devforge_core::config::Config;
use devforge_core::orchestrator::Wizard;
use devforge_core::payload::{
    DeployConfig, FileEntry, GeneratedDocs, GeneratedScaffold, IdeaInput, MvpFeature, Priority,
    ProjectPlan, PromptPolicy, RepoConfig, RepoResult, TechChoice,
};
use devforge_core::settings::Settings;
use devforge_core::store::{MemoryStore, ProjectStore};
use devforge_server::AppState;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Fake {
    fail_repo: AtomicBool,
}

#[async_trait]
impl Generator for Fake {
    async fn plan(&self, idea: &IdeaInput, _: &Settings) -> CollabResult<ProjectPlan> {
        Ok(ProjectPlan {
            summary: format!("{}. For small teams.", idea.description),
            goals: vec!["Ship".into()],
            non_goals: vec![],
            mvp_features: vec![MvpFeature {
                name: "Boards".into(),
                description: "Kanban boards".into(),
                priority: Priority::Must,
            }],
            tech_stack: vec![TechChoice {
                category: "Frontend".into(),
                choice: "React".into(),
                rationale: String::new(),
            }],
            open_questions: vec![],
        })
    }

    async fn docs(&self, _: &ProjectPlan, repo: &str, _: &Settings) -> CollabResult<GeneratedDocs> {
        Ok(GeneratedDocs {
            readme: format!("# {repo}"),
            roadmap: "roadmap".into(),
            getting_started: "npm i".into(),
            feature_list: "- Boards".into(),
        })
    }

    async fn scaffold(&self, _: &ProjectPlan, _: &Settings) -> CollabResult<GeneratedScaffold> {
        Ok(GeneratedScaffold {
            files: vec![FileEntry::new("package.json", "{}")],
            build_command: "npm run build".into(),
            publish_dir: "dist".into(),
        })
    }

    async fn deploy_config(&self, _: &DeployRequest, _: &Settings) -> CollabResult<DeployConfig> {
        Ok(DeployConfig {
            netlify_toml: "[build]\n  command = \"npm run build\"".into(),
            env_vars: vec![],
        })
    }

    async fn policy(
        &self,
        _: &ProjectPlan,
        existing: &PromptPolicy,
        _: &Settings,
    ) -> CollabResult<PromptPolicy> {
        Ok(existing.clone())
    }
}

#[async_trait]
impl RepoHost for Fake {
    async fn authenticated_user(&self) -> CollabResult<String> {
        Ok("octo".into())
    }

    async fn create_repository(&self, config: &RepoConfig) -> CollabResult<RepoResult> {
        if self.fail_repo.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("GitHub repository creation failed (422)")
                .with_details(r#"{"message":"name already exists"}"#));
        }
        Ok(RepoResult {
            url: format!("https://github.com/octo/{}", config.name),
            clone_url: format!("https://github.com/octo/{}.git", config.name),
            full_name: format!("octo/{}", config.name),
            default_branch: "main".into(),
        })
    }

    async fn commit_files(&self, _: &str, _: &str, _: &[FileEntry], _: &str) -> CollabResult<String> {
        Ok("abc123".into())
    }

    async fn add_deploy_key(&self, _: &str, _: &str, _: &str) -> CollabResult<u64> {
        Ok(7)
    }

    async fn list_files(&self, _: &str) -> CollabResult<Vec<String>> {
        Ok(vec!["README.md".into()])
    }

    async fn read_file(&self, _: &str, path: &str) -> CollabResult<String> {
        Ok(format!("contents of {path}"))
    }
}

#[async_trait]
impl DeployHost for Fake {
    async fn create_deploy_key(&self) -> CollabResult<DeployKey> {
        Ok(DeployKey {
            id: "key-1".into(),
            public_key: "ssh-ed25519 AAAA".into(),
        })
    }

    async fn create_site(&self, params: &SiteParams) -> CollabResult<SiteResult> {
        Ok(SiteResult {
            site_id: "site-1".into(),
            site_url: format!("https://{}.netlify.app", params.name),
            admin_url: String::new(),
        })
    }

    async fn deploy_files(&self, _: &str, _: &[FileEntry]) -> CollabResult<DeployResult> {
        Ok(DeployResult {
            deploy_url: "https://deploy.netlify.app".into(),
        })
    }

    async fn set_env_vars(&self, _: &str, _: &[(String, String)]) -> CollabResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn state_with(store: ProjectStore) -> (AppState, Arc<Fake>) {
    let fake = Arc::new(Fake::default());
    let wizard = Wizard::new(fake.clone(), fake.clone(), fake.clone());
    let state = AppState::new(
        std::path::PathBuf::from("."),
        Config::default(),
        store,
        wizard,
    );
    (state, fake)
}

fn memory_state() -> (AppState, Arc<MemoryStore>, Arc<Fake>) {
    let mem = Arc::new(MemoryStore::new());
    let (state, fake) = state_with(ProjectStore::new(mem.clone()));
    (state, mem, fake)
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let app = devforge_server::build_router(state.clone());
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    send(state, "GET", uri, None).await
}

async fn post(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    send(state, "POST", uri, None).await
}

async fn post_json(
    state: &AppState,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(state, "POST", uri, Some(body)).await
}

async fn put_json(
    state: &AppState,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(state, "PUT", uri, Some(body)).await
}

async fn create_project(state: &AppState) -> String {
    let (status, json) = post(state, "/api/projects").await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

/// Drive a project through idea and plan to the repo step.
async fn project_at_repo(state: &AppState) -> String {
    let id = create_project(state).await;
    let (status, _) = post_json(
        state,
        &format!("/api/projects/{id}/idea"),
        serde_json::json!({ "description": "A task tracker" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(state, &format!("/api/projects/{id}/steps/plan/approve")).await;
    assert_eq!(status, StatusCode::OK);
    id
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_list_and_get_project() {
    let (state, mem, _) = memory_state();
    let id = create_project(&state).await;

    let (status, json) = get(&state, "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([id.clone()]));

    let (status, json) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_step"], "idea");
    assert_eq!(json["steps"]["idea"]["status"], "active");
    assert_eq!(json["steps"]["deploy"]["status"], "locked");

    let stored = ProjectStore::new(mem).load(&id).unwrap();
    assert_eq!(stored.id, id);
}

#[tokio::test]
async fn unknown_project_is_404() {
    let (state, _, _) = memory_state();
    let (status, json) = get(&state, "/api/projects/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn detached_store_serves_working_copy() {
    let (state, _) = state_with(ProjectStore::detached());
    let id = project_at_repo(&state).await;

    let (status, json) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_step"], "repo");
    assert!(json["plan"]["summary"].is_string());
}

#[tokio::test]
async fn unavailable_store_does_not_fail_requests() {
    let (state, mem, _) = memory_state();
    mem.set_available(false);
    let id = create_project(&state).await;

    let (status, json) = post_json(
        &state,
        &format!("/api/projects/{id}/idea"),
        serde_json::json!({ "description": "A task tracker" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["current_step"], "plan");

    let (_, ids) = get(&state, "/api/projects").await;
    assert_eq!(ids, serde_json::json!([id]));
}

#[tokio::test]
async fn saved_project_stays_readable_during_store_outage() {
    let (state, mem, _) = memory_state();
    let id = create_project(&state).await;
    mem.set_available(false);

    let (status, json) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id);
}

#[tokio::test]
async fn put_project_rejects_mismatched_id() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (_, mut project) = get(&state, &format!("/api/projects/{id}")).await;
    project["id"] = serde_json::json!("other");

    let (status, _) = put_json(&state, &format!("/api/projects/{id}"), project).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_project_stores_client_held_aggregate() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (_, mut project) = get(&state, &format!("/api/projects/{id}")).await;
    project["idea"] = serde_json::json!({ "description": "Edited offline" });
    project["revision"] = serde_json::json!(42);

    let (status, _) = put_json(&state, &format!("/api/projects/{id}"), project).await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(json["idea"]["description"], "Edited offline");
}

#[tokio::test]
async fn put_project_rejects_inconsistent_steps() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (_, mut project) = get(&state, &format!("/api/projects/{id}")).await;
    project["steps"]["deploy"]["status"] = serde_json::json!("completed");

    let (status, _) = put_json(&state, &format!("/api/projects/{id}"), project).await;
    assert!(status.is_client_error(), "{status}");
}

#[tokio::test]
async fn put_project_rejects_step_parked_in_approved() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (_, mut project) = get(&state, &format!("/api/projects/{id}")).await;
    project["idea"] = serde_json::json!({ "description": "A task tracker" });
    project["steps"]["idea"]["status"] = serde_json::json!("approved");

    let (status, json) = put_json(&state, &format!("/api/projects/{id}"), project).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("approved"));

    let (_, stored) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(stored["steps"]["idea"]["status"], "active");
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_walk_from_idea_to_deployed_site() {
    let (state, _, _) = memory_state();
    let id = project_at_repo(&state).await;
    let base = format!("/api/projects/{id}");

    let (status, json) = post_json(&state, &format!("{base}/repo"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["repo_result"]["full_name"], "octo/a-task-tracker");
    post(&state, &format!("{base}/steps/repo/approve")).await;

    for action in ["generate", "scaffold", "policy", "commit"] {
        let (status, json) = post(&state, &format!("{base}/docs/{action}")).await;
        assert_eq!(status, StatusCode::OK, "docs/{action}: {json}");
        assert!(json.get("error").is_none(), "docs/{action}: {json}");
    }
    let (status, _) = post(&state, &format!("{base}/steps/docs/approve")).await;
    assert_eq!(status, StatusCode::OK);

    post(&state, &format!("{base}/deploy/generate")).await;
    let (status, json) = post_json(
        &state,
        &format!("{base}/deploy/launch"),
        serde_json::json!({ "name": "Task Tracker" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["deployment"]["linked"], true);
    assert_eq!(
        json["project"]["deployment"]["site_url"],
        "https://task-tracker.netlify.app"
    );

    let (status, json) = post_json(
        &state,
        &format!("{base}/deploy/env"),
        serde_json::json!({ "vars": { "API_URL": "https://api" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["deployment"]["env_keys"], serde_json::json!(["API_URL"]));

    let (status, json) = post(&state, &format!("{base}/steps/deploy/approve")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["steps"]["deploy"]["status"], "completed");
}

#[tokio::test]
async fn approving_a_locked_step_is_422() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (status, json) = post(&state, &format!("/api/projects/{id}/steps/repo/approve")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());

    let (_, project) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(project["current_step"], "idea");
}

#[tokio::test]
async fn approving_docs_without_commit_is_422() {
    let (state, _, _) = memory_state();
    let id = project_at_repo(&state).await;
    let base = format!("/api/projects/{id}");
    post_json(&state, &format!("{base}/repo"), serde_json::json!({ "name": "app" })).await;
    post(&state, &format!("{base}/steps/repo/approve")).await;
    post(&state, &format!("{base}/docs/generate")).await;

    let (status, json) = post(&state, &format!("{base}/steps/docs/approve")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("docs commit"));
}

#[tokio::test]
async fn unknown_step_name_is_400() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (status, _) = post(&state, &format!("/api/projects/{id}/steps/launch/approve")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_idea_is_400() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (status, _) = post_json(
        &state,
        &format!("/api/projects/{id}/idea"),
        serde_json::json!({ "description": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_repo_name_is_400() {
    let (state, _, _) = memory_state();
    let id = project_at_repo(&state).await;
    let (status, _) = post_json(
        &state,
        &format!("/api/projects/{id}/repo"),
        serde_json::json!({ "name": "has spaces" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collaborator_failure_is_200_with_error_then_retryable() {
    let (state, _, fake) = memory_state();
    let id = project_at_repo(&state).await;
    let base = format!("/api/projects/{id}");

    fake.fail_repo.store(true, Ordering::SeqCst);
    let (status, json) = post_json(&state, &format!("{base}/repo"), serde_json::json!({ "name": "app" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["error"].as_str().unwrap().contains("422"));
    assert_eq!(json["project"]["steps"]["repo"]["status"], "error");

    let (status, json) = post(&state, &format!("{base}/steps/repo/retry")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["steps"]["repo"]["status"], "active");

    fake.fail_repo.store(false, Ordering::SeqCst);
    let (status, json) = post_json(&state, &format!("{base}/repo"), serde_json::json!({ "name": "app" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.get("error").is_none());
    assert_eq!(json["project"]["repo_result"]["full_name"], "octo/app");
}

#[tokio::test]
async fn fail_and_go_back() {
    let (state, _, _) = memory_state();
    let id = project_at_repo(&state).await;
    let base = format!("/api/projects/{id}");

    let (status, json) = post_json(
        &state,
        &format!("{base}/steps/repo/fail"),
        serde_json::json!({ "message": "gave up" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["steps"]["repo"]["error"], "gave up");

    let (status, json) = post(&state, &format!("{base}/back")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["current_step"], "plan");
    assert_eq!(json["project"]["steps"]["plan"]["status"], "active");
    assert_eq!(json["project"]["steps"]["repo"]["status"], "locked");
}

#[tokio::test]
async fn edit_plan_only_while_plan_is_active() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    post_json(
        &state,
        &format!("/api/projects/{id}/idea"),
        serde_json::json!({ "description": "A task tracker" }),
    )
    .await;
    let plan = serde_json::json!({ "summary": "Edited plan." });

    let (status, json) = put_json(&state, &format!("/api/projects/{id}/plan"), plan.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["plan"]["summary"], "Edited plan.");

    post(&state, &format!("/api/projects/{id}/steps/plan/approve")).await;
    let (status, _) = put_json(&state, &format!("/api/projects/{id}/plan"), plan).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn step_responses_publish_activity_events() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let mut rx = state.event_tx.subscribe();

    post_json(
        &state,
        &format!("/api/projects/{id}/idea"),
        serde_json::json!({ "description": "A task tracker" }),
    )
    .await;

    let mut messages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.project_id, id);
        messages.push(event.entry.message);
    }
    assert!(messages.iter().any(|m| m == "Plan generated"), "{messages:?}");
}

// ---------------------------------------------------------------------------
// Settings, GitHub, scan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn global_settings_seed_new_projects() {
    let (state, _, _) = memory_state();
    let (status, json) = get(&state, "/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ai_provider"], "openai");

    let (status, json) = put_json(
        &state,
        "/api/settings",
        serde_json::json!({ "ai_provider": "anthropic", "model": "claude-sonnet-4-20250514" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["persisted"], true);

    let id = create_project(&state).await;
    let (_, project) = get(&state, &format!("/api/projects/{id}")).await;
    assert_eq!(project["settings"]["ai_provider"], "anthropic");
}

#[tokio::test]
async fn project_settings_can_be_replaced() {
    let (state, _, _) = memory_state();
    let id = create_project(&state).await;
    let (status, json) = put_json(
        &state,
        &format!("/api/projects/{id}/settings"),
        serde_json::json!({ "ai_provider": "anthropic", "model": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["settings"]["ai_provider"], "anthropic");
}

#[tokio::test]
async fn github_user_returns_login() {
    let (state, _, _) = memory_state();
    let (status, json) = get(&state, "/api/github/user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["login"], "octo");
}

#[tokio::test]
async fn scan_local_directory_reports_known_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("README.md"), "# hi").unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/main.ts"), "").unwrap();
    let (state, _, _) = memory_state();
    let local = dir.path().display().to_string();

    let (status, json) = send(
        &state,
        "GET",
        &format!("/api/scan?local={local}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["detected"]["README.md"], true);
    assert_eq!(json["detected"]["AI_RULES.md"], false);
    assert!(json["files"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "src/main.ts"));

    let (status, json) = get(&state, &format!("/api/scan?local={local}&file=README.md")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"], "# hi");
}

#[tokio::test]
async fn scan_github_uses_repo_host() {
    let (state, _, _) = memory_state();
    let (status, json) = get(&state, "/api/scan?github=octo/app").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["detected"]["README.md"], true);
}

#[tokio::test]
async fn scan_without_source_is_400() {
    let (state, _, _) = memory_state();
    let (status, _) = get(&state, "/api/scan").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
