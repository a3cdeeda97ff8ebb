pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project).put(routes::projects::put_project),
        )
        .route(
            "/api/projects/{id}/settings",
            put(routes::projects::put_settings),
        )
        // Idea / plan
        .route("/api/projects/{id}/idea", post(routes::steps::submit_idea))
        .route(
            "/api/projects/{id}/plan/generate",
            post(routes::steps::generate_plan),
        )
        .route("/api/projects/{id}/plan", put(routes::steps::put_plan))
        // Repository
        .route("/api/projects/{id}/repo", post(routes::steps::create_repo))
        // Docs
        .route(
            "/api/projects/{id}/docs/generate",
            post(routes::steps::generate_docs),
        )
        .route(
            "/api/projects/{id}/docs/scaffold",
            post(routes::steps::generate_scaffold),
        )
        .route(
            "/api/projects/{id}/docs/policy",
            post(routes::steps::generate_policy),
        )
        .route(
            "/api/projects/{id}/docs/commit",
            post(routes::steps::commit_docs),
        )
        .route("/api/projects/{id}/docs", put(routes::steps::put_docs))
        // Deploy
        .route(
            "/api/projects/{id}/deploy/generate",
            post(routes::steps::generate_deploy),
        )
        .route(
            "/api/projects/{id}/deploy/launch",
            post(routes::steps::launch),
        )
        .route(
            "/api/projects/{id}/deploy/env",
            post(routes::steps::configure_env),
        )
        // Engine
        .route(
            "/api/projects/{id}/steps/{step}/approve",
            post(routes::steps::approve_step),
        )
        .route(
            "/api/projects/{id}/steps/{step}/retry",
            post(routes::steps::retry_step),
        )
        .route(
            "/api/projects/{id}/steps/{step}/fail",
            post(routes::steps::fail_step),
        )
        .route("/api/projects/{id}/back", post(routes::steps::go_back))
        // Settings
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::put_settings),
        )
        // Integrations
        .route("/api/github/user", get(routes::github::get_user))
        .route("/api/scan", get(routes::scan::scan_repo))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server on `port`.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the API server on a pre-bound listener.
///
/// Lets the caller read the actual port before starting (useful when
/// `port = 0` and the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("devforge API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/projects");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
