use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dossier_agent::{TaskScheduler, TaskStore};
use dossier_common::Config;
use dossier_tools::ToolsState;
use tools_client::ToolsClient;

mod rest;

pub struct AppState {
    pub store: TaskStore,
    pub scheduler: TaskScheduler,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dossier=info".parse()?))
        .init();

    let config = Config::from_env();

    // One store for the process lifetime, cloned into the scheduler and
    // the API state. The agent reaches the tools routes over HTTP, same as
    // any external collaborator would be reached.
    let store = TaskStore::new();
    let tools = Arc::new(ToolsClient::new(&config.tools_base_url));
    let scheduler = TaskScheduler::new(store.clone(), tools);

    let state = Arc::new(AppState {
        store,
        scheduler,
    });
    let tools_state = Arc::new(ToolsState::new(&config));

    let app = Router::new()
        // Health check
        .route("/health", get(rest::health))
        // Agent orchestration
        .route("/agent/start", post(rest::start_agent))
        .route("/agent/status/{task_id}", get(rest::agent_status))
        .with_state(state)
        // Collaborator tool endpoints
        .nest("/tools", dossier_tools::router(tools_state))
        // Allow local polling UIs to talk to the API
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path + status + latency
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Dossier API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
