use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};
use uuid::Uuid;

use dossier_common::QueryPayload;

use crate::AppState;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Start an asynchronous investigation and return the initial snapshot.
/// The record is registered before the pipeline is spawned, so the returned
/// id is immediately pollable.
pub async fn start_agent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryPayload>,
) -> impl IntoResponse {
    let task_id = match state.scheduler.start(payload) {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Failed to schedule investigation");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to schedule investigation"})),
            )
                .into_response();
        }
    };

    info!(%task_id, "Investigation submitted");

    match state.store.get(task_id) {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            error!(%task_id, error = %e, "Scheduled task missing from store");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to schedule investigation"})),
            )
                .into_response()
        }
    }
}

pub async fn agent_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.get(task_id) {
        Ok(record) => Json(record).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Unknown task_id"})),
        )
            .into_response(),
    }
}
