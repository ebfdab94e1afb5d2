use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::domain::DomainError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub indexed_chunks: usize,
    pub sessions: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Reports whether questions can be answered yet. Ingestion is always accepted.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, DomainError> {
    let indexed_chunks = match state.ingestion.index()? {
        Some(index) => index.len().await?,
        None => 0,
    };

    Ok(Json(ReadinessResponse {
        status: if indexed_chunks > 0 { "ready" } else { "empty" }.into(),
        indexed_chunks,
        sessions: state.sessions.len()?,
    }))
}
