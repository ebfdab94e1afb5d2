use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::application::{Answer, EngineState};
use crate::domain::{ConversationTurn, DomainError};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub state: EngineState,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), DomainError> {
    let (session_id, engine) = state.create_session()?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            state: engine.state()?,
        }),
    ))
}

pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, DomainError> {
    let engine = state.ready_session(id)?;
    let answer = match request.top_k {
        Some(top_k) => engine.ask(&request.question, top_k).await?,
        None => engine.ask_default(&request.question).await?,
    };
    Ok(Json(answer))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConversationTurn>>, DomainError> {
    let engine = state.sessions.get(id)?;
    Ok(Json(engine.history()?))
}

pub async fn transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let engine = state.sessions.get(id)?;
    let body = engine.transcript()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat_history.txt\"",
            ),
        ],
        body,
    ))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    let engine = state.sessions.get(id)?;
    engine.clear()?;
    Ok(StatusCode::NO_CONTENT)
}
