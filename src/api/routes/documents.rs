use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::application::IngestReport;
use crate::domain::{Document, DomainError};

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentPayload {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub chunk_id: Uuid,
    pub document_id: String,
    pub content: String,
    pub start: usize,
    pub length: usize,
    pub score: f32,
}

pub async fn ingest_documents(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestReport>, DomainError> {
    if request.documents.is_empty() {
        return Err(DomainError::invalid_input("no documents given"));
    }

    let documents = request
        .documents
        .into_iter()
        .map(|d| Document::new(d.id, d.text))
        .collect();
    let report = state.ingestion.ingest(documents).await?;
    Ok(Json(report))
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResultResponse>>, DomainError> {
    if request.query.trim().is_empty() {
        return Err(DomainError::invalid_input("query must not be blank"));
    }

    let index = state
        .ingestion
        .index()?
        .ok_or_else(|| DomainError::not_ready("no documents have been ingested"))?;
    let top_k = request.limit.unwrap_or(state.config.config.rag.top_k);
    let results = index.query(&request.query, top_k).await?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| SearchResultResponse {
                chunk_id: r.chunk.id,
                document_id: r.chunk.document_id,
                content: r.chunk.content,
                start: r.chunk.start,
                length: r.chunk.length,
                score: r.score,
            })
            .collect(),
    ))
}
