//! Admin endpoints, guarded by the pre-shared key.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::extract::{JsonBody, QueryParams};
use super::skip_window;
use crate::errors::AppError;
use crate::models::{Feedback, IngestOutcome, IngestPostRequest, PageQuery, Paginated};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}

/// PUT /api/v1/admin/posts - Ingest a processed post.
///
/// Responds 201 when the post is new and 200 when it replaced an existing one.
pub async fn ingest_post(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<IngestPostRequest>,
) -> Result<(StatusCode, Json<IngestOutcome>), AppError> {
    let outcome = state.repo.ingest_post(&request).await?;

    let docs = state.repo.search_documents_for_post(outcome.topic_id).await?;
    if let Err(e) = state.search.index_post(outcome.topic_id, &docs).await {
        tracing::warn!("Failed to index post {}: {}", outcome.topic_id, e);
    }

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// POST /api/v1/admin/reindex - Rebuild the search index from the database.
pub async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>, AppError> {
    let docs = state.repo.all_search_documents().await?;
    let indexed = state.search.rebuild(&docs).await?;
    Ok(Json(ReindexResponse { indexed }))
}

/// GET /api/v1/admin/feedback - Submitted feedback, newest first.
pub async fn list_feedback(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<Paginated<Feedback>>, AppError> {
    let window = skip_window(&state, query.skip, query.limit);
    let (items, total) = state.repo.list_feedback(window).await?;
    Ok(Json(Paginated::new(items, total, window)))
}
