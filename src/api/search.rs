//! Search API endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::extract::QueryParams;
use crate::auth::MaybeUser;
use crate::errors::AppError;
use crate::models::Question;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: the configured page size).
    #[serde(default)]
    pub limit: Option<usize>,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub question: Question,
    pub score: f32,
}

/// Deepest result offset a search may request.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// GET /api/v1/search - Full-text search over questions.
pub async fn search_questions(
    State(state): State<AppState>,
    viewer: MaybeUser,
    QueryParams(params): QueryParams<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    if params.offset > MAX_SEARCH_OFFSET {
        return Err(AppError::BadRequest(format!(
            "offset must not exceed {}",
            MAX_SEARCH_OFFSET
        )));
    }

    let max_limit = (state.config.max_page_size as usize).max(1);
    let limit = params
        .limit
        .unwrap_or(state.config.default_page_size as usize)
        .clamp(1, max_limit);

    let page = state.search.search(&params.q, limit, params.offset)?;

    let ids: Vec<String> = page.hits.iter().map(|hit| hit.question_id.clone()).collect();
    let mut questions = state.repo.questions_by_ids(&ids, viewer.id()).await?;

    // Questions deleted since the last index update are skipped
    let items = page
        .hits
        .into_iter()
        .filter_map(|hit| {
            let position = questions.iter().position(|q| q.id == hit.question_id)?;
            Some(SearchResultItem {
                question: questions.swap_remove(position),
                score: hit.score,
            })
        })
        .collect();

    Ok(Json(SearchResponse {
        items,
        total: page.total,
        limit,
        offset: params.offset,
    }))
}
