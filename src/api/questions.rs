//! Per-user question status.

use axum::{extract::State, Json};

use super::extract::{JsonBody, PathParams};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{QuestionStatus, QuestionStatusRequest};
use crate::AppState;

/// PUT /api/v1/users/me/question-status/{question_id} - Mark a question done or not done.
pub async fn set_question_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(question_id): PathParams<String>,
    JsonBody(request): JsonBody<QuestionStatusRequest>,
) -> Result<Json<QuestionStatus>, AppError> {
    let status = state
        .repo
        .set_question_status(&user.id, &question_id, request.is_done)
        .await?;
    Ok(Json(status))
}
