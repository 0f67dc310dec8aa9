//! Feedback API endpoint.

use axum::{extract::State, http::StatusCode, Json};

use super::extract::JsonBody;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CreateFeedbackRequest, FeedbackCreated};
use crate::AppState;

/// POST /api/v1/feedback - Submit feedback.
pub async fn create_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackCreated>), AppError> {
    let feedback = request.validated()?;
    let stored = state.repo.create_feedback(&user.id, feedback).await?;

    tracing::info!(feedback_id = %stored.id, kind = stored.kind.as_str(), "Feedback received");

    Ok((
        StatusCode::CREATED,
        Json(FeedbackCreated {
            id: stored.id,
            message: "Feedback submitted successfully".to_string(),
        }),
    ))
}
