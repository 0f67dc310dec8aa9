//! Post API endpoints.

use axum::{extract::State, Json};

use super::extract::{JsonBody, PathParams, QueryParams};
use super::skip_window;
use crate::auth::{AuthUser, MaybeUser};
use crate::errors::AppError;
use crate::models::{
    Paginated, PostFilter, PostResponse, PostSummary, PostsQuery, ReactionRequest, ReactionResult,
    ReactionTarget,
};
use crate::AppState;

/// GET /api/v1/posts - Filtered, paginated post feed.
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    QueryParams(query): QueryParams<PostsQuery>,
) -> Result<Json<Paginated<PostSummary>>, AppError> {
    let filter = PostFilter::from_query(&query)?;
    let window = skip_window(&state, query.skip, query.limit);

    let (topic_ids, total) = state.repo.filter_posts(&filter, window).await?;
    let items = state.repo.post_summaries(&topic_ids, viewer.id()).await?;

    Ok(Json(Paginated::new(items, total, window)))
}

/// GET /api/v1/posts/{topic_id}/questions - A post with its questions.
pub async fn get_post_questions(
    State(state): State<AppState>,
    viewer: MaybeUser,
    PathParams(topic_id): PathParams<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state
        .repo
        .get_post(topic_id, viewer.id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", topic_id)))?;
    let questions = state.repo.questions_for_post(topic_id, viewer.id()).await?;

    Ok(Json(PostResponse { post, questions }))
}

/// POST /api/v1/posts/{topic_id}/like - Like or dislike a post.
pub async fn react_to_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(topic_id): PathParams<i64>,
    JsonBody(request): JsonBody<ReactionRequest>,
) -> Result<Json<ReactionResult>, AppError> {
    ensure_post(&state, topic_id).await?;

    let target_id = topic_id.to_string();
    let status = state
        .repo
        .set_reaction(&user.id, ReactionTarget::Post, &target_id, request.is_like)
        .await?;
    let summary = state
        .repo
        .reaction_summary(ReactionTarget::Post, &target_id, Some(&user.id))
        .await?;

    Ok(Json(ReactionResult {
        item_id: target_id,
        user_id: user.id,
        is_like: Some(request.is_like),
        status,
        summary,
    }))
}

/// DELETE /api/v1/posts/{topic_id}/like - Remove the caller's reaction.
pub async fn remove_post_reaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(topic_id): PathParams<i64>,
) -> Result<Json<ReactionResult>, AppError> {
    ensure_post(&state, topic_id).await?;

    let target_id = topic_id.to_string();
    let status = state
        .repo
        .remove_reaction(&user.id, ReactionTarget::Post, &target_id)
        .await?;
    let summary = state
        .repo
        .reaction_summary(ReactionTarget::Post, &target_id, Some(&user.id))
        .await?;

    Ok(Json(ReactionResult {
        item_id: target_id,
        user_id: user.id,
        is_like: None,
        status,
        summary,
    }))
}

async fn ensure_post(state: &AppState, topic_id: i64) -> Result<(), AppError> {
    if state.repo.post_exists(topic_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Post {} not found", topic_id)))
    }
}
