//! List API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use super::extract::{JsonBody, PathParams, QueryParams};
use super::skip_window;
use crate::auth::{AuthUser, MaybeUser};
use crate::errors::AppError;
use crate::models::{
    CreateListRequest, ListDetail, ListQuestionAction, ListQuestionRequest, ListQuestionResponse,
    ListsQuery, Paginated, ReactionRequest, ReactionResult, ReactionTarget, UpdateListRequest,
    UserList,
};
use crate::AppState;

/// GET /api/v1/lists - Public lists.
pub async fn list_public_lists(
    State(state): State<AppState>,
    viewer: MaybeUser,
    QueryParams(query): QueryParams<ListsQuery>,
) -> Result<Json<Paginated<UserList>>, AppError> {
    let window = skip_window(&state, query.skip, query.limit);
    let (items, total) = state
        .repo
        .list_public_lists(query.q.as_deref(), window, viewer.id())
        .await?;
    Ok(Json(Paginated::new(items, total, window)))
}

/// POST /api/v1/lists - Create a list.
pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<CreateListRequest>,
) -> Result<(StatusCode, Json<UserList>), AppError> {
    let request = request.validated()?;
    let list = state.repo.create_list(&user.id, request).await?;

    tracing::debug!(list_id = %list.id, user_id = %user.id, "Created list");
    Ok((StatusCode::CREATED, Json(list)))
}

/// GET /api/v1/lists/{list_id} - A list with its questions.
///
/// Private lists are only visible to their owner. Views by anyone else are counted.
pub async fn get_list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    PathParams(list_id): PathParams<String>,
) -> Result<Json<ListDetail>, AppError> {
    let mut list = visible_list(&state, &list_id, viewer.id()).await?;

    if viewer.id() != Some(list.user_id.as_str()) {
        state.repo.increment_list_views(&list_id).await?;
        list.views += 1;
    }

    let question_ids = state.repo.list_question_ids(&list_id).await?;
    let questions = state
        .repo
        .questions_by_ids(&question_ids, viewer.id())
        .await?;

    Ok(Json(ListDetail { list, questions }))
}

/// PUT /api/v1/lists/{list_id} - Update a list.
pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(list_id): PathParams<String>,
    JsonBody(request): JsonBody<UpdateListRequest>,
) -> Result<Json<UserList>, AppError> {
    let request = request.validated()?;
    Ok(Json(state.repo.update_list(&user.id, &list_id, request).await?))
}

/// DELETE /api/v1/lists/{list_id} - Delete a list.
pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(list_id): PathParams<String>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_list(&user.id, &list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/lists/{list_id}/questions/{question_id} - Add or remove a question.
///
/// The body is optional and defaults to adding.
pub async fn toggle_list_question(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams((list_id, question_id)): PathParams<(String, String)>,
    request: Option<JsonBody<ListQuestionRequest>>,
) -> Result<Json<ListQuestionResponse>, AppError> {
    let action = request.map(|JsonBody(r)| r.action).unwrap_or_default();
    let questions_count = state
        .repo
        .toggle_list_question(&user.id, &list_id, &question_id, action)
        .await?;

    let message = match action {
        ListQuestionAction::Add => "Question added to list",
        ListQuestionAction::Remove => "Question removed from list",
    };

    Ok(Json(ListQuestionResponse {
        message: message.to_string(),
        list_id,
        question_id,
        action_performed: action,
        questions_count,
    }))
}

/// POST /api/v1/lists/{list_id}/like - Like or dislike a list.
pub async fn react_to_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(list_id): PathParams<String>,
    JsonBody(request): JsonBody<ReactionRequest>,
) -> Result<Json<ReactionResult>, AppError> {
    visible_list(&state, &list_id, Some(&user.id)).await?;

    let status = state
        .repo
        .set_reaction(&user.id, ReactionTarget::List, &list_id, request.is_like)
        .await?;
    let summary = state
        .repo
        .reaction_summary(ReactionTarget::List, &list_id, Some(&user.id))
        .await?;

    Ok(Json(ReactionResult {
        item_id: list_id,
        user_id: user.id,
        is_like: Some(request.is_like),
        status,
        summary,
    }))
}

/// DELETE /api/v1/lists/{list_id}/like - Remove the caller's reaction.
pub async fn remove_list_reaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParams(list_id): PathParams<String>,
) -> Result<Json<ReactionResult>, AppError> {
    visible_list(&state, &list_id, Some(&user.id)).await?;

    let status = state
        .repo
        .remove_reaction(&user.id, ReactionTarget::List, &list_id)
        .await?;
    let summary = state
        .repo
        .reaction_summary(ReactionTarget::List, &list_id, Some(&user.id))
        .await?;

    Ok(Json(ReactionResult {
        item_id: list_id,
        user_id: user.id,
        is_like: None,
        status,
        summary,
    }))
}

/// The list if `viewer` may see it; private lists of others are reported missing.
async fn visible_list(
    state: &AppState,
    list_id: &str,
    viewer: Option<&str>,
) -> Result<UserList, AppError> {
    match state.repo.list_item(list_id, viewer).await? {
        Some(list) if list.is_public || viewer == Some(list.user_id.as_str()) => Ok(list),
        _ => Err(AppError::NotFound(format!("List '{}' not found", list_id))),
    }
}
