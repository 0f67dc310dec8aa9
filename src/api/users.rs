//! Endpoints about the signed-in user.

use axum::{extract::State, Json};

use super::extract::QueryParams;
use super::skip_window;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{ListsQuery, Paginated, User, UserList};
use crate::AppState;

/// GET /api/v1/users/me - The caller's profile.
pub async fn get_me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// GET /api/v1/users/me/lists - The caller's lists.
pub async fn list_my_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    QueryParams(query): QueryParams<ListsQuery>,
) -> Result<Json<Paginated<UserList>>, AppError> {
    let window = skip_window(&state, query.skip, query.limit);
    let (items, total) = state
        .repo
        .list_my_lists(&user.id, query.q.as_deref(), window)
        .await?;
    Ok(Json(Paginated::new(items, total, window)))
}
