//! Company API endpoints.

use axum::{extract::State, Json};

use super::extract::PathParams;
use crate::errors::AppError;
use crate::models::Company;
use crate::AppState;

/// GET /api/v1/companies - Companies that have posts.
pub async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(state.repo.list_companies().await?))
}

/// GET /api/v1/companies/{company_id}/roles - Roles seen for a company.
pub async fn list_company_roles(
    State(state): State<AppState>,
    PathParams(company_id): PathParams<i64>,
) -> Result<Json<Vec<String>>, AppError> {
    if state.repo.get_company(company_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Company {} not found",
            company_id
        )));
    }

    Ok(Json(state.repo.roles_for_company(company_id).await?))
}
