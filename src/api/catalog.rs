//! Catalogue endpoints under `/api`.
//!
//! These serve processed-post and company-question documents in the shape
//! the catalogue pages read them.

use axum::{extract::State, Json};
use chrono::Utc;

use super::extract::{PathParams, QueryParams};
use super::page_window;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{
    role_filter, time_period_floor, CompanyQuestionsPage, CompanyQuestionsQuery, PageWindow,
    PostFilter, ProcessedPostDocument, RecentPostsPage, RecentPostsQuery, RolesQuery,
    ALL_COMPANIES, ALL_ROLES,
};
use crate::AppState;

/// GET /api/companies - Company names that have questions.
pub async fn catalog_companies(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.repo.question_company_names().await?))
}

/// GET /api/roles?company= - Roles seen for a company.
pub async fn catalog_roles(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RolesQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let company = query
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Company parameter is required".to_string()))?;

    Ok(Json(state.repo.roles_for_company_name(company).await?))
}

/// GET /api/recent-posts - Processed posts, newest first.
pub async fn recent_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RecentPostsQuery>,
) -> Result<Json<RecentPostsPage>, AppError> {
    let window = page_window(&state, query.page, query.limit);

    let filter = PostFilter {
        company_name: query
            .company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_COMPANIES)
            .map(str::to_string),
        created_from: time_period_floor(query.time_period.as_deref(), Utc::now()),
        ..Default::default()
    };

    let (topic_ids, total) = state.repo.filter_posts(&filter, window).await?;
    let posts: Vec<ProcessedPostDocument> = state.repo.processed_post_documents(&topic_ids).await?;

    Ok(Json(RecentPostsPage {
        posts,
        total_posts: total,
        current_page: window.current_page(),
        total_pages: window.total_pages(total),
    }))
}

/// GET /api/company-questions - Questions of one company.
pub async fn company_questions(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CompanyQuestionsQuery>,
) -> Result<Json<CompanyQuestionsPage>, AppError> {
    let company = query
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_COMPANIES)
        .ok_or_else(|| {
            AppError::BadRequest("Specific company parameter is required".to_string())
        })?;

    let window: PageWindow = page_window(&state, query.page, query.limit);
    let role = role_filter(query.role.as_deref());
    let created_from = time_period_floor(query.time_period.as_deref(), Utc::now());

    let (questions, total) = state
        .repo
        .company_questions(company, role.as_deref(), created_from.as_deref(), window)
        .await?;

    Ok(Json(CompanyQuestionsPage {
        questions,
        total_questions: total,
        current_page: window.current_page(),
        total_pages: window.total_pages(total),
        role_name: query
            .role
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| ALL_ROLES.to_string()),
        company_name: company.to_string(),
    }))
}

/// GET /api/post-detail/{topicId} - One processed post document.
pub async fn post_detail(
    State(state): State<AppState>,
    PathParams(topic_id): PathParams<String>,
) -> Result<Json<ProcessedPostDocument>, AppError> {
    let topic_id: i64 = topic_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid Topic ID".to_string()))?;

    state
        .repo
        .processed_post_documents(&[topic_id])
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}
