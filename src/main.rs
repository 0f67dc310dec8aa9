//! LeetSight Backend
//!
//! Browse, filter and curate interview questions extracted from LeetCode
//! discussion posts. SQLite persistence with Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::IdTokenVerifier;
use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    pub verifier: Arc<IdTokenVerifier>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LeetSight Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_psk.is_none() {
        tracing::warn!("No admin PSK configured (LEETSIGHT_ADMIN_PSK). Admin routes are disabled");
    }

    let verifier = IdTokenVerifier::from_config(&config);
    if verifier.uses_shared_secret() {
        tracing::warn!("ID tokens are verified with LEETSIGHT_AUTH_SECRET (HS256). Do not use in production");
    } else if !verifier.is_configured() {
        tracing::warn!("No Google client id configured (LEETSIGHT_GOOGLE_CLIENT_ID). Sign-in is disabled");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let docs = repo.all_search_documents().await?;
    search.rebuild(&docs).await?;

    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
        verifier: Arc::new(verifier),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the admin layer
    let psk = state.config.admin_psk.clone();

    let admin_routes = Router::new()
        .route("/posts", put(api::ingest_post))
        .route("/reindex", post(api::reindex))
        .route("/feedback", get(api::list_feedback))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let v1_routes = Router::new()
        // Companies
        .route("/companies", get(api::list_companies))
        .route("/companies/{company_id}/roles", get(api::list_company_roles))
        // Posts
        .route("/posts", get(api::list_posts))
        .route("/posts/{topic_id}/questions", get(api::get_post_questions))
        .route(
            "/posts/{topic_id}/like",
            post(api::react_to_post).delete(api::remove_post_reaction),
        )
        // Users
        .route("/users/me", get(api::get_me))
        .route("/users/me/lists", get(api::list_my_lists))
        .route(
            "/users/me/question-status/{question_id}",
            put(api::set_question_status),
        )
        // Lists
        .route("/lists", get(api::list_public_lists).post(api::create_list))
        .route(
            "/lists/{list_id}",
            get(api::get_list)
                .put(api::update_list)
                .delete(api::delete_list),
        )
        .route(
            "/lists/{list_id}/questions/{question_id}",
            post(api::toggle_list_question),
        )
        .route(
            "/lists/{list_id}/like",
            post(api::react_to_list).delete(api::remove_list_reaction),
        )
        // Feedback
        .route("/feedback", post(api::create_feedback))
        // Search
        .route("/search", get(api::search_questions))
        .nest("/admin", admin_routes);

    // Catalogue routes sit directly under /api, next to /api/v1
    let api_routes = Router::new()
        .route("/companies", get(api::catalog_companies))
        .route("/roles", get(api::catalog_roles))
        .route("/recent-posts", get(api::recent_posts))
        .route("/company-questions", get(api::company_questions))
        .route("/post-detail/{topic_id}", get(api::post_detail))
        .nest("/v1", v1_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
