//! Configuration module for the LeetSight backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Google's published signing keys for ID tokens.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Pre-shared key for the admin ingest routes
    pub admin_psk: Option<String>,
    /// OAuth client id; expected `aud` claim of ID tokens
    pub google_client_id: Option<String>,
    /// JWKS endpoint used to verify RS256 ID tokens
    pub google_jwks_url: String,
    /// HS256 secret; replaces JWKS verification when set
    pub auth_secret: Option<String>,
    /// Default `limit` for paginated routes
    pub default_page_size: u32,
    /// Upper bound for `limit`
    pub max_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("LEETSIGHT_DB_PATH")
            .unwrap_or_else(|_| "./data/leetsight.sqlite".to_string())
            .into();

        let index_path = env::var("LEETSIGHT_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("LEETSIGHT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid LEETSIGHT_BIND_ADDR: {}", e)))?;

        let log_level = env::var("LEETSIGHT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_psk = non_empty_var("LEETSIGHT_ADMIN_PSK");
        let google_client_id = non_empty_var("LEETSIGHT_GOOGLE_CLIENT_ID");
        let google_jwks_url =
            non_empty_var("LEETSIGHT_GOOGLE_JWKS_URL").unwrap_or_else(|| GOOGLE_JWKS_URL.into());
        let auth_secret = non_empty_var("LEETSIGHT_AUTH_SECRET");

        let default_page_size = parse_u32("LEETSIGHT_DEFAULT_PAGE_SIZE", 10)?;
        let max_page_size = parse_u32("LEETSIGHT_MAX_PAGE_SIZE", 100)?;
        if default_page_size == 0 || default_page_size > max_page_size {
            return Err(AppError::Internal(format!(
                "LEETSIGHT_DEFAULT_PAGE_SIZE must be between 1 and {}",
                max_page_size
            )));
        }

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            admin_psk,
            google_client_id,
            google_jwks_url,
            auth_secret,
            default_page_size,
            max_page_size,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
