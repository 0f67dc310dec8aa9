//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data; the search index
//! is derived from it.

mod catalog;
mod ingest;
mod lists;
mod reactions;
mod users;

pub use ingest::QuestionSearchDoc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            username TEXT NOT NULL,
            full_name TEXT NOT NULL DEFAULT '',
            picture_url TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            topic_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL DEFAULT '',
            author TEXT,
            content TEXT NOT NULL DEFAULT '',
            tags TEXT,
            leetcode_created_at TEXT,
            upvote INTEGER NOT NULL DEFAULT 0,
            downvote INTEGER NOT NULL DEFAULT 0,
            yoe INTEGER,
            views INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_companies (
            topic_id INTEGER NOT NULL REFERENCES posts(topic_id) ON DELETE CASCADE,
            company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            PRIMARY KEY (topic_id, company_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            topic_id INTEGER NOT NULL REFERENCES posts(topic_id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            question_text TEXT NOT NULL,
            role TEXT,
            company_id INTEGER REFERENCES companies(id) ON DELETE SET NULL,
            tags TEXT,
            mapping_status TEXT,
            first_seen_at TEXT NOT NULL,
            last_seen_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS similar_questions (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            source TEXT NOT NULL,
            score REAL NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reactions (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            target_kind TEXT NOT NULL,
            target_id TEXT NOT NULL,
            is_like INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, target_kind, target_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_status (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            is_done INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, question_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_public INTEGER NOT NULL DEFAULT 0,
            tags TEXT,
            views INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS list_questions (
            list_id TEXT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            added_at TEXT NOT NULL,
            PRIMARY KEY (list_id, question_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(leetcode_created_at);
        CREATE INDEX IF NOT EXISTS idx_post_companies_company ON post_companies(company_id);
        CREATE INDEX IF NOT EXISTS idx_questions_topic ON questions(topic_id, position);
        CREATE INDEX IF NOT EXISTS idx_questions_company_role ON questions(company_id, role);
        CREATE INDEX IF NOT EXISTS idx_questions_last_seen ON questions(last_seen_at);
        CREATE INDEX IF NOT EXISTS idx_similar_question ON similar_questions(question_id);
        CREATE INDEX IF NOT EXISTS idx_reactions_target ON reactions(target_kind, target_id);
        CREATE INDEX IF NOT EXISTS idx_lists_owner ON lists(user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_lists_public ON lists(is_public, updated_at);
        CREATE INDEX IF NOT EXISTS idx_list_questions_question ON list_questions(question_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// Helper functions shared by the repository files

/// Append `(v1, v2, ...)` with each value bound.
fn push_in_list<'args, T>(qb: &mut QueryBuilder<'args, Sqlite>, values: &[T])
where
    T: 'args + Clone + sqlx::Encode<'args, Sqlite> + sqlx::Type<Sqlite> + Send,
{
    qb.push("(");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn to_json_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
