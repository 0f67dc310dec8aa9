//! Users, per-user question status and feedback.

use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::timestamp::now_timestamp;
use crate::models::{Feedback, FeedbackKind, Identity, NewFeedback, PageWindow, QuestionStatus, User};

impl Repository {
    // ==================== USERS ====================

    /// Create or refresh the user behind a verified identity.
    ///
    /// Profile fields follow the identity provider; the username is fixed at
    /// first sign-in.
    pub async fn upsert_user(&self, identity: &Identity) -> Result<User, AppError> {
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, full_name, picture_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                picture_url = excluded.picture_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&identity.subject)
        .bind(&identity.email)
        .bind(identity.username())
        .bind(identity.name.clone().unwrap_or_default())
        .bind(identity.picture.clone().unwrap_or_default())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_user(&identity.subject)
            .await?
            .ok_or_else(|| AppError::Internal("User vanished after upsert".to_string()))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, username, full_name, picture_url, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            username: row.get("username"),
            full_name: row.get("full_name"),
            picture_url: row.get("picture_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    // ==================== QUESTION STATUS ====================

    pub async fn set_question_status(
        &self,
        user_id: &str,
        question_id: &str,
        is_done: bool,
    ) -> Result<QuestionStatus, AppError> {
        if !self.question_exists(question_id).await? {
            return Err(AppError::NotFound(format!(
                "Question '{}' not found",
                question_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO question_status (user_id, question_id, is_done, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, question_id) DO UPDATE SET
                is_done = excluded.is_done,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(is_done)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(QuestionStatus {
            question_id: question_id.to_string(),
            is_done,
        })
    }

    // ==================== FEEDBACK ====================

    pub async fn create_feedback(
        &self,
        user_id: &str,
        feedback: NewFeedback,
    ) -> Result<Feedback, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO feedback (id, user_id, kind, title, description, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(feedback.kind.as_str())
        .bind(&feedback.title)
        .bind(&feedback.description)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Feedback {
            id,
            user_id: user_id.to_string(),
            kind: feedback.kind,
            title: feedback.title,
            description: feedback.description,
            created_at: now,
        })
    }

    /// Feedback entries, newest first.
    pub async fn list_feedback(&self, window: PageWindow) -> Result<(Vec<Feedback>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"SELECT id, user_id, kind, title, description, created_at FROM feedback
               ORDER BY created_at DESC, id LIMIT ? OFFSET ?"#,
        )
        .bind(window.limit)
        .bind(window.skip)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                let kind: String = row.get("kind");
                Feedback {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    kind: FeedbackKind::parse(&kind).unwrap_or(FeedbackKind::Others),
                    title: row.get("title"),
                    description: row.get("description"),
                    created_at: row.get("created_at"),
                }
            })
            .collect();

        Ok((items, total))
    }
}
