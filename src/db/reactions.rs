//! Like/dislike reactions on posts and lists.

use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::timestamp::now_timestamp;
use crate::models::{ReactionStatus, ReactionSummary, ReactionTarget};

impl Repository {
    /// Record `user_id`'s reaction, replacing any previous one.
    pub async fn set_reaction(
        &self,
        user_id: &str,
        target: ReactionTarget,
        target_id: &str,
        is_like: bool,
    ) -> Result<ReactionStatus, AppError> {
        let now = now_timestamp();

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT is_like FROM reactions WHERE user_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(user_id)
        .bind(target.as_str())
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO reactions (user_id, target_kind, target_id, is_like, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, target_kind, target_id) DO UPDATE SET
                is_like = excluded.is_like,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(target.as_str())
        .bind(target_id)
        .bind(is_like)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(match existing {
            Some(_) => ReactionStatus::Updated,
            None => ReactionStatus::Added,
        })
    }

    /// Remove `user_id`'s reaction. Removing a missing reaction is not an error.
    pub async fn remove_reaction(
        &self,
        user_id: &str,
        target: ReactionTarget,
        target_id: &str,
    ) -> Result<ReactionStatus, AppError> {
        sqlx::query("DELETE FROM reactions WHERE user_id = ? AND target_kind = ? AND target_id = ?")
            .bind(user_id)
            .bind(target.as_str())
            .bind(target_id)
            .execute(&self.pool)
            .await?;

        Ok(ReactionStatus::Removed)
    }

    pub async fn reaction_summary(
        &self,
        target: ReactionTarget,
        target_id: &str,
        viewer: Option<&str>,
    ) -> Result<ReactionSummary, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN is_like = 1 THEN 1 ELSE 0 END), 0) AS likes,
                COALESCE(SUM(CASE WHEN is_like = 0 THEN 1 ELSE 0 END), 0) AS dislikes,
                MAX(CASE WHEN user_id = ? THEN is_like END) AS viewer_reaction
            FROM reactions
            WHERE target_kind = ? AND target_id = ?
            "#,
        )
        .bind(viewer)
        .bind(target.as_str())
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        let viewer_reaction: Option<i64> = row.get("viewer_reaction");
        Ok(ReactionSummary::from_parts(
            row.get("likes"),
            row.get("dislikes"),
            viewer_reaction.map(|v| v != 0),
        ))
    }
}
