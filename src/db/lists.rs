//! Curated question lists.

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{parse_json_array, to_json_array, Repository};
use crate::errors::AppError;
use crate::models::timestamp::now_timestamp;
use crate::models::{
    CreateListRequest, ListQuestionAction, PageWindow, UpdateListRequest, UserList, UserProfile,
};

/// Columns of a list row as seen by a viewer bound right after this prefix.
const LIST_SELECT: &str = r#"SELECT l.id, l.user_id, l.name, l.description, l.is_public, l.tags, l.views,
       l.created_at, l.updated_at,
       (SELECT COUNT(*) FROM list_questions lq WHERE lq.list_id = l.id) AS questions_count,
       (SELECT COUNT(*) FROM reactions r
         WHERE r.target_kind = 'list' AND r.target_id = l.id AND r.is_like = 1) AS likes_count,
       (SELECT COUNT(*) FROM reactions r
         WHERE r.target_kind = 'list' AND r.target_id = l.id AND r.is_like = 0) AS dislikes_count,
       u.username, u.full_name, u.picture_url,
       (SELECT r.is_like FROM reactions r
         WHERE r.target_kind = 'list' AND r.target_id = l.id AND r.user_id = "#;

const LIST_FROM: &str = ") AS viewer_reaction FROM lists l LEFT JOIN users u ON u.id = l.user_id";

impl Repository {
    pub async fn create_list(
        &self,
        owner_id: &str,
        request: CreateListRequest,
    ) -> Result<UserList, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO lists (id, user_id, name, description, is_public, tags, views, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.is_public)
        .bind(to_json_array(&request.tags))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.list_item(&id, Some(owner_id))
            .await?
            .ok_or_else(|| AppError::Internal("List vanished after insert".to_string()))
    }

    /// A single list as seen by `viewer`, regardless of visibility.
    pub async fn list_item(&self, id: &str, viewer: Option<&str>) -> Result<Option<UserList>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(LIST_SELECT);
        qb.push_bind(viewer.map(str::to_string));
        qb.push(LIST_FROM);
        qb.push(" WHERE l.id = ");
        qb.push_bind(id.to_string());

        let row = qb.build().fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(list_from_row))
    }

    /// Lists owned by `owner_id`, most recently updated first.
    pub async fn list_my_lists(
        &self,
        owner_id: &str,
        name_filter: Option<&str>,
        window: PageWindow,
    ) -> Result<(Vec<UserList>, i64), AppError> {
        self.query_lists(ListScope::OwnedBy(owner_id), name_filter, window, Some(owner_id))
            .await
    }

    /// Public lists of every user, most recently updated first.
    pub async fn list_public_lists(
        &self,
        name_filter: Option<&str>,
        window: PageWindow,
        viewer: Option<&str>,
    ) -> Result<(Vec<UserList>, i64), AppError> {
        self.query_lists(ListScope::Public, name_filter, window, viewer)
            .await
    }

    async fn query_lists(
        &self,
        scope: ListScope<'_>,
        name_filter: Option<&str>,
        window: PageWindow,
        viewer: Option<&str>,
    ) -> Result<(Vec<UserList>, i64), AppError> {
        let pattern = name_filter
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(&q.to_lowercase())));

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM lists l");
        push_list_filter(&mut count, scope, pattern.as_deref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Sqlite>::new(LIST_SELECT);
        page.push_bind(viewer.map(str::to_string));
        page.push(LIST_FROM);
        push_list_filter(&mut page, scope, pattern.as_deref());
        page.push(" ORDER BY l.updated_at DESC, l.id LIMIT ");
        page.push_bind(window.limit);
        page.push(" OFFSET ");
        page.push_bind(window.skip);
        let rows = page.build().fetch_all(&self.pool).await?;

        Ok((rows.iter().map(list_from_row).collect(), total))
    }

    /// Update a list owned by `owner_id`.
    pub async fn update_list(
        &self,
        owner_id: &str,
        id: &str,
        request: UpdateListRequest,
    ) -> Result<UserList, AppError> {
        self.ensure_list_owner(owner_id, id).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE lists SET updated_at = ");
        qb.push_bind(now_timestamp());
        if let Some(name) = request.name {
            qb.push(", name = ");
            qb.push_bind(name);
        }
        if let Some(description) = request.description {
            qb.push(", description = ");
            qb.push_bind(description);
        }
        if let Some(is_public) = request.is_public {
            qb.push(", is_public = ");
            qb.push_bind(is_public);
        }
        if let Some(tags) = request.tags {
            qb.push(", tags = ");
            qb.push_bind(to_json_array(&tags));
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());
        qb.build().execute(&self.pool).await?;

        self.list_item(id, Some(owner_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("List '{}' not found", id)))
    }

    /// Delete a list owned by `owner_id` together with its entries.
    pub async fn delete_list(&self, owner_id: &str, id: &str) -> Result<(), AppError> {
        self.ensure_list_owner(owner_id, id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reactions WHERE target_kind = 'list' AND target_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn increment_list_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE lists SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Question ids of a list in the order they were added.
    pub async fn list_question_ids(&self, list_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar(
            "SELECT question_id FROM list_questions WHERE list_id = ? ORDER BY added_at, question_id",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Add or remove a question from a list owned by `owner_id`.
    ///
    /// Both actions are idempotent. Returns the resulting question count.
    pub async fn toggle_list_question(
        &self,
        owner_id: &str,
        list_id: &str,
        question_id: &str,
        action: ListQuestionAction,
    ) -> Result<i64, AppError> {
        self.ensure_list_owner(owner_id, list_id).await?;
        if !self.question_exists(question_id).await? {
            return Err(AppError::NotFound(format!(
                "Question '{}' not found",
                question_id
            )));
        }

        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let changed = match action {
            ListQuestionAction::Add => sqlx::query(
                "INSERT OR IGNORE INTO list_questions (list_id, question_id, added_at) VALUES (?, ?, ?)",
            )
            .bind(list_id)
            .bind(question_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ListQuestionAction::Remove => {
                sqlx::query("DELETE FROM list_questions WHERE list_id = ? AND question_id = ?")
                    .bind(list_id)
                    .bind(question_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
        };

        if changed > 0 {
            sqlx::query("UPDATE lists SET updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(list_id)
                .execute(&mut *tx)
                .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM list_questions WHERE list_id = ?")
            .bind(list_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(count)
    }

    /// 404 when the list is missing, 403 when someone else owns it.
    async fn ensure_list_owner(&self, owner_id: &str, list_id: &str) -> Result<(), AppError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user_id FROM lists WHERE id = ?")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            None => Err(AppError::NotFound(format!("List '{}' not found", list_id))),
            Some(owner) if owner != owner_id => Err(AppError::Forbidden(
                "Only the owner can modify this list".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }
}

#[derive(Clone, Copy)]
enum ListScope<'a> {
    OwnedBy(&'a str),
    Public,
}

fn push_list_filter(qb: &mut QueryBuilder<'_, Sqlite>, scope: ListScope<'_>, pattern: Option<&str>) {
    match scope {
        ListScope::OwnedBy(owner_id) => {
            qb.push(" WHERE l.user_id = ");
            qb.push_bind(owner_id.to_string());
        }
        ListScope::Public => {
            qb.push(" WHERE l.is_public = 1");
        }
    }
    if let Some(pattern) = pattern {
        qb.push(" AND LOWER(l.name) LIKE ");
        qb.push_bind(pattern.to_string());
        qb.push(" ESCAPE '\\'");
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn list_from_row(row: &SqliteRow) -> UserList {
    let user_id: String = row.get("user_id");
    let username: Option<String> = row.get("username");
    let tags: Option<String> = row.get("tags");
    let viewer_reaction: Option<i64> = row.get("viewer_reaction");
    let picture_url: Option<String> = row.get("picture_url");
    let full_name: Option<String> = row.get("full_name");

    let user = username.map(|username| UserProfile {
        id: user_id.clone(),
        username,
        picture_url: picture_url.unwrap_or_default(),
        full_name: full_name.unwrap_or_default(),
    });

    UserList {
        id: row.get("id"),
        user_id,
        name: row.get("name"),
        description: row.get("description"),
        is_public: row.get("is_public"),
        tags: tags.map(|s| parse_json_array(&s)).unwrap_or_default(),
        views: row.get("views"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        questions_count: row.get("questions_count"),
        likes_count: row.get("likes_count"),
        dislikes_count: row.get("dislikes_count"),
        is_liked: viewer_reaction.map(|v| v != 0),
        user,
    }
}
