//! Ingest of processed posts and the documents fed to the search index.

use std::collections::{BTreeSet, HashSet};

use sqlx::{Row, Sqlite, Transaction};

use super::{parse_json_array, to_json_array, Repository};
use crate::errors::AppError;
use crate::models::timestamp::{format_timestamp, now_timestamp, parse_timestamp};
use crate::models::{
    normalize_company_name, question_id_for, IngestOutcome, IngestPostRequest,
};

/// Flattened view of a question for the search index.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSearchDoc {
    pub question_id: String,
    pub topic_id: i64,
    pub text: String,
    pub tags: Vec<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub title: String,
}

const SEARCH_DOC_SELECT: &str = r#"SELECT q.id, q.topic_id, q.question_text, q.tags, q.role,
       c.name AS company_name, p.title
       FROM questions q
       JOIN posts p ON p.topic_id = q.topic_id
       LEFT JOIN companies c ON c.id = q.company_id"#;

impl Repository {
    /// Create or replace a post and its extracted questions.
    ///
    /// Questions keep their id (and therefore list entries and done flags)
    /// across re-ingests as long as their text is unchanged. Questions no
    /// longer present are deleted.
    pub async fn ingest_post(&self, request: &IngestPostRequest) -> Result<IngestOutcome, AppError> {
        if request.topic_id <= 0 {
            return Err(AppError::Validation("topic_id must be positive".to_string()));
        }
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        let created_at_source = match request.leetcode_created_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(format_timestamp(parse_timestamp(raw).ok_or_else(|| {
                AppError::Validation(format!("leetcode_created_at '{}' is not a valid timestamp", raw))
            })?)),
        };

        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT topic_id FROM posts WHERE topic_id = ?")
            .bind(request.topic_id)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO posts (topic_id, title, slug, author, content, tags, leetcode_created_at,
                               upvote, downvote, yoe, views, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(topic_id) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                author = excluded.author,
                content = excluded.content,
                tags = excluded.tags,
                leetcode_created_at = excluded.leetcode_created_at,
                upvote = excluded.upvote,
                downvote = excluded.downvote,
                yoe = excluded.yoe,
                views = excluded.views,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(request.topic_id)
        .bind(title)
        .bind(&request.slug)
        .bind(&request.author)
        .bind(&request.content)
        .bind(request.tags.as_deref().map(to_json_array))
        .bind(&created_at_source)
        .bind(request.upvote)
        .bind(request.downvote)
        .bind(request.yoe)
        .bind(request.views)
        .bind(&request.status)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        // Companies of the post are the ones it mentions plus those of its questions
        let mut company_names: BTreeSet<String> = request
            .companies
            .iter()
            .filter_map(|name| normalize_company_name(name))
            .collect();
        company_names.extend(
            request
                .questions
                .iter()
                .filter_map(|q| q.company.as_deref().and_then(normalize_company_name)),
        );

        sqlx::query("DELETE FROM post_companies WHERE topic_id = ?")
            .bind(request.topic_id)
            .execute(&mut *tx)
            .await?;
        for name in &company_names {
            let company_id = resolve_company(&mut tx, name).await?;
            sqlx::query("INSERT OR IGNORE INTO post_companies (topic_id, company_id) VALUES (?, ?)")
                .bind(request.topic_id)
                .bind(company_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut kept: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for question in &request.questions {
            let text = question.question_text.trim();
            if text.is_empty() {
                continue;
            }
            let id = question_id_for(request.topic_id, text);
            if !seen.insert(id.clone()) {
                continue;
            }

            let company_id = match question.company.as_deref().and_then(normalize_company_name) {
                Some(name) => Some(resolve_company(&mut tx, &name).await?),
                None => None,
            };
            let role = question
                .role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty());

            sqlx::query(
                r#"
                INSERT INTO questions (id, topic_id, position, question_text, role, company_id, tags,
                                       mapping_status, first_seen_at, last_seen_at, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    position = excluded.position,
                    question_text = excluded.question_text,
                    role = excluded.role,
                    company_id = excluded.company_id,
                    tags = excluded.tags,
                    mapping_status = excluded.mapping_status,
                    last_seen_at = excluded.last_seen_at,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&id)
            .bind(request.topic_id)
            .bind(kept.len() as i64)
            .bind(text)
            .bind(role)
            .bind(company_id)
            .bind(to_json_array(&question.tags))
            .bind(&question.mapping_status)
            .bind(&now)
            .bind(&now)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM similar_questions WHERE question_id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            for similar in &question.similar_questions {
                sqlx::query(
                    "INSERT INTO similar_questions (id, question_id, source, score) VALUES (?, ?, ?, ?)",
                )
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(&id)
                .bind(similar.source.trim())
                .bind(similar.score)
                .execute(&mut *tx)
                .await?;
            }

            kept.push(id);
        }

        let stale: Vec<String> = sqlx::query_scalar("SELECT id FROM questions WHERE topic_id = ?")
            .bind(request.topic_id)
            .fetch_all(&mut *tx)
            .await?;
        let mut removed_questions = 0;
        for id in stale.iter().filter(|id| !seen.contains(*id)) {
            removed_questions += sqlx::query("DELETE FROM questions WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            topic_id = request.topic_id,
            questions = kept.len(),
            removed_questions,
            "Ingested post"
        );

        Ok(IngestOutcome {
            topic_id: request.topic_id,
            created: existing.is_none(),
            questions: kept.len(),
            removed_questions,
        })
    }

    /// Every question, for a full index rebuild.
    pub async fn all_search_documents(&self) -> Result<Vec<QuestionSearchDoc>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY q.topic_id, q.position", SEARCH_DOC_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(search_doc_from_row).collect())
    }

    pub async fn search_documents_for_post(&self, topic_id: i64) -> Result<Vec<QuestionSearchDoc>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE q.topic_id = ? ORDER BY q.position",
            SEARCH_DOC_SELECT
        ))
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(search_doc_from_row).collect())
    }
}

/// Look up a company by name, creating it when missing.
async fn resolve_company(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64, AppError> {
    sqlx::query("INSERT OR IGNORE INTO companies (name) VALUES (?)")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    let id: i64 = sqlx::query_scalar("SELECT id FROM companies WHERE name = ?")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

fn search_doc_from_row(row: &sqlx::sqlite::SqliteRow) -> QuestionSearchDoc {
    let tags: Option<String> = row.get("tags");
    QuestionSearchDoc {
        question_id: row.get("id"),
        topic_id: row.get("topic_id"),
        text: row.get("question_text"),
        tags: tags.map(|s| parse_json_array(&s)).unwrap_or_default(),
        company: row.get("company_name"),
        role: row.get("role"),
        title: row.get("title"),
    }
}
