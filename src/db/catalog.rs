//! Read side: companies, posts and questions.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{parse_json_array, push_in_list, Repository};
use crate::errors::AppError;
use crate::models::{
    Company, CompanyQuestion, ExtractedQuestionDocument, PageWindow, Post, PostFilter,
    PostSummary, ProcessedPostDocument, Question, ReactionSummary, SimilarLeetcodeQuestion,
    SimilarQuestion, UNKNOWN_COMPANY, UNSPECIFIED_ROLE,
};

const QUESTION_SELECT: &str = r#"SELECT q.id, q.topic_id, q.question_text, q.role, q.company_id,
       c.name AS company_name, q.tags, q.created_at, q.updated_at,
       (SELECT qs.is_done FROM question_status qs
         WHERE qs.question_id = q.id AND qs.user_id = "#;

const QUESTION_FROM: &str = ") AS is_done FROM questions q LEFT JOIN companies c ON c.id = q.company_id";

/// Reaction counters for a post, correlated on `p.topic_id`.
const POST_REACTION_COLUMNS: &str = r#"
       (SELECT COUNT(*) FROM reactions r
         WHERE r.target_kind = 'post' AND r.target_id = CAST(p.topic_id AS TEXT) AND r.is_like = 1) AS likes_count,
       (SELECT COUNT(*) FROM reactions r
         WHERE r.target_kind = 'post' AND r.target_id = CAST(p.topic_id AS TEXT) AND r.is_like = 0) AS dislikes_count,
       (SELECT r.is_like FROM reactions r
         WHERE r.target_kind = 'post' AND r.target_id = CAST(p.topic_id AS TEXT) AND r.user_id = "#;

impl Repository {
    // ==================== COMPANIES ====================

    /// List companies that have at least one post, by name.
    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.name FROM companies c
               WHERE EXISTS (SELECT 1 FROM post_companies pc WHERE pc.company_id = c.id)
               ORDER BY c.name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Company {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    pub async fn get_company(&self, id: i64) -> Result<Option<Company>, AppError> {
        let row = sqlx::query("SELECT id, name FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Company {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    /// Distinct non-empty roles of a company's questions, sorted.
    pub async fn roles_for_company(&self, company_id: i64) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            r#"SELECT DISTINCT role FROM questions
               WHERE company_id = ? AND role IS NOT NULL AND TRIM(role) <> ''
               ORDER BY role"#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("role")).collect())
    }

    /// Distinct names of companies that have questions, excluding `N/A`.
    pub async fn question_company_names(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            r#"SELECT DISTINCT c.name FROM companies c
               JOIN questions q ON q.company_id = c.id
               WHERE c.name <> ?
               ORDER BY c.name"#,
        )
        .bind(UNKNOWN_COMPANY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    /// Distinct roles of the questions of a company looked up by name.
    pub async fn roles_for_company_name(&self, company: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            r#"SELECT DISTINCT COALESCE(NULLIF(TRIM(q.role), ''), ?) AS role FROM questions q
               JOIN companies c ON c.id = q.company_id
               WHERE c.name = ?
               ORDER BY role"#,
        )
        .bind(UNSPECIFIED_ROLE)
        .bind(company)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("role")).collect())
    }

    // ==================== POSTS ====================

    pub async fn post_exists(&self, topic_id: i64) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT topic_id FROM posts WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Page through posts that have extracted questions, newest first.
    ///
    /// Returns the topic ids of the page and the total number of matches.
    pub async fn filter_posts(
        &self,
        filter: &PostFilter,
        window: PageWindow,
    ) -> Result<(Vec<i64>, i64), AppError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_post_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Sqlite>::new("SELECT p.topic_id FROM posts p");
        push_post_filter(&mut page, filter);
        page.push(" ORDER BY p.leetcode_created_at DESC, p.topic_id DESC LIMIT ");
        page.push_bind(window.limit);
        page.push(" OFFSET ");
        page.push_bind(window.skip);
        let ids: Vec<i64> = page.build_query_scalar().fetch_all(&self.pool).await?;

        Ok((ids, total))
    }

    /// Load feed entries for the given posts, keeping the order of `topic_ids`.
    pub async fn post_summaries(
        &self,
        topic_ids: &[i64],
        viewer: Option<&str>,
    ) -> Result<Vec<PostSummary>, AppError> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT p.topic_id, p.title, p.leetcode_created_at, p.yoe, p.views, p.tags,
               (SELECT COUNT(*) FROM questions q WHERE q.topic_id = p.topic_id) AS questions_extracted,"#,
        );
        qb.push(POST_REACTION_COLUMNS);
        qb.push_bind(viewer.map(str::to_string));
        qb.push(") AS viewer_reaction FROM posts p WHERE p.topic_id IN ");
        push_in_list(&mut qb, topic_ids);
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut companies = self.companies_by_post(topic_ids).await?;
        let mut roles = self.roles_by_post(topic_ids).await?;

        let mut by_id: HashMap<i64, PostSummary> = rows
            .iter()
            .map(|row| {
                let topic_id: i64 = row.get("topic_id");
                let tags: Option<String> = row.get("tags");
                let summary = reaction_summary_from_row(row);
                let item = PostSummary {
                    topic_id,
                    title: row.get("title"),
                    companies: companies.remove(&topic_id).unwrap_or_default(),
                    leetcode_created_at: row.get("leetcode_created_at"),
                    yoe: row.get("yoe"),
                    views: row.get("views"),
                    tags: tags.map(|s| parse_json_array(&s)),
                    roles: roles.remove(&topic_id).unwrap_or_default(),
                    questions_extracted: row.get("questions_extracted"),
                    likes_count: summary.likes_count,
                    dislikes_count: summary.dislikes_count,
                    is_liked: summary.is_liked,
                    is_disliked: summary.is_disliked,
                };
                (topic_id, item)
            })
            .collect();

        Ok(topic_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Full post detail as seen by `viewer`.
    pub async fn get_post(&self, topic_id: i64, viewer: Option<&str>) -> Result<Option<Post>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT p.topic_id, p.title, p.author, p.content, p.slug, p.tags, p.leetcode_created_at,
               p.upvote, p.downvote, p.yoe, p.views, p.status, p.created_at, p.updated_at,"#,
        );
        qb.push(POST_REACTION_COLUMNS);
        qb.push_bind(viewer.map(str::to_string));
        qb.push(") AS viewer_reaction FROM posts p WHERE p.topic_id = ");
        qb.push_bind(topic_id);

        let Some(row) = qb.build().fetch_optional(&self.pool).await? else {
            return Ok(None);
        };

        let companies = self
            .companies_by_post(&[topic_id])
            .await?
            .remove(&topic_id)
            .unwrap_or_default();
        let roles = self
            .roles_by_post(&[topic_id])
            .await?
            .remove(&topic_id)
            .unwrap_or_default();
        let tags: Option<String> = row.get("tags");
        let summary = reaction_summary_from_row(&row);

        Ok(Some(Post {
            topic_id,
            title: row.get("title"),
            author: row.get("author"),
            content: row.get("content"),
            slug: row.get("slug"),
            tags: tags.map(|s| parse_json_array(&s)),
            leetcode_created_at: row.get("leetcode_created_at"),
            upvote: row.get("upvote"),
            downvote: row.get("downvote"),
            yoe: row.get("yoe"),
            views: row.get("views"),
            company_ids: companies.iter().map(|c| c.id).collect(),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            companies,
            roles,
            likes_count: summary.likes_count,
            dislikes_count: summary.dislikes_count,
            is_liked: summary.is_liked,
            is_disliked: summary.is_disliked,
        }))
    }

    async fn companies_by_post(&self, topic_ids: &[i64]) -> Result<HashMap<i64, Vec<Company>>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT pc.topic_id, c.id, c.name FROM post_companies pc
               JOIN companies c ON c.id = pc.company_id
               WHERE pc.topic_id IN "#,
        );
        push_in_list(&mut qb, topic_ids);
        qb.push(" ORDER BY c.name");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<Company>> = HashMap::new();
        for row in rows {
            grouped.entry(row.get("topic_id")).or_default().push(Company {
                id: row.get("id"),
                name: row.get("name"),
            });
        }
        Ok(grouped)
    }

    async fn roles_by_post(&self, topic_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT DISTINCT topic_id, role FROM questions
               WHERE role IS NOT NULL AND TRIM(role) <> '' AND topic_id IN "#,
        );
        push_in_list(&mut qb, topic_ids);
        qb.push(" ORDER BY role");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            grouped.entry(row.get("topic_id")).or_default().push(row.get("role"));
        }
        Ok(grouped)
    }

    // ==================== QUESTIONS ====================

    pub async fn question_exists(&self, question_id: &str) -> Result<bool, AppError> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM questions WHERE id = ?")
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Questions of a post in extraction order.
    pub async fn questions_for_post(
        &self,
        topic_id: i64,
        viewer: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(QUESTION_SELECT);
        qb.push_bind(viewer.map(str::to_string));
        qb.push(QUESTION_FROM);
        qb.push(" WHERE q.topic_id = ");
        qb.push_bind(topic_id);
        qb.push(" ORDER BY q.position");
        let rows = qb.build().fetch_all(&self.pool).await?;

        self.hydrate_questions(rows, viewer).await
    }

    /// Questions by id, keeping the order of `ids` and skipping unknown ids.
    pub async fn questions_by_ids(
        &self,
        ids: &[String],
        viewer: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(QUESTION_SELECT);
        qb.push_bind(viewer.map(str::to_string));
        qb.push(QUESTION_FROM);
        qb.push(" WHERE q.id IN ");
        push_in_list(&mut qb, ids);
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut by_id: HashMap<String, Question> = self
            .hydrate_questions(rows, viewer)
            .await?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn hydrate_questions(
        &self,
        rows: Vec<SqliteRow>,
        viewer: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        let ids: Vec<String> = rows.iter().map(|row| row.get("id")).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut similar = self.similar_by_question(&ids).await?;
        let mut saved = match viewer {
            Some(user_id) => self.viewer_list_memberships(user_id, &ids).await?,
            None => HashMap::new(),
        };

        Ok(rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let company_id: Option<i64> = row.get("company_id");
                let company_name: Option<String> = row.get("company_name");
                let tags: Option<String> = row.get("tags");
                let is_done: Option<i64> = row.get("is_done");
                let companies = match (company_id, company_name) {
                    (Some(id), Some(name)) => vec![Company { id, name }],
                    _ => Vec::new(),
                };
                Question {
                    topic_id: row.get("topic_id"),
                    question_text: row.get("question_text"),
                    role: row.get("role"),
                    company_id,
                    tags: tags.map(|s| parse_json_array(&s)),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                    similar_questions: similar.remove(&id).unwrap_or_default(),
                    companies,
                    is_done: is_done.unwrap_or(0) != 0,
                    saved_in_lists: saved.remove(&id).unwrap_or_default(),
                    id,
                }
            })
            .collect())
    }

    async fn similar_by_question(
        &self,
        question_ids: &[String],
    ) -> Result<HashMap<String, Vec<SimilarQuestion>>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, question_id, source, score FROM similar_questions WHERE question_id IN ",
        );
        push_in_list(&mut qb, question_ids);
        qb.push(" ORDER BY score DESC, source");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<String, Vec<SimilarQuestion>> = HashMap::new();
        for row in rows {
            let question_id: String = row.get("question_id");
            grouped.entry(question_id.clone()).or_default().push(SimilarQuestion {
                id: row.get("id"),
                question_id,
                source: row.get("source"),
                score: row.get("score"),
            });
        }
        Ok(grouped)
    }

    /// For each question, the ids of `user_id`'s lists that contain it.
    async fn viewer_list_memberships(
        &self,
        user_id: &str,
        question_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT lq.question_id, lq.list_id FROM list_questions lq
               JOIN lists l ON l.id = lq.list_id
               WHERE l.user_id = "#,
        );
        qb.push_bind(user_id.to_string());
        qb.push(" AND lq.question_id IN ");
        push_in_list(&mut qb, question_ids);
        qb.push(" ORDER BY lq.added_at");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.get("question_id"))
                .or_default()
                .push(row.get("list_id"));
        }
        Ok(grouped)
    }

    // ==================== CATALOGUE DOCUMENTS ====================

    /// Page through questions of one company, most recently seen first.
    pub async fn company_questions(
        &self,
        company: &str,
        role: Option<&str>,
        created_from: Option<&str>,
        window: PageWindow,
    ) -> Result<(Vec<CompanyQuestion>, i64), AppError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        push_company_question_filter(&mut count, company, role, created_from);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Sqlite>::new(
            r#"SELECT q.id, q.topic_id, q.question_text, q.tags, q.role, c.name AS company_name,
               p.leetcode_created_at, q.first_seen_at, q.last_seen_at"#,
        );
        push_company_question_filter(&mut page, company, role, created_from);
        page.push(" ORDER BY q.last_seen_at DESC, q.id LIMIT ");
        page.push_bind(window.limit);
        page.push(" OFFSET ");
        page.push_bind(window.skip);
        let rows = page.build().fetch_all(&self.pool).await?;

        let ids: Vec<String> = rows.iter().map(|row| row.get("id")).collect();
        let mut similar = if ids.is_empty() {
            HashMap::new()
        } else {
            self.similar_by_question(&ids).await?
        };

        let questions = rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let tags: Option<String> = row.get("tags");
                let role: Option<String> = row.get("role");
                CompanyQuestion {
                    identifiers: similar
                        .remove(&id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|s| s.source)
                        .collect(),
                    instance_key: id,
                    topic_id: row.get("topic_id"),
                    question_text: row.get("question_text"),
                    tags: tags.map(|s| parse_json_array(&s)).unwrap_or_default(),
                    leetcode_created_at: row.get("leetcode_created_at"),
                    first_seen_at: row.get("first_seen_at"),
                    last_seen_at: row.get("last_seen_at"),
                    role_name_context: role.unwrap_or_else(|| UNSPECIFIED_ROLE.to_string()),
                    company_name_context: row.get("company_name"),
                }
            })
            .collect();

        Ok((questions, total))
    }

    /// Processed-post documents for the given posts, keeping the order of `topic_ids`.
    pub async fn processed_post_documents(
        &self,
        topic_ids: &[i64],
    ) -> Result<Vec<ProcessedPostDocument>, AppError> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT topic_id, title, slug, leetcode_created_at, updated_at FROM posts WHERE topic_id IN ",
        );
        push_in_list(&mut qb, topic_ids);
        let post_rows = qb.build().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT q.id, q.topic_id, q.question_text, q.tags, q.role, q.mapping_status,
               c.name AS company_name
               FROM questions q LEFT JOIN companies c ON c.id = q.company_id
               WHERE q.topic_id IN "#,
        );
        push_in_list(&mut qb, topic_ids);
        qb.push(" ORDER BY q.topic_id, q.position");
        let question_rows = qb.build().fetch_all(&self.pool).await?;

        let question_ids: Vec<String> = question_rows.iter().map(|row| row.get("id")).collect();
        let mut similar = if question_ids.is_empty() {
            HashMap::new()
        } else {
            self.similar_by_question(&question_ids).await?
        };

        let mut questions: HashMap<i64, Vec<ExtractedQuestionDocument>> = HashMap::new();
        for row in &question_rows {
            let id: String = row.get("id");
            let tags: Option<String> = row.get("tags");
            let role: Option<String> = row.get("role");
            let company: Option<String> = row.get("company_name");
            questions
                .entry(row.get("topic_id"))
                .or_default()
                .push(ExtractedQuestionDocument {
                    original_question_text: row.get("question_text"),
                    tags: tags.map(|s| parse_json_array(&s)).unwrap_or_default(),
                    refined_role: role.unwrap_or_else(|| UNSPECIFIED_ROLE.to_string()),
                    refined_company: company.unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
                    similar_leetcode_questions: similar
                        .remove(&id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|s| SimilarLeetcodeQuestion {
                            source: s.source,
                            similarity_score: s.score,
                        })
                        .collect(),
                    mapping_status: row.get("mapping_status"),
                });
        }

        let mut companies = self.companies_by_post(topic_ids).await?;

        let mut by_id: HashMap<i64, ProcessedPostDocument> = post_rows
            .iter()
            .map(|row| {
                let topic_id: i64 = row.get("topic_id");
                let doc = ProcessedPostDocument {
                    topic_id,
                    title: row.get("title"),
                    slug: row.get("slug"),
                    leetcode_created_at: row.get("leetcode_created_at"),
                    system_processed_at: row.get("updated_at"),
                    companies_mentioned_in_post: companies
                        .remove(&topic_id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|c| c.name)
                        .collect(),
                    questions_extracted: questions.remove(&topic_id).unwrap_or_default(),
                };
                (topic_id, doc)
            })
            .collect();

        Ok(topic_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

/// Append the post filter, starting with `WHERE`.
///
/// Only posts with at least one extracted question are listed.
fn push_post_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    qb.push(" WHERE EXISTS (SELECT 1 FROM questions q WHERE q.topic_id = p.topic_id)");

    if let Some(company_id) = filter.company_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM post_companies pc WHERE pc.topic_id = p.topic_id AND pc.company_id = ",
        );
        qb.push_bind(company_id);
        qb.push(")");
    }
    if let Some(name) = &filter.company_name {
        qb.push(
            r#" AND EXISTS (SELECT 1 FROM post_companies pc JOIN companies c ON c.id = pc.company_id
                WHERE pc.topic_id = p.topic_id AND c.name = "#,
        );
        qb.push_bind(name.clone());
        qb.push(")");
    }
    if let Some(role) = &filter.role {
        qb.push(" AND EXISTS (SELECT 1 FROM questions q WHERE q.topic_id = p.topic_id AND q.role = ");
        qb.push_bind(role.clone());
        qb.push(")");
    }
    if let Some(from) = &filter.created_from {
        qb.push(" AND p.leetcode_created_at >= ");
        qb.push_bind(from.clone());
    }
    if let Some(before) = &filter.created_before {
        qb.push(" AND p.leetcode_created_at < ");
        qb.push_bind(before.clone());
    }
}

fn push_company_question_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    company: &str,
    role: Option<&str>,
    created_from: Option<&str>,
) {
    qb.push(
        r#" FROM questions q
           JOIN companies c ON c.id = q.company_id
           JOIN posts p ON p.topic_id = q.topic_id
           WHERE c.name = "#,
    );
    qb.push_bind(company.to_string());
    match role {
        Some(UNSPECIFIED_ROLE) => {
            qb.push(" AND (q.role IS NULL OR TRIM(q.role) = '' OR q.role = ");
            qb.push_bind(UNSPECIFIED_ROLE);
            qb.push(")");
        }
        Some(role) => {
            qb.push(" AND q.role = ");
            qb.push_bind(role.to_string());
        }
        None => {}
    }
    if let Some(from) = created_from {
        qb.push(" AND p.leetcode_created_at >= ");
        qb.push_bind(from.to_string());
    }
}

fn reaction_summary_from_row(row: &SqliteRow) -> ReactionSummary {
    let viewer: Option<i64> = row.get("viewer_reaction");
    ReactionSummary::from_parts(
        row.get("likes_count"),
        row.get("dislikes_count"),
        viewer.map(|v| v != 0),
    )
}
