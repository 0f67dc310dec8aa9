//! Post models and the post listing filter.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::timestamp::{format_timestamp, parse_date, start_of_day};
use super::{Company, Question};
use crate::errors::AppError;

/// Role filter value meaning "no role filter".
pub const ALL_ROLES: &str = "All Roles";

/// A post as shown in the paginated feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub topic_id: i64,
    pub title: String,
    pub companies: Vec<Company>,
    pub leetcode_created_at: Option<String>,
    pub yoe: Option<i64>,
    pub views: i64,
    pub tags: Option<Vec<String>>,
    pub roles: Vec<String>,
    /// Number of extracted questions
    pub questions_extracted: i64,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// Full post detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub topic_id: i64,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub slug: String,
    pub tags: Option<Vec<String>>,
    pub leetcode_created_at: Option<String>,
    pub upvote: i64,
    pub downvote: i64,
    pub yoe: Option<i64>,
    pub views: i64,
    pub company_ids: Vec<i64>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub companies: Vec<Company>,
    pub roles: Vec<String>,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// Body of `GET /posts/{topic_id}/questions`.
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub post: Post,
    pub questions: Vec<Question>,
}

/// Query string of `GET /api/v1/posts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsQuery {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Normalized filter applied to the post listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub role: Option<String>,
    /// Inclusive lower bound on `leetcode_created_at`
    pub created_from: Option<String>,
    /// Exclusive upper bound on `leetcode_created_at`
    pub created_before: Option<String>,
}

impl PostFilter {
    /// Build the filter from the v1 query string.
    pub fn from_query(query: &PostsQuery) -> Result<Self, AppError> {
        let start = query
            .start_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_query_date("start_date", s))
            .transpose()?;
        let end = query
            .end_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_query_date("end_date", s))
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::BadRequest(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        let created_before = match end {
            Some(end) => Some(
                end.checked_add_days(Days::new(1))
                    .map(|next| format_timestamp(start_of_day(next)))
                    .ok_or_else(|| AppError::BadRequest("end_date out of range".to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            company_id: query.company_id,
            company_name: None,
            role: query
                .role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty() && *r != ALL_ROLES)
                .map(str::to_string),
            created_from: start.map(|d| format_timestamp(start_of_day(d))),
            created_before,
        })
    }
}

fn parse_query_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).ok_or_else(|| {
        AppError::BadRequest(format!("{} must be formatted as YYYY-MM-DD", name))
    })
}

/// A similar LeetCode problem as delivered by the extraction pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestSimilarQuestion {
    pub source: String,
    #[serde(alias = "similarity_score")]
    pub score: f64,
}

/// One extracted question in an ingest payload.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestQuestion {
    #[serde(alias = "original_question_text")]
    pub question_text: String,
    #[serde(default, alias = "refined_role")]
    pub role: Option<String>,
    #[serde(default, alias = "refined_company")]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "similar_leetcode_questions")]
    pub similar_questions: Vec<IngestSimilarQuestion>,
    #[serde(default)]
    pub mapping_status: Option<String>,
}

/// Request body for `PUT /api/v1/admin/posts`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestPostRequest {
    pub topic_id: i64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub leetcode_created_at: Option<String>,
    #[serde(default)]
    pub upvote: i64,
    #[serde(default)]
    pub downvote: i64,
    #[serde(default)]
    pub yoe: Option<i64>,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_status")]
    pub status: String,
    /// Companies mentioned in the post
    #[serde(default, alias = "companies_mentioned_in_post")]
    pub companies: Vec<String>,
    #[serde(default, alias = "questions_extracted")]
    pub questions: Vec<IngestQuestion>,
}

fn default_status() -> String {
    "processed".to_string()
}

/// Result of an ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub topic_id: i64,
    pub created: bool,
    pub questions: usize,
    pub removed_questions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_dates_are_inclusive() {
        let query = PostsQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let filter = PostFilter::from_query(&query).unwrap();
        assert_eq!(filter.created_from.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(filter.created_before.as_deref(), Some("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_filter_rejects_bad_dates() {
        let query = PostsQuery {
            start_date: Some("01/02/2024".into()),
            ..Default::default()
        };
        assert!(matches!(
            PostFilter::from_query(&query),
            Err(AppError::BadRequest(_))
        ));

        let reversed = PostsQuery {
            start_date: Some("2024-02-01".into()),
            end_date: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(PostFilter::from_query(&reversed).is_err());
    }

    #[test]
    fn test_all_roles_means_no_filter() {
        let query = PostsQuery {
            role: Some(ALL_ROLES.into()),
            ..Default::default()
        };
        assert_eq!(PostFilter::from_query(&query).unwrap().role, None);
    }

    #[test]
    fn test_ingest_accepts_pipeline_field_names() {
        let body = serde_json::json!({
            "topic_id": 7,
            "title": "Google L4 onsite",
            "companies_mentioned_in_post": ["Google"],
            "questions_extracted": [{
                "original_question_text": "LRU cache",
                "refined_role": "SDE II",
                "refined_company": "Google",
                "tags": ["design"],
                "similar_leetcode_questions": [{"source": "lru-cache", "similarity_score": 0.93}]
            }]
        });
        let req: IngestPostRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.companies, vec!["Google"]);
        assert_eq!(req.questions[0].role.as_deref(), Some("SDE II"));
        assert_eq!(req.questions[0].similar_questions[0].score, 0.93);
        assert_eq!(req.status, "processed");
    }
}
