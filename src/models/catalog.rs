//! Document shapes served by the catalogue routes under `/api`.
//!
//! These mirror the processed-post and company-question documents the
//! extraction pipeline produces, so their field names mix camelCase and
//! snake_case.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::{format_timestamp, start_of_day};

/// Company filter value meaning "no company filter".
pub const ALL_COMPANIES: &str = "All Companies";
/// Label the UI shows for questions without a role.
pub const UNSPECIFIED_ROLE_LABEL: &str = "Unspecified Role (N/A)";
/// Stored role of questions without a role.
pub const UNSPECIFIED_ROLE: &str = "N/A";

/// Relative time window used by the catalogue filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    LastWeek,
    LastMonth,
    LastThreeMonths,
    LastYear,
}

impl TimePeriod {
    /// Parse a filter label. `All Time` and unknown labels mean no window.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Last Week" => Some(TimePeriod::LastWeek),
            "Last Month" => Some(TimePeriod::LastMonth),
            "Last 3 Months" => Some(TimePeriod::LastThreeMonths),
            "Last Year" => Some(TimePeriod::LastYear),
            _ => None,
        }
    }

    /// Start of the day the window opens on, relative to `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let opened = match self {
            TimePeriod::LastWeek => Some(now - Duration::weeks(1)),
            TimePeriod::LastMonth => now.checked_sub_months(Months::new(1)),
            TimePeriod::LastThreeMonths => now.checked_sub_months(Months::new(3)),
            TimePeriod::LastYear => now.checked_sub_months(Months::new(12)),
        };
        start_of_day(opened.unwrap_or(now).date_naive())
    }
}

/// Lower bound timestamp for an optional time period label.
pub fn time_period_floor(label: Option<&str>, now: DateTime<Utc>) -> Option<String> {
    label
        .and_then(TimePeriod::parse)
        .map(|period| format_timestamp(period.since(now)))
}

/// Map a role filter label to the stored role; `None` means all roles.
pub fn role_filter(label: Option<&str>) -> Option<String> {
    match label.map(str::trim) {
        None | Some("") | Some(super::ALL_ROLES) => None,
        Some(UNSPECIFIED_ROLE_LABEL) => Some(UNSPECIFIED_ROLE.to_string()),
        Some(role) => Some(role.to_string()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesQuery {
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPostsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyQuestionsQuery {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarLeetcodeQuestion {
    pub source: String,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedQuestionDocument {
    pub original_question_text: String,
    pub tags: Vec<String>,
    pub refined_role: String,
    pub refined_company: String,
    pub similar_leetcode_questions: Vec<SimilarLeetcodeQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPostDocument {
    #[serde(rename = "topicId")]
    pub topic_id: i64,
    pub title: String,
    pub slug: String,
    #[serde(rename = "leetcodeCreatedAt")]
    pub leetcode_created_at: Option<String>,
    #[serde(rename = "systemProcessedAt")]
    pub system_processed_at: String,
    pub companies_mentioned_in_post: Vec<String>,
    pub questions_extracted: Vec<ExtractedQuestionDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPostsPage {
    pub posts: Vec<ProcessedPostDocument>,
    pub total_posts: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

/// A question flattened out of its company/role group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyQuestion {
    #[serde(rename = "_instance_key")]
    pub instance_key: String,
    #[serde(rename = "topicId")]
    pub topic_id: i64,
    pub question_text: String,
    pub tags: Vec<String>,
    /// Sources of the matched LeetCode problems
    pub identifiers: Vec<String>,
    #[serde(rename = "leetcodeCreatedAt")]
    pub leetcode_created_at: Option<String>,
    #[serde(rename = "firstSeenAt")]
    pub first_seen_at: String,
    #[serde(rename = "lastSeenAt")]
    pub last_seen_at: String,
    pub role_name_context: String,
    pub company_name_context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyQuestionsPage {
    pub questions: Vec<CompanyQuestion>,
    pub total_questions: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub role_name: String,
    pub company_name: String,
}
