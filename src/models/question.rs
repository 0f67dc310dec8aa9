//! Extracted question models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Company;

/// Namespace for deterministic question ids.
const QUESTION_NAMESPACE: Uuid = Uuid::from_u128(0x6c5e_2f0a_9d41_4b7e_8a13_52c0_d4e9_7f21);

/// A LeetCode problem the extraction pipeline matched to a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarQuestion {
    pub id: String,
    pub question_id: String,
    pub source: String,
    pub score: f64,
}

/// An interview question extracted from a post, as seen by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub topic_id: i64,
    pub question_text: String,
    pub role: Option<String>,
    pub company_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
    pub similar_questions: Vec<SimilarQuestion>,
    pub companies: Vec<Company>,
    /// Whether the viewer marked this question as done
    pub is_done: bool,
    /// The viewer's lists that contain this question
    pub saved_in_lists: Vec<String>,
}

/// Request body for `PUT /users/me/question-status/{question_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionStatusRequest {
    pub is_done: bool,
}

/// Done flag of a question for the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionStatus {
    pub question_id: String,
    pub is_done: bool,
}

/// Derive the stable id of a question from its post and text.
///
/// Whitespace and case are normalized so re-extraction of the same text maps
/// to the same id.
pub fn question_id_for(topic_id: i64, question_text: &str) -> String {
    let normalized = question_text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let name = format!("{}:{}", topic_id, normalized);
    Uuid::new_v5(&QUESTION_NAMESPACE, name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_is_stable() {
        let a = question_id_for(42, "Design a rate limiter");
        let b = question_id_for(42, "  design   a rate\nLIMITER ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_question_id_depends_on_topic() {
        assert_ne!(
            question_id_for(1, "Two sum"),
            question_id_for(2, "Two sum")
        );
    }
}
