//! User feedback model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Bug,
    FeatureRequest,
    Feedback,
    Others,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Bug => "bug",
            FeedbackKind::FeatureRequest => "feature_request",
            FeedbackKind::Feedback => "feedback",
            FeedbackKind::Others => "others",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bug" => Some(FeedbackKind::Bug),
            "feature_request" => Some(FeedbackKind::FeatureRequest),
            "feedback" => Some(FeedbackKind::Feedback),
            "others" => Some(FeedbackKind::Others),
            _ => None,
        }
    }
}

/// Request body for `POST /api/v1/feedback`.
///
/// `type` is kept as a string so an unknown value yields a validation error
/// rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedbackRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Validated feedback ready to store.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub kind: FeedbackKind,
    pub title: String,
    pub description: String,
}

impl CreateFeedbackRequest {
    pub fn validated(self) -> Result<NewFeedback, AppError> {
        let kind = FeedbackKind::parse(self.kind.trim())
            .ok_or_else(|| AppError::Validation("Select type".to_string()))?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Please enter title".to_string()));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Please enter description".to_string(),
            ));
        }
        Ok(NewFeedback {
            kind,
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}

/// Stored feedback entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreated {
    pub id: String,
    pub message: String,
}
