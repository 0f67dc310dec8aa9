//! Curated question list models.

use serde::{Deserialize, Serialize};

use super::{Question, UserProfile};
use crate::errors::AppError;

pub const MAX_LIST_NAME_LEN: usize = 100;
pub const MAX_LIST_DESCRIPTION_LEN: usize = 2000;
pub const MAX_LIST_TAGS: usize = 20;

/// A list as shown in "my lists" and "public lists".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    pub questions_count: i64,
    pub likes_count: i64,
    pub dislikes_count: i64,
    /// `None` when the viewer has not reacted
    pub is_liked: Option<bool>,
    pub user: Option<UserProfile>,
}

/// A list together with its questions.
#[derive(Debug, Clone, Serialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: UserList,
    pub questions: Vec<Question>,
}

/// Query string of the list index routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListsQuery {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Case-insensitive name filter
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for creating a list.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateListRequest {
    /// Trim fields and check limits.
    pub fn validated(self) -> Result<Self, AppError> {
        let name = validate_name(&self.name)?;
        let description = validate_description(&self.description)?;
        let tags = validate_tags(&self.tags)?;
        Ok(Self {
            name,
            description,
            is_public: self.is_public,
            tags,
        })
    }
}

/// Request body for updating a list. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateListRequest {
    pub fn validated(self) -> Result<Self, AppError> {
        Ok(Self {
            name: self.name.as_deref().map(validate_name).transpose()?,
            description: self
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
            is_public: self.is_public,
            tags: self.tags.as_deref().map(validate_tags).transpose()?,
        })
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("List name is required".to_string()));
    }
    if name.chars().count() > MAX_LIST_NAME_LEN {
        return Err(AppError::Validation(format!(
            "List name must be at most {} characters",
            MAX_LIST_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> Result<String, AppError> {
    let description = description.trim();
    if description.chars().count() > MAX_LIST_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "List description must be at most {} characters",
            MAX_LIST_DESCRIPTION_LEN
        )));
    }
    Ok(description.to_string())
}

fn validate_tags(tags: &[String]) -> Result<Vec<String>, AppError> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.iter().any(|existing| existing == tag) {
            cleaned.push(tag.to_string());
        }
    }
    if cleaned.len() > MAX_LIST_TAGS {
        return Err(AppError::Validation(format!(
            "A list can have at most {} tags",
            MAX_LIST_TAGS
        )));
    }
    Ok(cleaned)
}

/// What to do with a question in a list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListQuestionAction {
    #[default]
    Add,
    Remove,
}

/// Optional body of `POST /lists/{list_id}/questions/{question_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuestionRequest {
    #[serde(default)]
    pub action: ListQuestionAction,
}

/// Result of adding or removing a list question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuestionResponse {
    pub message: String,
    pub list_id: String,
    pub question_id: String,
    pub action_performed: ListQuestionAction,
    pub questions_count: i64,
}
