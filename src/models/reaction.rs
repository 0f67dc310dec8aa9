//! Like/dislike reactions on posts and lists.

use serde::{Deserialize, Serialize};

/// What a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Post,
    List,
}

impl ReactionTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionTarget::Post => "post",
            ReactionTarget::List => "list",
        }
    }
}

/// Request body of the `like` routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionRequest {
    pub is_like: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReactionStatus {
    Added,
    Updated,
    Removed,
}

/// Aggregate counts plus the viewer's own reaction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionSummary {
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_liked: bool,
    pub is_disliked: bool,
}

impl ReactionSummary {
    /// Build from counts and the viewer's stored `is_like` value, if any.
    pub fn from_parts(likes: i64, dislikes: i64, viewer: Option<bool>) -> Self {
        Self {
            likes_count: likes,
            dislikes_count: dislikes,
            is_liked: viewer == Some(true),
            is_disliked: viewer == Some(false),
        }
    }
}

/// Response of the `like` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionResult {
    pub item_id: String,
    pub user_id: String,
    pub is_like: Option<bool>,
    pub status: ReactionStatus,
    #[serde(flatten)]
    pub summary: ReactionSummary,
}
