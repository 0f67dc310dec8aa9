//! User models.

use serde::{Deserialize, Serialize};

/// A signed-in user, keyed by the Google `sub` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub username: String,
    pub full_name: String,
    pub picture_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Public profile shown next to lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub picture_url: String,
    pub full_name: String,
}

/// Identity asserted by a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl Identity {
    /// Username derived from the email local part, falling back to the subject.
    pub fn username(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(&self.subject)
            .to_string()
    }
}
