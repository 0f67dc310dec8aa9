//! Company model.

use serde::{Deserialize, Serialize};

/// A company that posts and questions are tagged with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// Placeholder the extraction pipeline emits when no company is known.
pub const UNKNOWN_COMPANY: &str = "N/A";

/// Normalize a company name coming from ingest; `None` means "no company".
pub fn normalize_company_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_COMPANY) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
