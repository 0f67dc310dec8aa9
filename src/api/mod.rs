//! REST API module.
//!
//! `/api/v1` serves the web client; `/api` serves the catalogue views built
//! from processed-post documents.

mod admin;
mod catalog;
mod companies;
mod extract;
mod feedback;
mod lists;
mod posts;
mod questions;
mod search;
mod users;

pub use admin::*;
pub use catalog::*;
pub use companies::*;
pub use feedback::*;
pub use lists::*;
pub use posts::*;
pub use questions::*;
pub use search::*;
pub use users::*;

use crate::models::PageWindow;
use crate::AppState;

/// Page window from `skip`/`limit` using the configured page sizes.
pub(crate) fn skip_window(state: &AppState, skip: Option<i64>, limit: Option<i64>) -> PageWindow {
    PageWindow::from_skip(
        skip,
        limit,
        state.config.default_page_size,
        state.config.max_page_size,
    )
}

/// Page window from a 1-based `page` using the configured page sizes.
pub(crate) fn page_window(state: &AppState, page: Option<i64>, limit: Option<i64>) -> PageWindow {
    PageWindow::from_page(
        page,
        limit,
        state.config.default_page_size,
        state.config.max_page_size,
    )
}
