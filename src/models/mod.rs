//! Data models for the LeetSight backend.
//!
//! Field names follow the JSON contract the web client consumes.

mod catalog;
mod company;
mod feedback;
mod list;
mod pagination;
mod post;
mod question;
mod reaction;
pub mod timestamp;
mod user;

pub use catalog::*;
pub use company::*;
pub use feedback::*;
pub use list::*;
pub use pagination::*;
pub use post::*;
pub use question::*;
pub use reaction::*;
pub use user::*;
