//! UI-agnostic view models.
//!
//! [`sessions`] filters and sorts a snapshot's sessions and builds a
//! [`common::TableViewModel`] the CLI (or any other frontend) renders.

pub mod common;
pub mod sessions;

pub use sessions::{SessionFilter, SortKey, SortOrder, build_sessions_view};
