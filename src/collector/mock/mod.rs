//! Mock query execution for testing.

mod executor;
mod scenarios;

pub use executor::{MISSING_VIEW_ERROR, MockExecutor};
