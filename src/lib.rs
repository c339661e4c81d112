//! oraload - Oracle active-session load sampler.
//!
//! Polls an Oracle instance for active sessions, estimates each session's
//! data volume, CPU share and lock pressure, and ranks them in a snapshot.
//!
//! - [`collector`] runs the dictionary queries and parses their rows
//! - [`analysis`] classifies SQL and scores sessions
//! - [`sampler`] drives one poll per connection and keeps CPU baselines
//! - [`view`] filters and sorts a snapshot for display

pub mod analysis;
pub mod collector;
pub mod config;
pub mod fmt;
pub mod models;
pub mod rates;
pub mod sampler;
pub mod view;
