//! Result of one poll.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ScoredSession, TopTable};

/// Aggregate figures shown above the session list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub active_sessions: usize,
    /// Sum of the per-session (already rounded) estimates.
    #[serde(rename = "totalEstMB")]
    pub total_est_mb: f64,
    pub detected_locks: u64,
    pub top_table: TopTable,
    /// Whole-database CPU utilization, when a metrics path produced a positive reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_cpu_percent: Option<f64>,
}

/// Ranked view of database load at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub active_loads: Vec<ScoredSession>,
    pub summary: Summary,
    pub top_offenders: Vec<ScoredSession>,
    pub timestamp: DateTime<Utc>,
    /// true when rows came from the reduced-privilege query.
    pub fallback: bool,
}
