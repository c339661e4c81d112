//! Per-session rows: raw query output and the scored form.

use serde::Serialize;

use super::{ImpactTier, Operation, TableRef};

/// One active database session as returned by a session-detail query.
///
/// Missing or NULL counters are stored as zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSessionRow {
    /// Session id. Unique per poll within a connection.
    /// Source: `v$session.sid`
    pub sid: i64,

    /// Source: `v$session.username`
    pub username: String,

    /// Current schema of the session.
    /// Source: `v$session.schemaname`
    pub owner: String,

    /// Client host name.
    /// Source: `v$session.machine`
    pub machine: Option<String>,

    /// Client operating system user.
    /// Source: `v$session.osuser`
    pub osuser: Option<String>,

    /// SQL text of the current statement. May be truncated by the dictionary view,
    /// or the fixed "not available" marker when SQL statistics are not readable.
    /// Source: `v$sql.sql_text`
    pub sql_text: String,

    /// Source: `v$session.event`
    pub wait_event: String,

    /// Seconds since the current call started.
    /// Source: `v$session.last_call_et`
    pub duration_sec: f64,

    /// Source: `v$sql.buffer_gets`
    pub buffer_gets: u64,

    /// Source: `v$sql.disk_reads`
    pub disk_reads: u64,

    /// Source: `v$sql.rows_processed`
    pub rows_processed: u64,

    /// Source: `v$sql.executions`
    pub executions: u64,

    /// Number of locks held by this session that block others.
    /// Source: `COUNT(*) FROM v$lock WHERE block = 1`
    pub locks: u64,

    /// Cumulative CPU time of the session in centiseconds.
    /// `None` when the statistic is not readable (NULL join, reduced privileges).
    /// Source: `v$sesstat` for statistic `CPU used by this session`
    pub cpu_cs: Option<u64>,
}

/// A session after classification, volume estimation and impact scoring.
///
/// Built fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSession {
    pub sid: i64,
    pub username: String,
    pub owner: String,
    pub machine: Option<String>,
    pub osuser: Option<String>,
    pub operation: Operation,
    pub main_table: TableRef,
    pub duration_sec: f64,
    /// Estimated data volume in MB, rounded to 2 decimals.
    #[serde(rename = "estMB")]
    pub est_mb: f64,
    /// CPU share since the previous poll. Absent until the session has a baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    pub impact: ImpactTier,
    /// Raw impact score behind `impact`.
    pub impact_score: f64,
    pub wait_event: String,
    pub sql_text: String,
    pub locks: u64,
}

impl ScoredSession {
    /// Weight used to rank top offenders. Volume counts twice as much as duration.
    ///
    /// Not the same formula as the impact score.
    pub fn offender_weight(&self) -> f64 {
        self.duration_sec * 5.0 + self.est_mb * 10.0
    }
}
