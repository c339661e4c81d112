//! Per-poll scoring pipeline: SQL classification, volume estimation,
//! impact scoring and snapshot aggregation.

pub mod aggregate;
pub mod impact;
pub mod sql;
pub mod volume;

use crate::models::{QueryMode, RawSessionRow, ScoredSession};

pub use aggregate::{DEFAULT_TOP_OFFENDERS, aggregate};
pub use sql::{Classification, classify};
pub use volume::{ExecutionStats, estimate_mb};

/// Runs one raw row through classification, estimation and scoring.
pub fn score_session(row: RawSessionRow, mode: QueryMode, cpu_percent: Option<f64>) -> ScoredSession {
    let Classification {
        operation,
        main_table,
    } = classify(&row.sql_text);
    let est_mb = estimate_mb(&ExecutionStats::from(&row), mode);
    let impact = impact::score(row.duration_sec, est_mb, row.locks);

    ScoredSession {
        sid: row.sid,
        username: row.username,
        owner: row.owner,
        machine: row.machine,
        osuser: row.osuser,
        operation,
        main_table,
        duration_sec: row.duration_sec,
        est_mb,
        cpu_percent,
        impact: impact.tier,
        impact_score: impact.score,
        wait_event: row.wait_event,
        sql_text: row.sql_text,
        locks: row.locks,
    }
}
