//! Summary statistics and top offenders for one poll.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{ScoredSession, Snapshot, Summary, TopTable};

/// Number of sessions listed as top offenders.
pub const DEFAULT_TOP_OFFENDERS: usize = 5;

/// Builds the snapshot for a set of scored sessions.
///
/// `db_cpu_percent` readings `<= 0` are treated as no reading.
pub fn aggregate(
    sessions: Vec<ScoredSession>,
    db_cpu_percent: Option<f64>,
    top_n: usize,
    timestamp: DateTime<Utc>,
    fallback: bool,
) -> Snapshot {
    let summary = Summary {
        active_sessions: sessions.len(),
        total_est_mb: sessions.iter().map(|s| s.est_mb).sum(),
        detected_locks: sessions.iter().map(|s| s.locks).sum(),
        top_table: top_table(&sessions),
        db_cpu_percent: db_cpu_percent.filter(|&pct| pct > 0.0),
    };
    let top_offenders = top_offenders(&sessions, top_n);

    Snapshot {
        active_loads: sessions,
        summary,
        top_offenders,
        timestamp,
        fallback,
    }
}

/// Most frequent known main table. Ties go to the table seen first.
pub fn top_table(sessions: &[ScoredSession]) -> TopTable {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for name in sessions.iter().filter_map(|s| s.main_table.name()) {
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for name in order {
        let count = counts[name];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((name, count));
        }
    }

    best.map(|(name, _)| TopTable::Named(name.to_string()))
        .unwrap_or_default()
}

/// Up to `n` sessions with the highest offender weight, stable for ties.
pub fn top_offenders(sessions: &[ScoredSession], n: usize) -> Vec<ScoredSession> {
    let mut ranked: Vec<&ScoredSession> = sessions.iter().collect();
    ranked.sort_by(|a, b| b.offender_weight().total_cmp(&a.offender_weight()));
    ranked.into_iter().take(n).cloned().collect()
}
