//! Active sessions table: filtering, sorting and the table view model.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::fmt::{FmtStyle, format_duration, format_mb, format_opt_pct, normalize_for_display};
use crate::models::{ImpactTier, Operation, ScoredSession, Snapshot};

use super::common::{RowStyleClass, TableViewModel, ViewCell, ViewRow};

const SQL_PREVIEW_CHARS: usize = 80;

/// Criteria a session must match to be shown. Empty criteria match all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    /// Case-insensitive substring of the owning schema.
    pub owner: Option<String>,
    pub operation: Option<Operation>,
    /// Minimum duration in seconds, inclusive.
    pub min_duration_sec: Option<f64>,
    pub impact: Option<ImpactTier>,
    /// Case-insensitive substring of the main table name.
    pub table: Option<String>,
}

impl SessionFilter {
    pub fn is_empty(&self) -> bool {
        self.owner.as_deref().is_none_or(str::is_empty)
            && self.operation.is_none()
            && self.min_duration_sec.is_none_or(|d| d <= 0.0)
            && self.impact.is_none()
            && self.table.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, session: &ScoredSession) -> bool {
        if let Some(owner) = self.owner.as_deref()
            && !contains_ci(&session.owner, owner)
        {
            return false;
        }
        if let Some(op) = self.operation
            && session.operation != op
        {
            return false;
        }
        if let Some(min) = self.min_duration_sec
            && session.duration_sec < min
        {
            return false;
        }
        if let Some(impact) = self.impact
            && session.impact != impact
        {
            return false;
        }
        if let Some(table) = self.table.as_deref()
            && !contains_ci(session.main_table.as_str(), table)
        {
            return false;
        }
        true
    }

    /// Returns the matching sessions, preserving order.
    pub fn apply<'a>(&self, sessions: &'a [ScoredSession]) -> Vec<&'a ScoredSession> {
        sessions.iter().filter(|s| self.matches(s)).collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Column the sessions table is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Sid,
    Username,
    Owner,
    Operation,
    Table,
    #[default]
    Duration,
    EstMb,
    Impact,
    Cpu,
    Locks,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sid" => Ok(Self::Sid),
            "username" | "user" => Ok(Self::Username),
            "owner" => Ok(Self::Owner),
            "operation" | "op" => Ok(Self::Operation),
            "table" => Ok(Self::Table),
            "duration" => Ok(Self::Duration),
            "mb" | "estmb" | "est_mb" => Ok(Self::EstMb),
            "impact" => Ok(Self::Impact),
            "cpu" => Ok(Self::Cpu),
            "locks" => Ok(Self::Locks),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

fn compare(a: &ScoredSession, b: &ScoredSession, key: SortKey) -> Ordering {
    match key {
        SortKey::Sid => a.sid.cmp(&b.sid),
        SortKey::Username => a.username.cmp(&b.username),
        SortKey::Owner => a.owner.cmp(&b.owner),
        SortKey::Operation => a.operation.as_str().cmp(b.operation.as_str()),
        SortKey::Table => a.main_table.as_str().cmp(b.main_table.as_str()),
        SortKey::Duration => a.duration_sec.total_cmp(&b.duration_sec),
        SortKey::EstMb => a.est_mb.total_cmp(&b.est_mb),
        SortKey::Impact => a
            .impact
            .cmp(&b.impact)
            .then(a.impact_score.total_cmp(&b.impact_score)),
        // Sessions without a CPU reading sort below any reading.
        SortKey::Cpu => match (a.cpu_percent, b.cpu_percent) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
        SortKey::Locks => a.locks.cmp(&b.locks),
    }
}

/// Stable sort; equal rows keep their incoming order in both directions.
pub fn sort_sessions(sessions: &mut [&ScoredSession], key: SortKey, order: SortOrder) {
    sessions.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

const HEADERS: [&str; 11] = [
    "SID", "USER", "OWNER", "OP", "TABLE", "DURATION", "EST", "CPU", "LOCKS", "IMPACT", "SQL",
];
const WIDTHS: [u16; 10] = [6, 12, 12, 6, 24, 8, 9, 6, 5, 6];

/// Builds the sessions table for a snapshot.
pub fn build_sessions_view(
    snapshot: &Snapshot,
    filter: &SessionFilter,
    key: SortKey,
    order: SortOrder,
) -> TableViewModel<i64> {
    let mut sessions = filter.apply(&snapshot.active_loads);
    sort_sessions(&mut sessions, key, order);

    let summary = &snapshot.summary;
    let mut title = format!(
        "{} active | {} est | locks {} | top table {} | db cpu {}",
        summary.active_sessions,
        format_mb(summary.total_est_mb, FmtStyle::Detail),
        summary.detected_locks,
        summary.top_table.as_str(),
        format_opt_pct(summary.db_cpu_percent),
    );
    if snapshot.fallback {
        title.push_str(" | reduced privileges");
    }
    if !filter.is_empty() {
        title.push_str(&format!(" | {} shown", sessions.len()));
    }

    let rows = sessions
        .into_iter()
        .map(|s| ViewRow {
            id: s.sid,
            cells: session_cells(s),
            style: row_style(s, snapshot.fallback),
        })
        .collect();

    TableViewModel {
        title,
        headers: HEADERS.iter().map(|h| h.to_string()).collect(),
        widths: WIDTHS.to_vec(),
        rows,
    }
}

fn session_cells(s: &ScoredSession) -> Vec<ViewCell> {
    vec![
        ViewCell::plain(s.sid.to_string()),
        ViewCell::plain(s.username.clone()),
        ViewCell::plain(s.owner.clone()),
        ViewCell::plain(s.operation.as_str().to_string()),
        ViewCell::plain(s.main_table.as_str().to_string()),
        ViewCell::plain(format_duration(s.duration_sec)),
        ViewCell::plain(format_mb(s.est_mb, FmtStyle::Compact)),
        ViewCell::plain(format_opt_pct(s.cpu_percent)),
        ViewCell::plain(s.locks.to_string()),
        ViewCell::plain(s.impact.label().to_string()),
        ViewCell::plain(crate::fmt::truncate(
            &normalize_for_display(&s.sql_text),
            SQL_PREVIEW_CHARS,
        )),
    ]
}

fn row_style(s: &ScoredSession, fallback: bool) -> RowStyleClass {
    match s.impact {
        ImpactTier::High => RowStyleClass::Critical,
        ImpactTier::Medium => RowStyleClass::Warning,
        ImpactTier::Low if fallback => RowStyleClass::Dimmed,
        ImpactTier::Low => RowStyleClass::Normal,
    }
}
