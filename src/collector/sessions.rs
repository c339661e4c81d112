//! Conversion of query rows into session and metric records.

use crate::models::RawSessionRow;

use super::traits::QueryRow;

/// Builds a session record from a session-detail row. Missing counters become zero.
///
/// `None` for a row without a session id.
pub fn parse_session_row(row: &QueryRow) -> Option<RawSessionRow> {
    let sid = row.get_f64("SID")? as i64;
    Some(RawSessionRow {
        sid,
        username: row.get_str("USERNAME").unwrap_or_default(),
        owner: row.get_str("OWNER").unwrap_or_default(),
        machine: row.get_str("MACHINE"),
        osuser: row.get_str("OSUSER"),
        sql_text: row.get_str("SQL_TEXT").unwrap_or_default(),
        wait_event: row.get_str("EVENT").unwrap_or_default(),
        duration_sec: row.non_negative("DURATION_SEC"),
        buffer_gets: row.counter("BUFFER_GETS"),
        disk_reads: row.counter("DISK_READS"),
        rows_processed: row.counter("ROWS_PROCESSED"),
        executions: row.counter("EXECUTIONS"),
        locks: row.counter("LOCK_COUNT"),
        cpu_cs: row.get_f64("CPU_CS").map(|n| n.max(0.0) as u64),
    })
}

/// Instance CPU figures from the system metric query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemCpuMetrics {
    pub host_cpu_pct: Option<f64>,
    pub cpu_usage_per_sec: Option<f64>,
    pub num_cpus: Option<u32>,
}

impl SystemCpuMetrics {
    pub fn from_row(row: &QueryRow) -> Self {
        Self {
            host_cpu_pct: row.get_f64("HOST_CPU_PCT"),
            cpu_usage_per_sec: row.get_f64("CPU_USAGE_PER_SEC"),
            num_cpus: parse_num_cpus(row),
        }
    }

    /// Utilization percent: the direct metric when positive, otherwise the
    /// per-second usage normalized by core count. `None` when neither is usable.
    pub fn utilization_pct(&self) -> Option<f64> {
        if let Some(pct) = self.host_cpu_pct.filter(|&p| p > 0.0) {
            return Some(pct.min(100.0));
        }
        let usage = self.cpu_usage_per_sec.filter(|&u| u > 0.0)?;
        let cpus = self.num_cpus.filter(|&n| n > 0)?;
        // centiseconds per second over (cores * 100 cs) available per second
        Some((usage / cpus as f64).clamp(0.0, 100.0))
    }
}

/// Cumulative host CPU counters from `v$osstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OsCpuTimes {
    pub busy: u64,
    pub idle: u64,
    pub num_cpus: Option<u32>,
}

impl OsCpuTimes {
    /// `None` when neither counter is present.
    pub fn from_row(row: &QueryRow) -> Option<Self> {
        if row.get_f64("BUSY_TIME").is_none() && row.get_f64("IDLE_TIME").is_none() {
            return None;
        }
        Some(Self {
            busy: row.counter("BUSY_TIME"),
            idle: row.counter("IDLE_TIME"),
            num_cpus: parse_num_cpus(row),
        })
    }
}

fn parse_num_cpus(row: &QueryRow) -> Option<u32> {
    row.get_f64("NUM_CPUS")
        .filter(|&n| n >= 1.0)
        .map(|n| n as u32)
}
