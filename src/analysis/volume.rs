//! Data volume estimation from execution counters.

use crate::models::{QueryMode, RawSessionRow};

/// Assumed database block size.
pub const BLOCK_SIZE_BYTES: f64 = 8192.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// MB attributed to each processed row when block counters are unusable.
pub const MB_PER_ROW: f64 = 0.001;

/// MB attributed to each second of runtime when nothing else is known.
pub const MB_PER_SECOND: f64 = 0.01;

/// Smallest non-zero estimate after rounding.
const MIN_ESTIMATE_MB: f64 = 0.01;

/// Counters the estimate is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionStats {
    pub buffer_gets: u64,
    pub disk_reads: u64,
    pub rows_processed: u64,
    pub duration_sec: f64,
}

impl From<&RawSessionRow> for ExecutionStats {
    fn from(row: &RawSessionRow) -> Self {
        Self {
            buffer_gets: row.buffer_gets,
            disk_reads: row.disk_reads,
            rows_processed: row.rows_processed,
            duration_sec: row.duration_sec,
        }
    }
}

/// Estimates the data volume a session touched, in MB rounded to 2 decimals.
///
/// Primary mode counts 8 KB per buffer get and disk read. When that yields zero,
/// or in fallback mode, rows processed are used instead. A session with positive
/// duration never reports zero.
pub fn estimate_mb(stats: &ExecutionStats, mode: QueryMode) -> f64 {
    let rows_estimate = stats.rows_processed as f64 * MB_PER_ROW;

    let raw = match mode {
        QueryMode::Primary => {
            let blocks = stats.buffer_gets as f64 + stats.disk_reads as f64;
            let by_blocks = blocks * BLOCK_SIZE_BYTES / BYTES_PER_MB;
            if by_blocks == 0.0 && stats.rows_processed > 0 {
                rows_estimate
            } else {
                by_blocks
            }
        }
        QueryMode::Fallback => rows_estimate,
    };

    let estimate = round2(raw).max(0.0);
    if estimate == 0.0 && stats.duration_sec > 0.0 {
        return round2(stats.duration_sec * MB_PER_SECOND).max(MIN_ESTIMATE_MB);
    }
    estimate
}

/// Rounds to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
