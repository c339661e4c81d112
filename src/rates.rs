//! CPU rate computation across polls.
//!
//! Cumulative counters are turned into percentages by comparing each poll
//! with the previous one kept per connection:
//! - [`CpuDeltaTracker`]: per-session `CPU used by this session` (centiseconds)
//! - [`BusyIdleTracker`]: host `BUSY_TIME` / `IDLE_TIME` from `v$osstat`
//!
//! Both hold only the previous sample, replaced wholesale on every update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Delta of a cumulative counter, clamped at zero on counter regression
/// (session id reuse, statistics reset).
pub fn clamped_delta(curr: u64, prev: u64) -> u64 {
    curr.saturating_sub(prev)
}

/// Clamps a percentage into `0..=100`.
pub fn clamp_pct(pct: f64) -> f64 {
    pct.clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Per-session CPU
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct CpuSample {
    taken_at: DateTime<Utc>,
    cpu_cs_by_sid: HashMap<i64, u64>,
}

/// Previous per-session CPU sample of one connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuDeltaTracker {
    prev: Option<CpuSample>,
    num_cpus: Option<u32>,
}

impl CpuDeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// true once a baseline sample exists.
    pub fn has_baseline(&self) -> bool {
        self.prev.is_some()
    }

    /// Core count seen on the last update, if any.
    pub fn num_cpus(&self) -> Option<u32> {
        self.num_cpus
    }

    /// Computes each session's CPU share since the previous sample and
    /// stores `current` as the new baseline.
    ///
    /// Sessions without a previous reading get no entry. No entries at all
    /// on the first call, or when the elapsed CPU capacity is not positive.
    pub fn update(
        &mut self,
        now: DateTime<Utc>,
        num_cpus: u32,
        current: HashMap<i64, u64>,
    ) -> HashMap<i64, f64> {
        let mut result = HashMap::new();

        if let Some(prev) = &self.prev {
            let interval_sec = (now - prev.taken_at).num_milliseconds() as f64 / 1000.0;
            let capacity_sec = interval_sec * num_cpus as f64;

            if capacity_sec > 0.0 {
                result.reserve(current.len());
                for (&sid, &cpu_cs) in &current {
                    let Some(&prev_cs) = prev.cpu_cs_by_sid.get(&sid) else {
                        continue;
                    };
                    let delta_sec = clamped_delta(cpu_cs, prev_cs) as f64 / 100.0;
                    result.insert(sid, clamp_pct(delta_sec / capacity_sec * 100.0));
                }
            }
        }

        self.prev = Some(CpuSample {
            taken_at: now,
            cpu_cs_by_sid: current,
        });
        self.num_cpus = Some(num_cpus);
        result
    }

    pub fn reset(&mut self) {
        self.prev = None;
        self.num_cpus = None;
    }
}

// ---------------------------------------------------------------------------
// Host busy/idle
// ---------------------------------------------------------------------------

/// Previous host busy/idle counters of one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyIdleTracker {
    prev: Option<(u64, u64)>,
}

impl BusyIdleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_baseline(&self) -> bool {
        self.prev.is_some()
    }

    /// Percent of time busy since the previous sample. `None` without a baseline
    /// or when neither counter moved.
    pub fn update(&mut self, busy: u64, idle: u64) -> Option<f64> {
        let result = self.prev.and_then(|(prev_busy, prev_idle)| {
            let d_busy = clamped_delta(busy, prev_busy) as f64;
            let d_idle = clamped_delta(idle, prev_idle) as f64;
            let total = d_busy + d_idle;
            (total > 0.0).then(|| clamp_pct(d_busy / total * 100.0))
        });
        self.prev = Some((busy, idle));
        result
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}
