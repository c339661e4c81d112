//! Sampling driver: one poll of one connection.
//!
//! A poll runs its queries one after another on the connection's executor:
//!
//! 1. `PRIMARY_SESSIONS`; on failure `FALLBACK_SESSIONS` (reduced privileges).
//!    A connection-invalid error on either tears the connection down.
//! 2. `SYSTEM_METRICS`, then `OS_CPU_TIMES` if no usable reading. Best effort:
//!    failures only mean the snapshot has no database CPU figure.
//! 3. Per-session CPU deltas, scoring and aggregation.
//!
//! `poll` takes `&mut self`, so at most one poll per sampler is in flight.

mod registry;

pub use registry::{ConnectionId, SessionRegistry};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::analysis::{aggregate, score_session};
use crate::collector::OracleExecutor;
use crate::collector::queries::{FALLBACK_SESSIONS, OS_CPU_TIMES, PRIMARY_SESSIONS, SYSTEM_METRICS};
use crate::collector::sessions::{OsCpuTimes, SystemCpuMetrics, parse_session_row};
use crate::collector::traits::{QueryError, QueryExecutor, QueryRow};
use crate::config::{ConnectError, ConnectionDetails, SamplerConfig};
use crate::models::{QueryMode, RawSessionRow, Snapshot};
use registry::ConnectionState;

/// Error type for a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// No connection is registered under this id.
    ConnectionNotFound(ConnectionId),
    /// The session handle died; the connection and its state were removed.
    ConnectionLost(String),
    /// Both session queries failed. Carries the fallback query's message.
    /// The connection stays registered.
    Query(String),
}

impl SampleError {
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, SampleError::ConnectionLost(_))
    }
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::ConnectionNotFound(id) => write!(f, "Connection not found: {}", id),
            SampleError::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            SampleError::Query(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SampleError {}

/// Polls registered connections and turns their rows into snapshots.
pub struct Sampler<E: QueryExecutor> {
    registry: SessionRegistry<E>,
    config: SamplerConfig,
}

impl<E: QueryExecutor> Sampler<E> {
    pub fn new(registry: SessionRegistry<E>) -> Self {
        Self::with_config(registry, SamplerConfig::default())
    }

    pub fn with_config(registry: SessionRegistry<E>, config: SamplerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &SessionRegistry<E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry<E> {
        &mut self.registry
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Polls a connection now.
    pub fn poll(&mut self, id: &ConnectionId) -> Result<Snapshot, SampleError> {
        self.poll_at(id, Utc::now())
    }

    /// Polls a connection, stamping the snapshot and CPU baseline with `now`.
    pub fn poll_at(
        &mut self,
        id: &ConnectionId,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, SampleError> {
        let Some(conn) = self.registry.get_mut(id) else {
            return Err(SampleError::ConnectionNotFound(id.clone()));
        };

        let (rows, mode) = match fetch_sessions(&mut conn.executor) {
            Ok(result) => result,
            Err(e) if e.is_connection_invalid() => {
                warn!(connection = %id, error = %e, "connection is no longer valid, removing");
                self.registry.disconnect(id);
                return Err(SampleError::ConnectionLost(e.message));
            }
            Err(e) => return Err(SampleError::Query(e.message)),
        };

        let sessions: Vec<RawSessionRow> = rows.iter().filter_map(parse_session_row).collect();
        if sessions.len() < rows.len() {
            debug!(connection = %id, skipped = rows.len() - sessions.len(), "rows without sid");
        }
        let system_cpu = read_system_cpu(conn);

        // Fallback rows carry no CPU statistic; drop the baseline so the next
        // primary poll does not diff against it.
        let cpu_by_sid = if mode.is_fallback() {
            conn.cpu.reset();
            HashMap::new()
        } else {
            let num_cpus = system_cpu
                .num_cpus
                .or(conn.cpu.num_cpus())
                .unwrap_or(1);
            let readings: HashMap<i64, u64> = sessions
                .iter()
                .filter_map(|s| s.cpu_cs.map(|cs| (s.sid, cs)))
                .collect();
            conn.cpu.update(now, num_cpus, readings)
        };

        let scored: Vec<_> = sessions
            .into_iter()
            .map(|row| {
                let cpu = cpu_by_sid.get(&row.sid).copied();
                score_session(row, mode, cpu)
            })
            .collect();

        let snapshot = aggregate(
            scored,
            system_cpu.percent,
            self.config.top_offenders,
            now,
            mode.is_fallback(),
        );

        debug!(
            connection = %id,
            sessions = snapshot.summary.active_sessions,
            fallback = snapshot.fallback,
            db_cpu = ?snapshot.summary.db_cpu_percent,
            "poll complete"
        );

        Ok(snapshot)
    }
}

impl Sampler<OracleExecutor> {
    /// Opens an Oracle session and registers it.
    pub fn connect(&mut self, details: &ConnectionDetails) -> Result<ConnectionId, ConnectError> {
        let executor = OracleExecutor::connect(details)?;
        Ok(self.registry.register(executor))
    }
}

/// Runs the primary session query, falling back to the reduced-privilege one.
///
/// A connection-invalid error from the primary query is returned without
/// trying the fallback.
fn fetch_sessions<E: QueryExecutor>(
    executor: &mut E,
) -> Result<(Vec<QueryRow>, QueryMode), QueryError> {
    match executor.execute(PRIMARY_SESSIONS) {
        Ok(rows) => Ok((rows, QueryMode::Primary)),
        Err(e) if e.is_connection_invalid() => Err(e),
        Err(e) => {
            warn!(error = %e, "primary session query failed, using fallback");
            executor
                .execute(FALLBACK_SESSIONS)
                .map(|rows| (rows, QueryMode::Fallback))
        }
    }
}

/// Database CPU reading and core count, whichever paths produced them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SystemCpu {
    percent: Option<f64>,
    num_cpus: Option<u32>,
}

/// Reads instance CPU: system metric first, host busy/idle delta second.
fn read_system_cpu<E: QueryExecutor>(conn: &mut ConnectionState<E>) -> SystemCpu {
    let metrics = first_row(&mut conn.executor, SYSTEM_METRICS)
        .map(|row| SystemCpuMetrics::from_row(&row))
        .unwrap_or_default();

    if let Some(percent) = metrics.utilization_pct() {
        return SystemCpu {
            percent: Some(percent),
            num_cpus: metrics.num_cpus,
        };
    }

    let Some(times) = first_row(&mut conn.executor, OS_CPU_TIMES)
        .as_ref()
        .and_then(OsCpuTimes::from_row)
    else {
        debug!("no database CPU reading available");
        return SystemCpu {
            percent: None,
            num_cpus: metrics.num_cpus,
        };
    };

    SystemCpu {
        percent: conn.os_cpu.update(times.busy, times.idle),
        num_cpus: metrics.num_cpus.or(times.num_cpus),
    }
}

/// First row of a best-effort query. Errors and empty results are `None`.
fn first_row<E: QueryExecutor>(executor: &mut E, sql: &str) -> Option<QueryRow> {
    match executor.execute(sql) {
        Ok(rows) => rows.into_iter().next(),
        Err(e) => {
            debug!(error = %e, "metrics query unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockExecutor;
    use crate::models::{ImpactTier, Operation, TableRef, TopTable};
    use chrono::Duration;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn sampler_with(executor: MockExecutor) -> (Sampler<MockExecutor>, ConnectionId) {
        let mut sampler = Sampler::new(SessionRegistry::new());
        let id = sampler.registry_mut().register(executor);
        (sampler, id)
    }

    fn single_session(sid: i64, cpu_cs: u64) -> Vec<QueryRow> {
        MockExecutor::rows_from_json(json!([{
            "SID": sid, "USERNAME": "APP", "OWNER": "APP",
            "SQL_TEXT": "SELECT * FROM app.items", "EVENT": "CPU",
            "DURATION_SEC": 10, "BUFFER_GETS": 128, "DISK_READS": 0,
            "ROWS_PROCESSED": 1, "EXECUTIONS": 1, "LOCK_COUNT": 0, "CPU_CS": cpu_cs
        }]))
    }

    fn cpu_metrics(num_cpus: u32) -> Vec<QueryRow> {
        MockExecutor::rows_from_json(json!([{
            "HOST_CPU_PCT": 20.0, "CPU_USAGE_PER_SEC": null, "NUM_CPUS": num_cpus
        }]))
    }

    #[test]
    fn healthy_instance_full_snapshot() {
        let (mut sampler, id) = sampler_with(MockExecutor::healthy_instance());
        let snap = sampler.poll_at(&id, t0()).unwrap();

        assert!(!snap.fallback);
        assert_eq!(snap.timestamp, t0());
        assert_eq!(snap.summary.active_sessions, 4);
        assert_eq!(snap.summary.detected_locks, 2);
        assert_eq!(snap.summary.db_cpu_percent, Some(63.2));
        assert_eq!(
            snap.summary.top_table,
            TopTable::Named("SALES.ORDERS".to_string())
        );
        // 100 MB + 30 MB + 0.9 MB (rows) + 0.12 MB (duration)
        assert_eq!(snap.summary.total_est_mb, 100.0 + 30.0 + 0.9 + 0.12);

        let batch = &snap.active_loads[0];
        assert_eq!(batch.operation, Operation::Update);
        assert_eq!(batch.est_mb, 100.0);
        assert_eq!(batch.impact, ImpactTier::High);
        assert_eq!(batch.cpu_percent, None);

        let unknown = &snap.active_loads[3];
        assert_eq!(unknown.operation, Operation::Unknown);
        assert_eq!(unknown.main_table, TableRef::Unknown);

        assert_eq!(snap.top_offenders.len(), 4);
        assert_eq!(snap.top_offenders[0].sid, 101);

        // metrics answered directly, busy/idle never consulted
        let exec = sampler.registry().executor(&id).unwrap();
        assert_eq!(exec.count(PRIMARY_SESSIONS), 1);
        assert_eq!(exec.count(FALLBACK_SESSIONS), 0);
        assert_eq!(exec.count(OS_CPU_TIMES), 0);
    }

    #[test]
    fn queries_run_in_order() {
        let (mut sampler, id) = sampler_with(MockExecutor::restricted_privileges());
        sampler.poll_at(&id, t0()).unwrap();
        let exec = sampler.registry().executor(&id).unwrap();
        assert_eq!(
            exec.executed(),
            &[
                PRIMARY_SESSIONS.to_string(),
                FALLBACK_SESSIONS.to_string(),
                SYSTEM_METRICS.to_string(),
                OS_CPU_TIMES.to_string(),
            ]
        );
    }

    #[test]
    fn fallback_poll_succeeds_with_reduced_estimates() {
        let (mut sampler, id) = sampler_with(MockExecutor::restricted_privileges());
        let snap = sampler.poll_at(&id, t0()).unwrap();

        assert!(snap.fallback);
        assert_eq!(snap.summary.active_sessions, 2);
        assert_eq!(snap.summary.top_table, TopTable::NotApplicable);
        // first busy/idle sample is only a baseline
        assert_eq!(snap.summary.db_cpu_percent, None);
        for s in &snap.active_loads {
            assert_eq!(s.operation, Operation::Unknown);
            assert!(s.main_table.is_unknown());
        }
        // no rows processed: duration heuristic, 30 s -> 0.3 MB, 600 s -> 6 MB
        assert_eq!(snap.active_loads[0].est_mb, 0.3);
        assert_eq!(snap.active_loads[1].est_mb, 6.0);
        assert_eq!(snap.active_loads[1].impact, ImpactTier::High);
        assert!(sampler.registry().contains(&id));
    }

    #[test]
    fn busy_idle_delta_on_second_poll() {
        let mut exec = MockExecutor::restricted_privileges();
        exec.push(
            OS_CPU_TIMES,
            Ok(MockExecutor::rows_from_json(
                json!([{ "BUSY_TIME": 1000, "IDLE_TIME": 9000, "NUM_CPUS": 2 }]),
            )),
        );
        exec.respond(
            OS_CPU_TIMES,
            MockExecutor::rows_from_json(
                json!([{ "BUSY_TIME": 1400, "IDLE_TIME": 9600, "NUM_CPUS": 2 }]),
            ),
        );
        let (mut sampler, id) = sampler_with(exec);
        assert_eq!(sampler.poll_at(&id, t0()).unwrap().summary.db_cpu_percent, None);
        let snap = sampler.poll_at(&id, t0() + Duration::seconds(5)).unwrap();
        assert_eq!(snap.summary.db_cpu_percent, Some(40.0));
    }

    #[test]
    fn both_queries_failing_reports_fallback_error_and_keeps_connection() {
        let mut exec = MockExecutor::new();
        exec.fail(PRIMARY_SESSIONS, "ORA-01031: insufficient privileges");
        exec.fail(FALLBACK_SESSIONS, "ORA-00942: table or view does not exist");
        let (mut sampler, id) = sampler_with(exec);

        let err = sampler.poll_at(&id, t0()).unwrap_err();
        assert_eq!(
            err,
            SampleError::Query("ORA-00942: table or view does not exist".to_string())
        );
        assert!(!err.is_connection_lost());
        assert!(sampler.registry().contains(&id));
        // tracker untouched by a failed poll
        assert!(!sampler.registry().cpu_tracker(&id).unwrap().has_baseline());
    }

    #[test]
    fn connection_invalid_on_primary_skips_fallback_and_removes_state() {
        let (mut sampler, id) = sampler_with(MockExecutor::dead_connection());
        let err = sampler.poll_at(&id, t0()).unwrap_err();
        assert!(err.is_connection_lost());
        assert!(!sampler.registry().contains(&id));
        assert!(sampler.registry().cpu_tracker(&id).is_none());
        assert!(sampler.registry().os_cpu_tracker(&id).is_none());

        let again = sampler.poll_at(&id, t0()).unwrap_err();
        assert_eq!(again, SampleError::ConnectionNotFound(id));
    }

    #[test]
    fn connection_invalid_on_fallback_is_connection_lost() {
        let mut exec = MockExecutor::new();
        exec.fail(PRIMARY_SESSIONS, "ORA-01031: insufficient privileges");
        exec.fail(FALLBACK_SESSIONS, "DPI-1010: not connected");
        let (mut sampler, id) = sampler_with(exec);
        assert!(sampler.poll_at(&id, t0()).unwrap_err().is_connection_lost());
        assert!(sampler.registry().is_empty());
    }

    #[test]
    fn cpu_percent_appears_from_second_poll() {
        let mut exec = MockExecutor::new();
        exec.push(PRIMARY_SESSIONS, Ok(single_session(7, 100)));
        exec.respond(PRIMARY_SESSIONS, single_session(7, 500));
        exec.respond(SYSTEM_METRICS, cpu_metrics(4));
        let (mut sampler, id) = sampler_with(exec);

        let first = sampler.poll_at(&id, t0()).unwrap();
        assert_eq!(first.active_loads[0].cpu_percent, None);

        let second = sampler.poll_at(&id, t0() + Duration::seconds(100)).unwrap();
        assert_eq!(second.active_loads[0].cpu_percent, Some(1.0));
    }

    #[test]
    fn fallback_poll_clears_cpu_baseline() {
        let mut exec = MockExecutor::new();
        exec.push(
            PRIMARY_SESSIONS,
            Err(QueryError::new("ORA-01031: insufficient privileges")),
        );
        exec.respond(FALLBACK_SESSIONS, single_session(7, 0));
        exec.push(PRIMARY_SESSIONS, Ok(single_session(7, 200_000)));
        exec.respond(PRIMARY_SESSIONS, single_session(7, 200_400));
        exec.respond(SYSTEM_METRICS, cpu_metrics(8));
        let (mut sampler, id) = sampler_with(exec);

        let first = sampler.poll_at(&id, t0()).unwrap();
        assert!(first.fallback);
        assert_eq!(first.active_loads[0].cpu_percent, None);
        assert!(!sampler.registry().cpu_tracker(&id).unwrap().has_baseline());

        // lifetime counter must not be read as usage since the fallback poll
        let second = sampler.poll_at(&id, t0() + Duration::seconds(5)).unwrap();
        assert!(!second.fallback);
        assert_eq!(second.active_loads[0].cpu_percent, None);

        // 4 s of CPU over 5 s * 8 cores
        let third = sampler.poll_at(&id, t0() + Duration::seconds(10)).unwrap();
        assert_eq!(third.active_loads[0].cpu_percent, Some(10.0));
    }

    #[test]
    fn consecutive_fallback_polls_report_no_cpu() {
        let (mut sampler, id) = sampler_with(MockExecutor::restricted_privileges());
        sampler.poll_at(&id, t0()).unwrap();
        let snap = sampler.poll_at(&id, t0() + Duration::seconds(5)).unwrap();
        assert!(snap.fallback);
        assert!(snap.active_loads.iter().all(|s| s.cpu_percent.is_none()));
        assert!(!sampler.registry().cpu_tracker(&id).unwrap().has_baseline());
    }

    #[test]
    fn null_cpu_statistic_gives_no_baseline_for_that_session() {
        let mut exec = MockExecutor::new();
        exec.push(
            PRIMARY_SESSIONS,
            Ok(MockExecutor::rows_from_json(json!([
                { "SID": 1, "DURATION_SEC": 10, "CPU_CS": null },
                { "SID": 2, "DURATION_SEC": 10, "CPU_CS": 100 }
            ]))),
        );
        exec.respond(
            PRIMARY_SESSIONS,
            MockExecutor::rows_from_json(json!([
                { "SID": 1, "DURATION_SEC": 20, "CPU_CS": 5000 },
                { "SID": 2, "DURATION_SEC": 20, "CPU_CS": 300 }
            ])),
        );
        exec.respond(SYSTEM_METRICS, cpu_metrics(1));
        let (mut sampler, id) = sampler_with(exec);

        sampler.poll_at(&id, t0()).unwrap();
        let snap = sampler.poll_at(&id, t0() + Duration::seconds(10)).unwrap();
        let cpu: Vec<Option<f64>> = snap.active_loads.iter().map(|s| s.cpu_percent).collect();
        // sid 2: 2 s of CPU over 10 s of one core
        assert_eq!(cpu, vec![None, Some(20.0)]);
    }

    #[test]
    fn rows_without_sid_are_dropped() {
        let mut exec = MockExecutor::new();
        exec.respond(
            PRIMARY_SESSIONS,
            MockExecutor::rows_from_json(json!([
                { "SID": null, "CPU_CS": 10 },
                { "USERNAME": "GHOST", "CPU_CS": 20 },
                { "SID": 3, "CPU_CS": 30 }
            ])),
        );
        let (mut sampler, id) = sampler_with(exec);
        let snap = sampler.poll_at(&id, t0()).unwrap();
        assert_eq!(snap.summary.active_sessions, 1);
        assert_eq!(snap.active_loads[0].sid, 3);
    }

    #[test]
    fn reconnect_starts_without_baseline() {
        let mut exec = MockExecutor::new();
        exec.respond(PRIMARY_SESSIONS, single_session(7, 100));
        exec.respond(SYSTEM_METRICS, cpu_metrics(1));
        let (mut sampler, id) = sampler_with(exec.clone());

        sampler.poll_at(&id, t0()).unwrap();
        assert!(sampler.registry().cpu_tracker(&id).unwrap().has_baseline());
        assert!(sampler.registry_mut().disconnect(&id));
        assert!(sampler.registry().cpu_tracker(&id).is_none());

        let fresh = sampler.registry_mut().register(exec);
        assert_ne!(fresh, id);
        let snap = sampler.poll_at(&fresh, t0() + Duration::seconds(10)).unwrap();
        assert_eq!(snap.active_loads[0].cpu_percent, None);
    }

    #[test]
    fn missing_num_cpus_reuses_last_known_then_defaults_to_one() {
        let mut exec = MockExecutor::new();
        exec.push(PRIMARY_SESSIONS, Ok(single_session(1, 0)));
        exec.respond(PRIMARY_SESSIONS, single_session(1, 1000));
        // metrics absent entirely: core count defaults to one
        let (mut sampler, id) = sampler_with(exec);
        sampler.poll_at(&id, t0()).unwrap();
        assert_eq!(sampler.registry().cpu_tracker(&id).unwrap().num_cpus(), Some(1));
        let snap = sampler.poll_at(&id, t0() + Duration::seconds(20)).unwrap();
        // 10 s of CPU over 20 s of one core
        assert_eq!(snap.active_loads[0].cpu_percent, Some(50.0));
        assert_eq!(snap.summary.db_cpu_percent, None);
    }

    #[test]
    fn unknown_connection() {
        let mut sampler: Sampler<MockExecutor> = Sampler::new(SessionRegistry::new());
        let id = ConnectionId::new("conn_missing");
        assert_eq!(
            sampler.poll_at(&id, t0()).unwrap_err(),
            SampleError::ConnectionNotFound(id)
        );
    }

    #[test]
    fn top_offenders_respect_config() {
        let registry = SessionRegistry::new();
        let mut sampler = Sampler::with_config(registry, SamplerConfig::default().with_top_offenders(2));
        let id = sampler
            .registry_mut()
            .register(MockExecutor::healthy_instance());
        let snap = sampler.poll_at(&id, t0()).unwrap();
        assert_eq!(snap.top_offenders.len(), 2);
        assert_eq!(snap.active_loads.len(), 4);
    }

    #[test]
    fn empty_result_is_a_valid_snapshot() {
        let mut exec = MockExecutor::new();
        exec.respond(PRIMARY_SESSIONS, Vec::new());
        let (mut sampler, id) = sampler_with(exec);
        let snap = sampler.poll_at(&id, t0()).unwrap();
        assert_eq!(snap.summary.active_sessions, 0);
        assert_eq!(snap.summary.total_est_mb, 0.0);
        assert_eq!(snap.summary.top_table, TopTable::NotApplicable);
        assert!(snap.top_offenders.is_empty());
    }
}
