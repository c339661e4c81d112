//! SQL texts issued against Oracle dynamic performance views.
//!
//! All four are parameterless. Column aliases are the keys the row parsers read.

/// Active user sessions joined with cursor statistics, blocking locks and
/// cumulative session CPU.
pub const PRIMARY_SESSIONS: &str = r#"
    SELECT
        s.sid,
        s.username,
        s.schemaname AS owner,
        s.machine,
        s.osuser,
        s.status,
        s.sql_id,
        NVL(sa.sql_text, 'N/A') AS sql_text,
        s.event,
        s.last_call_et AS duration_sec,
        NVL(sa.executions, 0) AS executions,
        NVL(sa.rows_processed, 0) AS rows_processed,
        NVL(sa.buffer_gets, 0) AS buffer_gets,
        NVL(sa.disk_reads, 0) AS disk_reads,
        NVL(l.lock_count, 0) AS lock_count,
        st.value AS cpu_cs
    FROM v$session s
    LEFT JOIN v$sql sa
        ON sa.sql_id = s.sql_id
       AND sa.address = s.sql_address
       AND sa.child_number = s.sql_child_number
    LEFT JOIN (
        SELECT sid, COUNT(*) AS lock_count
        FROM v$lock
        WHERE block = 1
        GROUP BY sid
    ) l ON l.sid = s.sid
    LEFT JOIN v$sesstat st
        ON st.sid = s.sid
       AND st.statistic# = (
           SELECT statistic# FROM v$statname WHERE name = 'CPU used by this session'
       )
    WHERE s.type = 'USER'
      AND s.status = 'ACTIVE'
      AND s.username IS NOT NULL
      AND s.sql_id IS NOT NULL
      AND s.last_call_et > 5
"#;

/// Sessions only, for users without access to `v$sql` / `v$lock` / `v$sesstat`.
pub const FALLBACK_SESSIONS: &str = r#"
    SELECT
        s.sid,
        s.username,
        s.schemaname AS owner,
        s.machine,
        s.osuser,
        s.status,
        s.sql_id,
        'N/A (no permission on v$sql)' AS sql_text,
        s.event,
        s.last_call_et AS duration_sec,
        0 AS executions,
        0 AS rows_processed,
        0 AS buffer_gets,
        0 AS disk_reads,
        0 AS lock_count,
        NULL AS cpu_cs
    FROM v$session s
    WHERE s.type = 'USER'
      AND s.status = 'ACTIVE'
      AND s.username IS NOT NULL
      AND s.sql_id IS NOT NULL
      AND s.last_call_et > 5
"#;

/// Instance CPU from the 60-second system metric group.
///
/// `CPU Usage Per Sec` is in centiseconds per second, summed over all cores.
pub const SYSTEM_METRICS: &str = r#"
    SELECT
        (SELECT value FROM v$sysmetric
          WHERE metric_name = 'Host CPU Utilization (%)' AND group_id = 2) AS host_cpu_pct,
        (SELECT value FROM v$sysmetric
          WHERE metric_name = 'CPU Usage Per Sec' AND group_id = 2) AS cpu_usage_per_sec,
        (SELECT value FROM v$osstat WHERE stat_name = 'NUM_CPUS') AS num_cpus
    FROM dual
"#;

/// Cumulative host busy/idle time (centiseconds) for delta-based CPU.
pub const OS_CPU_TIMES: &str = r#"
    SELECT
        (SELECT value FROM v$osstat WHERE stat_name = 'BUSY_TIME') AS busy_time,
        (SELECT value FROM v$osstat WHERE stat_name = 'IDLE_TIME') AS idle_time,
        (SELECT value FROM v$osstat WHERE stat_name = 'NUM_CPUS') AS num_cpus
    FROM dual
"#;
