//! Pre-built mock database scenarios for testing.
//!
//! These scenarios provide realistic dynamic-view contents for
//! various instance conditions.

use serde_json::json;

use super::executor::MockExecutor;
use crate::collector::queries::{FALLBACK_SESSIONS, OS_CPU_TIMES, PRIMARY_SESSIONS, SYSTEM_METRICS};

impl MockExecutor {
    /// A busy instance with full privileges.
    ///
    /// Includes: a long batch update holding two blocking locks, a reporting
    /// query, an insert into a log table, and a session whose cursor aged out.
    pub fn healthy_instance() -> Self {
        let mut m = Self::new();
        m.respond(
            PRIMARY_SESSIONS,
            Self::rows_from_json(json!([
                {
                    "SID": 101, "USERNAME": "BATCH", "OWNER": "SALES",
                    "MACHINE": "etl-01", "OSUSER": "etl",
                    "SQL_TEXT": "UPDATE sales.orders SET status = 'CLOSED' WHERE created < SYSDATE - 90",
                    "EVENT": "enq: TX - row lock contention", "DURATION_SEC": 320,
                    "EXECUTIONS": 1, "ROWS_PROCESSED": 50000, "BUFFER_GETS": 12800,
                    "DISK_READS": 0, "LOCK_COUNT": 2, "CPU_CS": 1500
                },
                {
                    "SID": 202, "USERNAME": "REPORTS", "OWNER": "SALES",
                    "MACHINE": "bi-02", "OSUSER": "bi",
                    "SQL_TEXT": "SELECT /*+ PARALLEL(8) */ region, SUM(total) FROM sales.orders GROUP BY region",
                    "EVENT": "direct path read", "DURATION_SEC": 45,
                    "EXECUTIONS": 12, "ROWS_PROCESSED": 8, "BUFFER_GETS": 2560,
                    "DISK_READS": 1280, "LOCK_COUNT": 0, "CPU_CS": 800
                },
                {
                    "SID": 303, "USERNAME": "APP", "OWNER": "APP",
                    "MACHINE": "web-03", "OSUSER": "tomcat",
                    "SQL_TEXT": "INSERT INTO app.audit_log (id, msg) VALUES (:1, :2)",
                    "EVENT": "log file sync", "DURATION_SEC": 7,
                    "EXECUTIONS": 900, "ROWS_PROCESSED": 900, "BUFFER_GETS": 0,
                    "DISK_READS": 0, "LOCK_COUNT": null, "CPU_CS": 40
                },
                {
                    "SID": 404, "USERNAME": "APP", "OWNER": "APP",
                    "MACHINE": null, "OSUSER": null,
                    "SQL_TEXT": "N/A",
                    "EVENT": "SQL*Net message from client", "DURATION_SEC": 12,
                    "EXECUTIONS": 0, "ROWS_PROCESSED": 0, "BUFFER_GETS": 0,
                    "DISK_READS": 0, "LOCK_COUNT": 0, "CPU_CS": 5
                }
            ])),
        );
        m.respond(
            SYSTEM_METRICS,
            Self::rows_from_json(json!([
                { "HOST_CPU_PCT": 63.2, "CPU_USAGE_PER_SEC": 410.0, "NUM_CPUS": 8 }
            ])),
        );
        m.respond(
            OS_CPU_TIMES,
            Self::rows_from_json(json!([
                { "BUSY_TIME": 500000, "IDLE_TIME": 1500000, "NUM_CPUS": 8 }
            ])),
        );
        m
    }

    /// A monitoring user granted `v$session` only.
    ///
    /// The primary query and the system metric views fail; the fallback
    /// session query and `v$osstat` answer.
    pub fn restricted_privileges() -> Self {
        let mut m = Self::new();
        m.fail(
            PRIMARY_SESSIONS,
            "ORA-01031: insufficient privileges",
        );
        m.respond(
            FALLBACK_SESSIONS,
            Self::rows_from_json(json!([
                {
                    "SID": 11, "USERNAME": "APP", "OWNER": "APP", "MACHINE": "web-01",
                    "OSUSER": "tomcat", "SQL_TEXT": "N/A (no permission on v$sql)",
                    "EVENT": "db file scattered read", "DURATION_SEC": 30,
                    "EXECUTIONS": 0, "ROWS_PROCESSED": 0, "BUFFER_GETS": 0,
                    "DISK_READS": 0, "LOCK_COUNT": 0, "CPU_CS": 0
                },
                {
                    "SID": 12, "USERNAME": "APP", "OWNER": "APP", "MACHINE": "web-02",
                    "OSUSER": "tomcat", "SQL_TEXT": "N/A (no permission on v$sql)",
                    "EVENT": "CPU", "DURATION_SEC": 600,
                    "EXECUTIONS": 0, "ROWS_PROCESSED": 0, "BUFFER_GETS": 0,
                    "DISK_READS": 0, "LOCK_COUNT": 0, "CPU_CS": 0
                }
            ])),
        );
        m.fail(SYSTEM_METRICS, "ORA-00942: table or view does not exist");
        m.respond(
            OS_CPU_TIMES,
            Self::rows_from_json(json!([
                { "BUSY_TIME": 1000, "IDLE_TIME": 9000, "NUM_CPUS": 2 }
            ])),
        );
        m
    }

    /// A session whose handle died: every query fails with a connection-invalid code.
    pub fn dead_connection() -> Self {
        let mut m = Self::new();
        for sql in [PRIMARY_SESSIONS, FALLBACK_SESSIONS, SYSTEM_METRICS, OS_CPU_TIMES] {
            m.fail(sql, "DPI-1080: connection was closed by ORA-3113");
        }
        m
    }
}
