//! In-memory query executor for testing the sampler without a database.

use std::collections::{HashMap, VecDeque};

use crate::collector::traits::{QueryError, QueryExecutor, QueryRow};

/// Error returned for queries that have no scripted response.
pub const MISSING_VIEW_ERROR: &str = "ORA-00942: table or view does not exist";

type Response = Result<Vec<QueryRow>, QueryError>;

/// Executor answering from scripted responses keyed by exact SQL text.
///
/// A queued one-shot response is used before the standing response for the
/// same query. Queries with neither fail with [`MISSING_VIEW_ERROR`].
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    standing: HashMap<String, Response>,
    queued: HashMap<String, VecDeque<Response>>,
    /// Every executed query text, in order.
    executed: Vec<String>,
    closed: bool,
}

impl MockExecutor {
    /// Creates an executor that fails every query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `sql` with `rows` until told otherwise.
    pub fn respond(&mut self, sql: &str, rows: Vec<QueryRow>) -> &mut Self {
        self.standing.insert(sql.to_string(), Ok(rows));
        self
    }

    /// Fails `sql` with `message` until told otherwise.
    pub fn fail(&mut self, sql: &str, message: &str) -> &mut Self {
        self.standing
            .insert(sql.to_string(), Err(QueryError::new(message)));
        self
    }

    /// Queues a one-shot response for the next execution of `sql`.
    pub fn push(&mut self, sql: &str, response: Response) -> &mut Self {
        self.queued
            .entry(sql.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Parses a JSON array of row objects.
    pub fn rows_from_json(value: serde_json::Value) -> Vec<QueryRow> {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Number of times `sql` was executed.
    pub fn count(&self, sql: &str) -> usize {
        self.executed.iter().filter(|q| q.as_str() == sql).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl QueryExecutor for MockExecutor {
    fn execute(&mut self, sql: &str) -> Result<Vec<QueryRow>, QueryError> {
        self.executed.push(sql.to_string());
        if self.closed {
            return Err(QueryError::new("DPI-1010: not connected"));
        }
        if let Some(response) = self.queued.get_mut(sql).and_then(|q| q.pop_front()) {
            return response;
        }
        self.standing
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Err(QueryError::new(MISSING_VIEW_ERROR)))
    }

    fn close(&mut self) -> Result<(), QueryError> {
        self.closed = true;
        Ok(())
    }
}
