//! Abstraction over query execution to enable testing and mocking.
//!
//! The `QueryExecutor` trait lets the sampler run against a live Oracle
//! session or an in-memory mock returning scripted rows.

use std::collections::HashMap;

use serde::Deserialize;

/// Driver error codes meaning the session handle is dead and must not be reused.
///
/// - `DPI-1010`: not connected
/// - `DPI-1080`: connection was closed
pub const CONNECTION_INVALID_SIGNATURES: [&str; 2] = ["DPI-1010", "DPI-1080"];

/// Executes parameterless queries and returns column-keyed rows.
pub trait QueryExecutor {
    /// Runs `sql` and returns every row.
    fn execute(&mut self, sql: &str) -> Result<Vec<QueryRow>, QueryError>;

    /// Releases the underlying session. Called once when the connection is dropped
    /// from the registry.
    fn close(&mut self) -> Result<(), QueryError> {
        Ok(())
    }
}

/// A failed query, carrying the driver's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// true when the message carries one of [`CONNECTION_INVALID_SIGNATURES`].
    pub fn is_connection_invalid(&self) -> bool {
        CONNECTION_INVALID_SIGNATURES
            .iter()
            .any(|sig| self.message.contains(sig))
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryError {}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

/// One result row keyed by upper-case column name.
///
/// Deserializes from a flat JSON object, which is the shape a process boundary
/// hands over when results travel as JSON. Keys are upper-cased on the way in.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "HashMap<String, Value>")]
pub struct QueryRow {
    columns: HashMap<String, Value>,
}

impl From<HashMap<String, Value>> for QueryRow {
    fn from(columns: HashMap<String, Value>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
        }
    }
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the upper-cased column name.
    pub fn insert(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_uppercase(), value);
    }

    pub fn with(mut self, column: &str, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    /// Looks a column up by name, case-insensitively.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(&column.to_uppercase())
    }

    /// Numeric value of a column. NULL, missing or unparsable text is `None`.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Non-negative counter value, zero when absent.
    pub fn counter(&self, column: &str) -> u64 {
        self.get_f64(column)
            .filter(|n| *n > 0.0)
            .map(|n| n as u64)
            .unwrap_or(0)
    }

    /// Non-negative numeric value, zero when absent.
    pub fn non_negative(&self, column: &str) -> f64 {
        self.get_f64(column).filter(|n| *n > 0.0).unwrap_or(0.0)
    }

    /// Text value of a column. Numbers are rendered, NULL is `None`.
    pub fn get_str(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
            Value::Null => None,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connection_invalid_signatures() {
        assert!(QueryError::new("DPI-1010: not connected").is_connection_invalid());
        assert!(
            QueryError::new("DPI-1080: connection was closed by ORA-3113")
                .is_connection_invalid()
        );
        assert!(!QueryError::new("ORA-00942: table or view does not exist").is_connection_invalid());
    }

    #[test]
    fn row_deserializes_from_json_object() {
        let row: QueryRow = serde_json::from_value(json!({
            "SID": 42,
            "USERNAME": "SCOTT",
            "MACHINE": null,
            "BUFFER_GETS": "1500"
        }))
        .unwrap();
        assert_eq!(row.get_f64("SID"), Some(42.0));
        assert_eq!(row.get_str("username"), Some("SCOTT".to_string()));
        assert_eq!(row.get_str("MACHINE"), None);
        assert_eq!(row.counter("BUFFER_GETS"), 1500);
    }

    #[test]
    fn lowercase_json_keys_are_found() {
        let row: QueryRow = serde_json::from_value(json!({
            "sid": 1,
            "Username": "scott",
            "cpu_cs": 250
        }))
        .unwrap();
        assert_eq!(row.get_f64("SID"), Some(1.0));
        assert_eq!(row.get_f64("sid"), Some(1.0));
        assert_eq!(row.get_str("USERNAME"), Some("scott".to_string()));
        assert_eq!(row.counter("CPU_CS"), 250);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn counters_default_to_zero_and_never_go_negative() {
        let row = QueryRow::new()
            .with("a", Value::Number(-5.0))
            .with("b", Value::Text("garbage".to_string()))
            .with("c", Value::Null);
        assert_eq!(row.counter("a"), 0);
        assert_eq!(row.counter("b"), 0);
        assert_eq!(row.counter("c"), 0);
        assert_eq!(row.counter("missing"), 0);
        assert_eq!(row.non_negative("a"), 0.0);
    }

    #[test]
    fn numbers_render_as_text() {
        let row = QueryRow::new()
            .with("owner", Value::Number(7.0))
            .with("ratio", Value::Number(0.5));
        assert_eq!(row.get_str("OWNER"), Some("7".to_string()));
        assert_eq!(row.get_str("RATIO"), Some("0.5".to_string()));
    }
}
