//! `QueryExecutor` backed by a live Oracle session.

use oracle::sql_type::OracleType;
use oracle::{Connection, Row};
use tracing::debug;

use crate::config::{ConnectError, ConnectionDetails};

use super::traits::{QueryError, QueryExecutor, QueryRow, Value};

/// A single Oracle session used for sampling.
pub struct OracleExecutor {
    conn: Connection,
}

impl OracleExecutor {
    /// Opens a session with the given details.
    pub fn connect(details: &ConnectionDetails) -> Result<Self, ConnectError> {
        let connect_string = details.resolve_connect_string()?;
        let conn = Connection::connect(&details.user, &details.password, &connect_string)
            .map_err(|e| ConnectError::Driver(e.to_string()))?;
        debug!(connect_string = %connect_string, user = %details.user, "oracle session opened");
        Ok(Self { conn })
    }
}

impl QueryExecutor for OracleExecutor {
    fn execute(&mut self, sql: &str) -> Result<Vec<QueryRow>, QueryError> {
        let rows = self
            .conn
            .query(sql, &[])
            .map_err(|e| QueryError::new(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(|e| QueryError::new(e.to_string()))?;
            out.push(convert_row(&row).map_err(|e| QueryError::new(e.to_string()))?);
        }
        Ok(out)
    }

    fn close(&mut self) -> Result<(), QueryError> {
        self.conn
            .close()
            .map_err(|e| QueryError::new(e.to_string()))
    }
}

fn convert_row(row: &Row) -> Result<QueryRow, oracle::Error> {
    let mut out = QueryRow::new();
    for (info, value) in row.column_info().iter().zip(row.sql_values()) {
        let converted = match info.oracle_type() {
            OracleType::Number(_, _)
            | OracleType::Float(_)
            | OracleType::BinaryFloat
            | OracleType::BinaryDouble
            | OracleType::Int64
            | OracleType::UInt64 => value.get::<Option<f64>>()?.map(Value::Number),
            _ => value.get::<Option<String>>()?.map(Value::Text),
        };
        out.insert(info.name(), converted.unwrap_or_default());
    }
    Ok(out)
}
