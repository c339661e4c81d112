//! Session, score and snapshot models shared by the sampler and its callers.
//!
//! - [`RawSessionRow`] is one active session as returned by a query.
//! - [`ScoredSession`] adds parsed SQL, volume estimate, impact tier and CPU share.
//! - [`Snapshot`] is the outcome of one poll.

mod session;
mod snapshot;

pub use session::*;
pub use snapshot::*;

use serde::{Serialize, Serializer};

/// Label used for a table name that could not be extracted from SQL text.
pub const UNKNOWN_TABLE_LABEL: &str = "(desconhecida)";

/// Label used when no session in a poll has a known table.
pub const NOT_APPLICABLE_LABEL: &str = "N/A";

/// Statement kind detected in a session's SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Operation {
    #[serde(rename = "SELECT")]
    Select,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "MERGE")]
    Merge,
    /// No statement keyword found, or SQL text unavailable.
    #[default]
    #[serde(rename = "N/A")]
    Unknown,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
            Self::Unknown => "N/A",
        }
    }

    /// Parses an upper-case statement keyword. Anything else is `Unknown`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "MERGE" => Self::Merge,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main table touched by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TableRef {
    /// Table name, possibly schema-qualified (`SCHEMA.TABLE`), quotes stripped.
    Named(String),
    /// Nothing matched in the SQL text.
    #[default]
    Unknown,
}

impl TableRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Unknown => UNKNOWN_TABLE_LABEL,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TableRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Most frequent main table across a poll.
///
/// Kept apart from [`TableRef::Unknown`]: "could not parse" and
/// "nothing to report" are different answers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopTable {
    Named(String),
    #[default]
    NotApplicable,
}

impl TopTable {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NotApplicable => NOT_APPLICABLE_LABEL,
        }
    }
}

impl std::fmt::Display for TopTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TopTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Coarse impact level of a session. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum ImpactTier {
    #[default]
    #[serde(rename = "Baixo")]
    Low,
    #[serde(rename = "Médio")]
    Medium,
    #[serde(rename = "Alto")]
    High,
}

impl ImpactTier {
    /// Label shown in the operator interface.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Baixo",
            Self::Medium => "Médio",
            Self::High => "Alto",
        }
    }

    /// Parses either the interface label or the English name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "baixo" | "low" => Some(Self::Low),
            "médio" | "medio" | "medium" => Some(Self::Medium),
            "alto" | "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which session-detail query produced a poll's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Full query joined with SQL statistics.
    #[default]
    Primary,
    /// Reduced-privilege query without SQL statistics.
    Fallback,
}

impl QueryMode {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}
