//! Best-effort statement classification.
//!
//! Pattern matching over normalized SQL text, not a grammar. Never fails:
//! anything it cannot make sense of comes back as `Operation::Unknown` /
//! `TableRef::Unknown`.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Operation, TableRef};

/// Prefix of the SQL text placeholder returned by the reduced-privilege query.
pub const SQL_UNAVAILABLE_PREFIX: &str = "N/A";

// Identifier: letters, digits, `_`, `$`, dots for schema qualification,
// double quotes (stripped afterwards).
const IDENT: &str = r#"([A-Z0-9_$."]+)"#;

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| build(r"(?s)/\*.*?\*/"));
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| build(r"--[^\n]*"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| build(r"\s+"));
static OPERATION: LazyLock<Regex> =
    LazyLock::new(|| build(r"\b(SELECT|INSERT|UPDATE|DELETE|MERGE)\b"));

static INTO_TABLE: LazyLock<Regex> = LazyLock::new(|| build(&format!(r"\bINTO\s+{IDENT}")));
static UPDATE_TABLE: LazyLock<Regex> = LazyLock::new(|| build(&format!(r"\bUPDATE\s+{IDENT}")));
static FROM_TABLE: LazyLock<Regex> = LazyLock::new(|| build(&format!(r"\bFROM\s+{IDENT}")));
static MERGE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| build(&format!(r"\bMERGE\s+INTO\s+{IDENT}")));
static ANY_TABLE: LazyLock<Regex> =
    LazyLock::new(|| build(&format!(r"\b(?:INTO|UPDATE|FROM)\s+{IDENT}")));

// Patterns are literals; an invalid one is a programming error caught by the tests below.
fn build(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {pattern:?}: {e}"))
}

/// Statement kind and main table of a piece of SQL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub operation: Operation,
    pub main_table: TableRef,
}

/// Strips comments (optimizer hints included), collapses whitespace, upper-cases and trims.
pub fn normalize(sql: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(sql, " ");
    let without_lines = LINE_COMMENT.replace_all(&without_blocks, " ");
    WHITESPACE
        .replace_all(&without_lines, " ")
        .trim()
        .to_uppercase()
}

/// Classifies raw SQL text.
pub fn classify(sql: &str) -> Classification {
    let text = normalize(sql);
    if text.is_empty() || text.starts_with(SQL_UNAVAILABLE_PREFIX) {
        return Classification::default();
    }

    let operation = OPERATION
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| Operation::from_keyword(m.as_str()))
        .unwrap_or_default();

    let primary: &Regex = match operation {
        Operation::Insert => &INTO_TABLE,
        Operation::Update => &UPDATE_TABLE,
        Operation::Merge => &MERGE_TABLE,
        Operation::Delete | Operation::Select | Operation::Unknown => &FROM_TABLE,
    };

    let main_table = first_table(primary, &text)
        .or_else(|| first_table(&ANY_TABLE, &text))
        .map(TableRef::Named)
        .unwrap_or_default();

    Classification {
        operation,
        main_table,
    }
}

fn first_table(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace('"', ""))
        .find(|name| !name.is_empty() && name.chars().any(|c| c != '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TableRef {
        TableRef::Named(name.to_string())
    }

    #[test]
    fn select_with_schema_qualified_table() {
        let c = classify("SELECT * FROM SCHEMA.ORDERS WHERE id = 1");
        assert_eq!(c.operation, Operation::Select);
        assert_eq!(c.main_table, named("SCHEMA.ORDERS"));
    }

    #[test]
    fn insert_after_block_comment() {
        let c = classify("/* hint */ INSERT INTO LOGS(a,b) VALUES (1,2)");
        assert_eq!(c.operation, Operation::Insert);
        assert_eq!(c.main_table, named("LOGS"));
    }

    #[test]
    fn empty_and_unavailable_text_are_unknown() {
        assert_eq!(classify(""), Classification::default());
        assert_eq!(classify("   \n\t"), Classification::default());
        let c = classify("N/A (no permission on v$sql)");
        assert_eq!(c.operation, Operation::Unknown);
        assert!(c.main_table.is_unknown());
    }

    #[test]
    fn lowercase_input_is_normalized() {
        let c = classify("update hr.employees set salary = salary * 1.1");
        assert_eq!(c.operation, Operation::Update);
        assert_eq!(c.main_table, named("HR.EMPLOYEES"));
    }

    #[test]
    fn delete_uses_from_clause() {
        let c = classify("DELETE FROM audit_trail WHERE ts < SYSDATE - 30");
        assert_eq!(c.operation, Operation::Delete);
        assert_eq!(c.main_table, named("AUDIT_TRAIL"));
    }

    #[test]
    fn merge_uses_merge_into() {
        let c = classify(
            "MERGE INTO sales.targets t USING staging s ON (t.id = s.id) \
             WHEN MATCHED THEN UPDATE SET t.v = s.v",
        );
        assert_eq!(c.operation, Operation::Merge);
        assert_eq!(c.main_table, named("SALES.TARGETS"));
    }

    #[test]
    fn optimizer_hint_and_line_comments_are_ignored() {
        let sql = "-- nightly batch\nSELECT /*+ FULL(o) PARALLEL(4) */ o.id\n  FROM orders o -- main\n";
        let c = classify(sql);
        assert_eq!(c.operation, Operation::Select);
        assert_eq!(c.main_table, named("ORDERS"));
    }

    #[test]
    fn operation_found_after_leading_cte() {
        let c = classify("WITH recent AS (SELECT id FROM events) SELECT * FROM recent");
        assert_eq!(c.operation, Operation::Select);
        assert_eq!(c.main_table, named("EVENTS"));
    }

    #[test]
    fn quotes_are_stripped_from_table_names() {
        let c = classify(r#"SELECT * FROM "App"."Order$Lines""#);
        assert_eq!(c.main_table, named("APP.ORDER$LINES"));
    }

    #[test]
    fn subquery_in_from_falls_through_to_inner_table() {
        let c = classify("SELECT x FROM (SELECT x FROM inventory) WHERE x > 1");
        assert_eq!(c.main_table, named("INVENTORY"));
    }

    #[test]
    fn unknown_operation_still_falls_back_to_any_table_keyword() {
        let c = classify("LOCK TABLE x IN EXCLUSIVE MODE; CALL p INTO result_tab");
        assert_eq!(c.operation, Operation::Unknown);
        assert_eq!(c.main_table, named("RESULT_TAB"));
    }

    #[test]
    fn operation_without_table_is_unknown_table() {
        let c = classify("SELECT 1");
        assert_eq!(c.operation, Operation::Select);
        assert!(c.main_table.is_unknown());
    }

    #[test]
    fn column_names_containing_keywords_do_not_match() {
        let c = classify("BEGIN pkg.run(p_updated_at => SYSDATE); END;");
        assert_eq!(c.operation, Operation::Unknown);
        assert!(c.main_table.is_unknown());
    }

    #[test]
    fn garbage_never_panics() {
        for input in ["/*", "*/", "--", "\"\"", "FROM", "INTO \"\"", "FROM ...", "\u{0}\u{ffff}"] {
            let _ = classify(input);
        }
        assert!(classify("FROM \"\"").main_table.is_unknown());
    }
}
