//! Query results
//!
//! A result is either a flat entry list or a group list, never both. The
//! serialized shape is uniform for callers: `entries` is always present
//! (empty when grouped) and a failure carries no partial rows.

use crate::query::Column;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use vaultql_core::{DocumentRecord, Value};

/// One result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub path: String,
    pub name: String,

    /// Full front matter of the (possibly derived) record
    pub frontmatter: BTreeMap<String, Value>,
}

impl ResultEntry {
    /// Project a record into an entry, consuming it when owned
    pub fn from_record(record: Cow<'_, DocumentRecord>) -> Self {
        match record {
            Cow::Owned(record) => Self {
                path: record.path,
                name: record.name,
                frontmatter: record.frontmatter,
            },
            Cow::Borrowed(record) => Self {
                path: record.path.clone(),
                name: record.name.clone(),
                frontmatter: record.frontmatter.clone(),
            },
        }
    }
}

/// A labelled aggregate computed over one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateValue {
    pub label: String,
    pub value: Value,
}

/// One group of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    /// Stringified group value; absent for the undefined bucket
    pub key: Option<String>,

    pub rows: Vec<ResultEntry>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<AggregateValue>,
}

/// Per-execution counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub records_scanned: usize,
    pub records_in_scope: usize,
    pub records_after_flatten: usize,
    pub records_matched: usize,
    pub groups: usize,
    pub rows_returned: usize,
    pub execution_time_ms: u64,
}

/// Outcome of executing a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,

    pub entries: Vec<ResultEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ResultGroup>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,

    /// Rows (or groups) before the limit was applied
    pub total_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ExecutionStats>,
}

impl QueryResult {
    /// A failed execution
    pub fn failure<E: Into<String>>(error: E) -> Self {
        Self {
            success: false,
            entries: Vec::new(),
            groups: None,
            columns: None,
            total_count: 0,
            error: Some(error.into()),
            stats: None,
        }
    }

    /// True for grouped results
    pub fn is_grouped(&self) -> bool {
        self.groups.is_some()
    }

    /// Number of rows returned, across groups when grouped
    pub fn row_count(&self) -> usize {
        match &self.groups {
            Some(groups) => groups.iter().map(|g| g.rows.len()).sum(),
            None => self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_shape() {
        let result = QueryResult::failure("store unreachable");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "success": false,
                "entries": [],
                "totalCount": 0,
                "error": "store unreachable"
            })
        );
    }

    #[test]
    fn test_entry_from_borrowed_and_owned() {
        let record = DocumentRecord::new("a.md").with_field("k", "v");
        let borrowed = ResultEntry::from_record(Cow::Borrowed(&record));
        let owned = ResultEntry::from_record(Cow::Owned(record.clone()));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.name, "a.md");
        assert_eq!(owned.frontmatter["k"], Value::from("v"));
    }

    #[test]
    fn test_row_count_across_groups() {
        let entry = ResultEntry::from_record(Cow::Owned(DocumentRecord::new("a.md")));
        let result = QueryResult {
            success: true,
            entries: Vec::new(),
            groups: Some(vec![
                ResultGroup {
                    key: Some("x".to_string()),
                    rows: vec![entry.clone(), entry.clone()],
                    aggregates: Vec::new(),
                },
                ResultGroup {
                    key: None,
                    rows: vec![entry],
                    aggregates: Vec::new(),
                },
            ]),
            columns: None,
            total_count: 2,
            error: None,
            stats: None,
        };
        assert!(result.is_grouped());
        assert_eq!(result.row_count(), 3);
    }
}
