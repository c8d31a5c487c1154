//! Query Execution Engine
//!
//! Runs an execution plan over an immutable record snapshot. Every stage
//! consumes the previous stage's rows and produces new ones; snapshot
//! records are borrowed until a stage needs to derive a changed copy.

use crate::config::EngineConfig;
use crate::evaluator;
use crate::grouping::{self, Group};
use crate::planner::{ExecutionPlan, PipelineStage, QueryPlanner};
use crate::query::{Column, FlattenClause, Query, SortKey, Source};
use crate::resolver;
use crate::result::{ExecutionStats, QueryResult, ResultEntry, ResultGroup};
use crate::sorter;
use std::borrow::Cow;
use std::time::Instant;
use tracing::debug;
use vaultql_core::{DocumentRecord, Value};

/// Run a query over a snapshot
pub fn execute(query: &Query, snapshot: &[DocumentRecord], config: &EngineConfig) -> QueryResult {
    QueryExecutor::new(config.clone()).execute(query, snapshot)
}

/// Query executor
#[derive(Debug, Clone, Default)]
pub struct QueryExecutor {
    config: EngineConfig,
}

impl QueryExecutor {
    /// Create a new query executor
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Plan and execute a query
    pub fn execute(&self, query: &Query, snapshot: &[DocumentRecord]) -> QueryResult {
        let plan = QueryPlanner::with_config(&self.config).plan(query);
        self.execute_plan(&plan, snapshot)
    }

    /// Execute a prepared plan
    pub fn execute_plan(&self, plan: &ExecutionPlan, snapshot: &[DocumentRecord]) -> QueryResult {
        let start = Instant::now();
        let mut stats = ExecutionStats {
            records_scanned: snapshot.len(),
            records_in_scope: snapshot.len(),
            records_after_flatten: snapshot.len(),
            records_matched: snapshot.len(),
            ..Default::default()
        };

        let mut rows: Vec<Cow<'_, DocumentRecord>> = snapshot.iter().map(Cow::Borrowed).collect();
        let mut groups: Option<Vec<Group<'_>>> = None;
        let mut total_count: Option<usize> = None;
        let mut columns: Option<Vec<Column>> = None;
        let mut group_field = "";

        for stage in plan.stages() {
            match stage {
                PipelineStage::Scope(source) => {
                    rows.retain(|record| in_scope(record, source));
                    stats.records_in_scope = rows.len();
                    stats.records_after_flatten = rows.len();
                    stats.records_matched = rows.len();
                }

                PipelineStage::Flatten(clause) => {
                    rows = rows
                        .into_iter()
                        .flat_map(|record| flatten_record(record, clause))
                        .collect();
                    stats.records_after_flatten = rows.len();
                    stats.records_matched = rows.len();
                }

                PipelineStage::Filter(conditions) => {
                    rows.retain(|record| evaluator::matches_all(record, conditions));
                    stats.records_matched = rows.len();
                }

                PipelineStage::Group { field } => {
                    let grouped = grouping::group_records(std::mem::take(&mut rows), field);
                    group_field = field.as_str();
                    stats.groups = grouped.len();
                    groups = Some(grouped);
                }

                PipelineStage::Sort(sort) => match (&mut groups, &sort.key) {
                    (Some(groups), _) => grouping::sort_groups(groups, sort, group_field),
                    (None, SortKey::Field(field)) => {
                        rows = sorter::sort_records(std::mem::take(&mut rows), field, sort.direction);
                    }
                    (None, SortKey::GroupSize) => {
                        debug!("Ignoring group-size sort on ungrouped rows");
                    }
                },

                PipelineStage::Limit(count) => match &mut groups {
                    Some(groups) => {
                        total_count = Some(groups.len());
                        groups.truncate(*count);
                    }
                    None => {
                        total_count = Some(rows.len());
                        rows.truncate(*count);
                    }
                },

                PipelineStage::Project { columns: projected } => {
                    columns = projected.clone();
                }
            }

            debug!(
                "Stage {} -> {} rows, {} groups",
                stage,
                rows.len(),
                groups.as_ref().map(Vec::len).unwrap_or(0)
            );
        }

        let mut result = match groups {
            Some(groups) => {
                let total = total_count.unwrap_or(groups.len());
                let groups = assemble_groups(groups, columns.as_deref());
                QueryResult {
                    success: true,
                    entries: Vec::new(),
                    groups: Some(groups),
                    columns,
                    total_count: total,
                    error: None,
                    stats: None,
                }
            }
            None => {
                let total = total_count.unwrap_or(rows.len());
                QueryResult {
                    success: true,
                    entries: rows.into_iter().map(ResultEntry::from_record).collect(),
                    groups: None,
                    columns,
                    total_count: total,
                    error: None,
                    stats: None,
                }
            }
        };

        stats.rows_returned = result.row_count();
        stats.execution_time_ms = start.elapsed().as_millis() as u64;
        result.stats = Some(stats);
        result
    }
}

/// Scope predicate for a record
pub fn in_scope(record: &DocumentRecord, source: &Source) -> bool {
    match source {
        Source::Folder(path) => {
            let scope = path.trim_matches('/');
            if scope.is_empty() {
                return true;
            }
            let folder = resolver::folder_of(&record.path).trim_matches('/');
            is_self_or_descendant(folder, scope)
        }
        Source::Tag(tag) => {
            let name = tag.strip_prefix('#').unwrap_or(tag);
            record.tags.iter().any(|t| {
                let t = t.strip_prefix('#').unwrap_or(t);
                is_self_or_descendant(t, name)
            })
        }
    }
}

/// `candidate == parent` or `candidate` starts with `parent/`
fn is_self_or_descendant(candidate: &str, parent: &str) -> bool {
    candidate
        .strip_prefix(parent)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Expand one record by its flatten field
///
/// A non-empty array yields one derived record per element; anything else
/// yields exactly one record with the alias bound to the raw value.
pub fn flatten_record<'a>(
    record: Cow<'a, DocumentRecord>,
    clause: &FlattenClause,
) -> Vec<Cow<'a, DocumentRecord>> {
    let alias = clause.alias_name();
    match resolver::resolve(&record, &clause.field) {
        Some(Value::Array(items)) if !items.is_empty() => items
            .into_iter()
            .map(|item| Cow::Owned(derive_record(&record, alias, Some(item))))
            .collect(),
        other => vec![Cow::Owned(derive_record(&record, alias, other))],
    }
}

fn derive_record(record: &DocumentRecord, alias: &str, value: Option<Value>) -> DocumentRecord {
    let mut derived = record.clone();
    resolver::bind_frontmatter(&mut derived.frontmatter, alias, value);
    derived
}

fn assemble_groups(groups: Vec<Group<'_>>, columns: Option<&[Column]>) -> Vec<ResultGroup> {
    groups
        .into_iter()
        .map(|group| {
            let aggregates = columns
                .map(|columns| grouping::aggregate_columns(columns, &group.rows))
                .unwrap_or_default();
            ResultGroup {
                key: group.key,
                rows: group.rows.into_iter().map(ResultEntry::from_record).collect(),
                aggregates,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AggregateFunction, Operator, SortDirection};

    fn run(query: &Query, snapshot: &[DocumentRecord]) -> QueryResult {
        execute(query, snapshot, &EngineConfig::for_testing())
    }

    fn paths(result: &QueryResult) -> Vec<&str> {
        result.entries.iter().map(|e| e.path.as_str()).collect()
    }

    fn vault() -> Vec<DocumentRecord> {
        vec![
            DocumentRecord::new("projects/alpha.md")
                .with_tag("project")
                .with_field("status", "Done")
                .with_field("category", "A")
                .with_field("priority", 3i64),
            DocumentRecord::new("projects/archive/beta.md")
                .with_tag("#project/old")
                .with_field("status", "todo")
                .with_field("category", "B")
                .with_field("priority", 1i64),
            DocumentRecord::new("projectsX/gamma.md")
                .with_tag("projects")
                .with_field("status", "done")
                .with_field("category", "A"),
            DocumentRecord::new("inbox.md").with_field("category", "A"),
        ]
    }

    #[test]
    fn test_no_stages_returns_everything() {
        let snapshot = vault();
        let result = run(&Query::new(), &snapshot);
        assert!(result.success);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.entries.len(), 4);
        assert!(result.groups.is_none());
        assert!(result.columns.is_none());
    }

    #[test]
    fn test_folder_scope_includes_descendants_only() {
        let snapshot = vault();
        let result = run(&Query::new().from_folder("/projects/"), &snapshot);
        assert_eq!(paths(&result), vec!["projects/alpha.md", "projects/archive/beta.md"]);

        let root = run(&Query::new().from_folder("/"), &snapshot);
        assert_eq!(root.total_count, 4);
    }

    #[test]
    fn test_tag_scope_includes_subtags() {
        let snapshot = vault();
        let result = run(&Query::new().from_tag("#project"), &snapshot);
        assert_eq!(paths(&result), vec!["projects/alpha.md", "projects/archive/beta.md"]);
    }

    #[test]
    fn test_filter_then_sort_then_limit() {
        let snapshot = vault();
        let query = Query::new()
            .filter("category", Operator::Eq, "a")
            .sort_by(SortKey::field("priority"), SortDirection::Desc)
            .limit(2);
        let result = run(&query, &snapshot);
        assert_eq!(result.total_count, 3);
        assert_eq!(paths(&result), vec!["projects/alpha.md", "projectsX/gamma.md"]);

        let stats = result.stats.unwrap();
        assert_eq!(stats.records_scanned, 4);
        assert_eq!(stats.records_matched, 3);
        assert_eq!(stats.rows_returned, 2);
    }

    #[test]
    fn test_flatten_before_filter() {
        let snapshot = vec![
            DocumentRecord::new("a.md").with_field("authors", Value::from(vec!["ana", "bo"])),
            DocumentRecord::new("b.md").with_field("authors", "cy"),
            DocumentRecord::new("c.md"),
        ];
        let query = Query::new()
            .flatten("authors", "author")
            .filter("author", Operator::NotEq, "ana");
        let result = run(&query, &snapshot);

        let authors: Vec<Option<&Value>> = result
            .entries
            .iter()
            .map(|e| e.frontmatter.get("author"))
            .collect();
        assert_eq!(
            authors,
            vec![Some(&Value::from("bo")), Some(&Value::from("cy")), None]
        );
        assert_eq!(result.stats.unwrap().records_after_flatten, 4);
    }

    #[test]
    fn test_flatten_empty_array_keeps_record() {
        let snapshot = vec![DocumentRecord::new("a.md").with_field("tags", Value::Array(vec![]))];
        let result = run(&Query::new().flatten("tags", "tag"), &snapshot);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].frontmatter["tag"], Value::Array(vec![]));
    }

    #[test]
    fn test_flatten_does_not_touch_snapshot() {
        let snapshot = vec![DocumentRecord::new("a.md").with_field("xs", Value::from(vec![1i64, 2]))];
        let before = snapshot.clone();
        let _ = run(&Query::new().flatten("xs", "x"), &snapshot);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_grouped_result() {
        let snapshot = vault();
        let query = Query::new()
            .group_by("category")
            .sort_by(SortKey::GroupSize, SortDirection::Desc)
            .limit(1)
            .column(Column::new("priority").aggregate(AggregateFunction::Sum));
        let result = run(&query, &snapshot);

        assert!(result.entries.is_empty());
        assert_eq!(result.total_count, 2);
        let groups = result.groups.as_ref().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key.as_deref(), Some("A"));
        assert_eq!(groups[0].rows.len(), 3);
        assert_eq!(groups[0].aggregates[0].value, Value::Integer(3));
        assert_eq!(result.columns.as_ref().unwrap().len(), 1);
        assert_eq!(result.stats.as_ref().unwrap().groups, 2);
    }

    #[test]
    fn test_undefined_group_key_is_absent() {
        let snapshot = vault();
        let result = run(&Query::new().group_by("priority"), &snapshot);
        let groups = result.groups.unwrap();
        let keys: Vec<Option<&str>> = groups.iter().map(|g| g.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("3"), Some("1"), None]);
    }

    #[test]
    fn test_columns_do_not_filter_frontmatter() {
        let snapshot = vault();
        let query = Query::new().column(Column::new("status"));
        let result = run(&query, &snapshot);
        assert!(result.entries[0].frontmatter.contains_key("priority"));
        assert_eq!(result.columns.unwrap()[0].field, "status");
    }

    #[test]
    fn test_group_size_sort_on_rows_is_ignored() {
        let snapshot = vault();
        let query = Query::new().sort_by(SortKey::GroupSize, SortDirection::Desc);
        let result = run(&query, &snapshot);
        assert_eq!(result.entries[0].path, "projects/alpha.md");
    }

    #[test]
    fn test_in_scope_sibling_prefix_is_not_descendant() {
        let record = DocumentRecord::new("projectsX/gamma.md").with_tag("projects");
        assert!(!in_scope(&record, &Source::Folder("projects".to_string())));
        assert!(!in_scope(&record, &Source::Tag("project".to_string())));
    }

    fn group_keys(result: &QueryResult) -> Vec<Option<&str>> {
        result
            .groups
            .as_ref()
            .map(|groups| groups.iter().map(|g| g.key.as_deref()).collect())
            .unwrap_or_default()
    }

    fn flatten_without_alias(field: &str) -> Query {
        Query {
            flatten: Some(FlattenClause {
                field: field.to_string(),
                alias: None,
            }),
            ..Query::default()
        }
    }

    #[test]
    fn test_flatten_virtual_field_binds_last_segment() {
        let snapshot = vec![DocumentRecord::new("a.md").with_tag("x").with_tag("y")];
        let result = run(&flatten_without_alias("file.tags").group_by("tags"), &snapshot);
        assert_eq!(group_keys(&result), vec![Some("x"), Some("y")]);
    }

    #[test]
    fn test_flatten_nested_field_reads_back() {
        let mut meta = std::collections::BTreeMap::new();
        meta.insert("items".to_string(), Value::from(vec!["p", "q"]));
        let snapshot = vec![DocumentRecord::new("a.md").with_field("meta", Value::Map(meta))];

        let grouped = run(&flatten_without_alias("meta.items").group_by("meta.items"), &snapshot);
        assert_eq!(group_keys(&grouped), vec![Some("p"), Some("q")]);

        let filtered = run(
            &flatten_without_alias("meta.items").filter("meta.items", Operator::Eq, "q"),
            &snapshot,
        );
        assert_eq!(filtered.entries.len(), 1);
        let meta = filtered.entries[0].frontmatter["meta"].as_map().unwrap();
        assert_eq!(meta["items"], Value::from("q"));
    }

    #[test]
    fn test_flatten_dotted_alias_is_nested() {
        let snapshot = vec![DocumentRecord::new("a.md").with_field("xs", Value::from(vec![1i64, 2]))];
        let query = Query::new()
            .flatten("xs", "item.value")
            .filter("item.value", Operator::Gt, 1i64);
        let result = run(&query, &snapshot);
        assert_eq!(result.entries.len(), 1);
    }

    #[test]
    fn test_grouped_sort_by_other_field_uses_key() {
        let snapshot = vault();
        let query = Query::new()
            .group_by("category")
            .sort_by(SortKey::field("priority"), SortDirection::Desc);
        let result = run(&query, &snapshot);
        assert_eq!(group_keys(&result), vec![Some("B"), Some("A")]);
    }
}
