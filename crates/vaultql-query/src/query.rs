//! Structured query representation
//!
//! This is the engine's input contract: the object an external query parser
//! produces. It deserializes from the parser's camelCase JSON shape.

use crate::resolver::VirtualField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use vaultql_core::Value;

/// Parser spelling of the group-size sort key
pub const GROUP_SIZE_EXPR: &str = "length(rows)";

/// A parsed query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Source scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Source>,

    /// Conditions, AND-ed left to right
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flatten: Option<FlattenClause>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortClause>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<NonZeroUsize>,

    /// Tabular projection; display metadata only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
}

impl Query {
    /// An unrestricted query over every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: scope to a folder and its descendants
    pub fn from_folder<P: Into<String>>(mut self, path: P) -> Self {
        self.from = Some(Source::Folder(path.into()));
        self
    }

    /// Builder: scope to a tag and its sub-tags
    pub fn from_tag<T: Into<String>>(mut self, tag: T) -> Self {
        self.from = Some(Source::Tag(tag.into()));
        self
    }

    /// Builder: add a condition
    pub fn filter<F: Into<String>, V: Into<Value>>(
        mut self,
        field: F,
        operator: Operator,
        value: V,
    ) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    /// Builder: flatten an array field, binding each element to `alias`
    pub fn flatten<F: Into<String>, A: Into<String>>(mut self, field: F, alias: A) -> Self {
        self.flatten = Some(FlattenClause {
            field: field.into(),
            alias: Some(alias.into()),
        });
        self
    }

    /// Builder: group by a field
    pub fn group_by<F: Into<String>>(mut self, field: F) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Builder: sort by a key
    pub fn sort_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some(SortClause { key, direction });
        self
    }

    /// Builder: limit rows (or groups); zero clears the limit
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = NonZeroUsize::new(count);
        self
    }

    /// Builder: add a projected column
    pub fn column(mut self, column: Column) -> Self {
        self.columns.get_or_insert_with(Vec::new).push(column);
        self
    }
}

/// Which records a query considers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Source {
    /// Records under a folder, descendants included
    Folder(String),
    /// Records carrying a tag or one of its sub-tags
    Tag(String),
}

/// A single `where` comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new<F: Into<String>, V: Into<Value>>(field: F, operator: Operator, value: V) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "contains")]
    Contains,
    /// Any spelling the engine does not know; never matches
    #[serde(other)]
    Unknown,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::Unknown => "?",
        }
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "=" | "==" => Operator::Eq,
            "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            s if s.eq_ignore_ascii_case("contains") => Operator::Contains,
            _ => Operator::Unknown,
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flatten an array-valued field into one derived record per element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenClause {
    pub field: String,

    /// Front-matter path the element is bound to; defaults to `field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl FlattenClause {
    /// The front-matter path each element is bound to
    ///
    /// A path naming a virtual field would always resolve to that field, so
    /// it binds under its last segment instead (`file.tags` binds `tags`).
    pub fn alias_name(&self) -> &str {
        let name = self.alias.as_deref().unwrap_or(&self.field);
        match VirtualField::from_path(name) {
            Some(_) => name.rsplit('.').next().unwrap_or(name),
            None => name,
        }
    }
}

/// What a sort orders by
///
/// `GroupSize` is the typed form of the parser's `length(rows)` expression.
/// The two are equivalent on the wire; only this enum is matched on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// A field path, resolved per record (or the group key when grouped)
    Field(String),
    /// Number of rows in a group
    GroupSize,
}

impl SortKey {
    pub fn field<F: Into<String>>(field: F) -> Self {
        SortKey::Field(field.into())
    }
}

impl From<String> for SortKey {
    fn from(expr: String) -> Self {
        let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.eq_ignore_ascii_case(GROUP_SIZE_EXPR) {
            SortKey::GroupSize
        } else {
            SortKey::Field(expr)
        }
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Field(field) => field,
            SortKey::GroupSize => GROUP_SIZE_EXPR.to_string(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ascending", alias = "ASC")]
    Asc,
    #[serde(alias = "descending", alias = "DESC")]
    Desc,
}

/// Sort clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    #[serde(rename = "field")]
    pub key: SortKey,

    #[serde(default)]
    pub direction: SortDirection,
}

/// Aggregate functions available to projected columns in grouped results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Count,
    Sum,
    #[serde(alias = "average")]
    Avg,
    Min,
    Max,
    List,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::List => "list",
        }
    }
}

/// A projected column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateFunction>,
}

impl Column {
    pub fn new<F: Into<String>>(field: F) -> Self {
        Self {
            field: field.into(),
            alias: None,
            aggregate: None,
        }
    }

    /// Builder: set the display alias
    pub fn alias<A: Into<String>>(mut self, alias: A) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Builder: set the aggregate function
    pub fn aggregate(mut self, function: AggregateFunction) -> Self {
        self.aggregate = Some(function);
        self
    }

    /// Header text: the alias, else `fn(field)` or the bare field
    pub fn label(&self) -> String {
        match (&self.alias, self.aggregate) {
            (Some(alias), _) => alias.clone(),
            (None, Some(function)) => format!("{}({})", function.as_str(), self.field),
            (None, None) => self.field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_parser_output() {
        let query: Query = serde_json::from_value(json!({
            "from": { "type": "tag", "value": "#project" },
            "where": [
                { "field": "status", "operator": "=", "value": "done" },
                { "field": "priority", "operator": ">=", "value": 2 }
            ],
            "groupBy": "category",
            "sort": { "field": "length(rows)", "direction": "desc" },
            "limit": 5,
            "columns": [ { "field": "file.name", "aggregate": "count" } ]
        }))
        .unwrap();

        assert_eq!(query.from, Some(Source::Tag("#project".to_string())));
        assert_eq!(query.conditions.len(), 2);
        assert_eq!(query.conditions[1].operator, Operator::Gte);
        assert_eq!(query.group_by.as_deref(), Some("category"));
        assert_eq!(
            query.sort,
            Some(SortClause {
                key: SortKey::GroupSize,
                direction: SortDirection::Desc
            })
        );
        assert_eq!(query.limit.map(NonZeroUsize::get), Some(5));
        assert_eq!(
            query.columns.unwrap()[0].aggregate,
            Some(AggregateFunction::Count)
        );
    }

    #[test]
    fn test_unknown_operator_deserializes() {
        let condition: Condition =
            serde_json::from_value(json!({ "field": "a", "operator": "~=", "value": 1 })).unwrap();
        assert_eq!(condition.operator, Operator::Unknown);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = serde_json::from_value::<Query>(json!({ "limit": 0 }));
        assert!(result.is_err());
        assert_eq!(Query::new().limit(0).limit, None);
    }

    #[test]
    fn test_group_size_sort_key_round_trip() {
        assert_eq!(SortKey::from("length( rows )".to_string()), SortKey::GroupSize);
        assert_eq!(String::from(SortKey::GroupSize), GROUP_SIZE_EXPR);
        assert_eq!(
            SortKey::from("priority".to_string()),
            SortKey::Field("priority".to_string())
        );
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("CONTAINS".parse::<Operator>().unwrap(), Operator::Contains);
        assert_eq!("like".parse::<Operator>().unwrap(), Operator::Unknown);
    }

    #[test]
    fn test_flatten_alias_defaults_to_field() {
        let clause = FlattenClause {
            field: "authors".to_string(),
            alias: None,
        };
        assert_eq!(clause.alias_name(), "authors");
    }

    #[test]
    fn test_flatten_alias_avoids_virtual_fields() {
        let clause = |field: &str, alias: Option<&str>| FlattenClause {
            field: field.to_string(),
            alias: alias.map(str::to_string),
        };
        assert_eq!(clause("file.tags", None).alias_name(), "tags");
        assert_eq!(clause("meta.items", None).alias_name(), "meta.items");
        assert_eq!(clause("authors", Some("file.name")).alias_name(), "name");
        assert_eq!(clause("authors", Some("file.author")).alias_name(), "file.author");
    }

    #[test]
    fn test_column_labels() {
        assert_eq!(Column::new("status").label(), "status");
        assert_eq!(
            Column::new("priority").aggregate(AggregateFunction::Sum).label(),
            "sum(priority)"
        );
        assert_eq!(Column::new("file.name").alias("Note").label(), "Note");
    }
}
