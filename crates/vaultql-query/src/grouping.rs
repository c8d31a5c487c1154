//! Grouping and group-level aggregation

use crate::query::{AggregateFunction, Column, SortClause, SortDirection, SortKey};
use crate::resolver;
use crate::result::AggregateValue;
use crate::sorter::{compare_defined, compare_sort_values};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;
use vaultql_core::{DocumentRecord, Value};

/// A bucket of records sharing a group key
#[derive(Debug, Clone)]
pub struct Group<'a> {
    /// Stringified key; `None` for records whose group field is undefined
    pub key: Option<String>,

    /// The value the key was computed from, used for ordering
    pub key_value: Option<Value>,

    pub rows: Vec<Cow<'a, DocumentRecord>>,
}

/// Bucket records by the resolved value of `field`
///
/// Buckets appear in order of first appearance; rows keep their input order.
pub fn group_records<'a>(records: Vec<Cow<'a, DocumentRecord>>, field: &str) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut index: HashMap<Option<String>, usize> = HashMap::new();

    for record in records {
        let key_value = resolver::resolve(&record, field).filter(|v| !v.is_null());
        let key = key_value.as_ref().map(Value::to_display_string);

        match index.get(&key).copied() {
            Some(i) => groups[i].rows.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    key_value,
                    rows: vec![record],
                });
            }
        }
    }

    groups
}

/// Order groups by key or by size
///
/// A field sort always orders by the group key, whichever field it names.
pub fn sort_groups(groups: &mut [Group<'_>], sort: &SortClause, group_field: &str) {
    if let SortKey::Field(field) = &sort.key {
        if field != group_field {
            debug!("Sorting groups by key {}; sort field {} is ignored", group_field, field);
        }
    }

    match &sort.key {
        SortKey::GroupSize => groups.sort_by(|a, b| {
            let ordering = a.rows.len().cmp(&b.rows.len());
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }),
        SortKey::Field(_) => groups.sort_by(|a, b| {
            compare_sort_values(a.key_value.as_ref(), b.key_value.as_ref(), sort.direction)
        }),
    }
}

/// Compute every aggregate column over a group's rows
pub fn aggregate_columns(columns: &[Column], rows: &[Cow<'_, DocumentRecord>]) -> Vec<AggregateValue> {
    columns
        .iter()
        .filter_map(|column| {
            column.aggregate.map(|function| AggregateValue {
                label: column.label(),
                value: aggregate(function, &column.field, rows),
            })
        })
        .collect()
}

/// Apply one aggregate function to a field across rows
pub fn aggregate(function: AggregateFunction, field: &str, rows: &[Cow<'_, DocumentRecord>]) -> Value {
    let values: Vec<Value> = rows
        .iter()
        .filter_map(|row| resolver::resolve(row, field))
        .filter(|v| !v.is_null())
        .collect();

    match function {
        AggregateFunction::Count => Value::Integer(values.len() as i64),
        AggregateFunction::Sum => sum(&values),
        AggregateFunction::Avg => {
            let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggregateFunction::Min => extreme(values, Ordering::Less),
        AggregateFunction::Max => extreme(values, Ordering::Greater),
        AggregateFunction::List => Value::Array(values),
    }
}

fn sum(values: &[Value]) -> Value {
    // Stay integral while every addend is an integer and nothing overflows
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0;

    for value in values {
        let Some(n) = value.as_number() else {
            continue;
        };
        float_total += n;
        int_total = match (int_total, value) {
            (Some(acc), Value::Integer(i)) => acc.checked_add(*i),
            _ => None,
        };
    }

    match int_total {
        Some(total) => Value::Integer(total),
        None => Value::Float(float_total),
    }
}

fn extreme(values: Vec<Value>, keep: Ordering) -> Value {
    values
        .into_iter()
        .reduce(|best, candidate| {
            if compare_defined(&candidate, &best) == keep {
                candidate
            } else {
                best
            }
        })
        .unwrap_or(Value::Null)
}
