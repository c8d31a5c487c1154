//! Result sorting
//!
//! Sorts are stable. Absent values go last in both directions; the
//! direction only flips the order among defined values.

use crate::query::SortDirection;
use crate::resolver;
use std::borrow::Cow;
use std::cmp::Ordering;
use vaultql_core::{DocumentRecord, Value};

/// Compare two sort keys
pub fn compare_sort_values(
    a: Option<&Value>,
    b: Option<&Value>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_defined(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Ascending order of two defined values
pub fn compare_defined(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_display_string().cmp(&b.to_display_string()),
    }
}

/// Sort records by a resolved field
///
/// Keys are resolved once per record, not once per comparison.
pub fn sort_records<'a>(
    records: Vec<Cow<'a, DocumentRecord>>,
    field: &str,
    direction: SortDirection,
) -> Vec<Cow<'a, DocumentRecord>> {
    let mut keyed: Vec<_> = records
        .into_iter()
        .map(|record| (resolver::resolve(&record, field), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_sort_values(a.as_ref(), b.as_ref(), direction));

    keyed.into_iter().map(|(_, record)| record).collect()
}
