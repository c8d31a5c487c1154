//! Field resolution
//!
//! Two tiers: the fixed table of `file.*` virtual fields is consulted first,
//! then the path is walked segment by segment through the front matter.
//! Resolution is total; a miss is `None`, never an error.

use std::collections::BTreeMap;
use vaultql_core::{DocumentRecord, Link, Value};

/// Computed fields available on every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualField {
    Name,
    Path,
    Link,
    Folder,
    Tags,
    Outlinks,
    Inlinks,
}

/// Lookup table of virtual field paths
pub const VIRTUAL_FIELDS: [(&str, VirtualField); 7] = [
    ("file.name", VirtualField::Name),
    ("file.path", VirtualField::Path),
    ("file.link", VirtualField::Link),
    ("file.folder", VirtualField::Folder),
    ("file.tags", VirtualField::Tags),
    ("file.outlinks", VirtualField::Outlinks),
    ("file.inlinks", VirtualField::Inlinks),
];

impl VirtualField {
    /// Look up a virtual field by its exact path
    pub fn from_path(field_path: &str) -> Option<Self> {
        VIRTUAL_FIELDS
            .iter()
            .find(|(path, _)| *path == field_path)
            .map(|(_, field)| *field)
    }

    /// Compute the field for a record
    pub fn resolve(self, record: &DocumentRecord) -> Value {
        match self {
            VirtualField::Name => Value::String(file_name(record).to_string()),
            VirtualField::Path => Value::String(record.path.clone()),
            VirtualField::Link => Value::Link(
                Link::new(record.path.clone()).with_display(file_name(record)),
            ),
            VirtualField::Folder => Value::String(folder_of(&record.path).to_string()),
            VirtualField::Tags => {
                Value::Array(record.tags.iter().cloned().map(Value::String).collect())
            }
            VirtualField::Outlinks => Value::Array(
                record
                    .links
                    .iter()
                    .map(|link| Value::String(link.target.clone()))
                    .collect(),
            ),
            // Backlinks need the whole vault; they are supplied externally if at all
            VirtualField::Inlinks => Value::Array(Vec::new()),
        }
    }
}

/// Record name with a trailing `.md` removed
pub fn file_name(record: &DocumentRecord) -> &str {
    record.name.strip_suffix(".md").unwrap_or(&record.name)
}

/// Containing folder of a path; `"/"` for the vault root
pub fn folder_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) if idx > 0 => &path[..idx],
        _ => "/",
    }
}

/// Resolve a dotted field path against a record
pub fn resolve(record: &DocumentRecord, field_path: &str) -> Option<Value> {
    if let Some(field) = VirtualField::from_path(field_path) {
        return Some(field.resolve(record));
    }
    resolve_frontmatter(&record.frontmatter, field_path).cloned()
}

/// Walk a dotted path through a front-matter map
pub fn resolve_frontmatter<'a>(
    frontmatter: &'a BTreeMap<String, Value>,
    field_path: &str,
) -> Option<&'a Value> {
    let mut segments = field_path.split('.');
    let mut current = frontmatter.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// Bind a value at a dotted front-matter path, or unbind it with `None`
///
/// Missing or non-map parents are replaced by maps when binding, so the
/// value always resolves back through `resolve_frontmatter`.
pub fn bind_frontmatter(
    frontmatter: &mut BTreeMap<String, Value>,
    field_path: &str,
    value: Option<Value>,
) {
    let (parents, leaf) = match field_path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, field_path),
    };

    let mut current = frontmatter;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        if value.is_none() {
            match current.get_mut(segment) {
                Some(Value::Map(map)) => current = map,
                _ => return,
            }
            continue;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Map(BTreeMap::new()));
        if entry.as_map().is_none() {
            *entry = Value::Map(BTreeMap::new());
        }
        current = match entry {
            Value::Map(map) => map,
            _ => return,
        };
    }

    match value {
        Some(value) => {
            current.insert(leaf.to_string(), value);
        }
        None => {
            current.remove(leaf);
        }
    }
}
