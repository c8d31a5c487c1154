//! Indexed document records
//!
//! One record per vault document, as persisted by the index builder. Records
//! are read-only inputs to the query engine; the engine derives new records
//! (flatten) but never mutates a snapshot in place.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Hash of a document's raw content, used by stores for change detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(u64);

impl ContentHash {
    /// Hash raw document bytes
    pub fn of(content: &[u8]) -> Self {
        Self(xxh3_64(content))
    }

    /// Get the raw digest
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(hex: String) -> std::result::Result<Self, Self::Error> {
        u64::from_str_radix(&hex, 16)
            .map(ContentHash)
            .map_err(|e| format!("invalid content hash {:?}: {}", hex, e))
    }
}

/// An outbound link found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutLink {
    /// Target path as written in the document
    pub target: String,

    /// Alias text (`[[target|display]]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Whether the link is an embed (`![[target]]`)
    #[serde(default)]
    pub embed: bool,
}

impl OutLink {
    /// A plain link to `target`
    pub fn new<T: Into<String>>(target: T) -> Self {
        Self {
            target: target.into(),
            display: None,
            embed: false,
        }
    }

    /// An embed of `target`
    pub fn embedded<T: Into<String>>(target: T) -> Self {
        Self {
            embed: true,
            ..Self::new(target)
        }
    }

    /// Builder: set alias text
    pub fn with_display<D: Into<String>>(mut self, display: D) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// Extracted metadata of one vault document
///
/// Identity is the `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Vault-relative file path
    pub path: String,

    /// Display name (usually the file name)
    #[serde(default)]
    pub name: String,

    /// Content hash for incremental re-indexing
    #[serde(default)]
    pub content_hash: ContentHash,

    /// Tags in document order, duplicates permitted
    #[serde(default)]
    pub tags: Vec<String>,

    /// Outbound links in document order
    #[serde(default)]
    pub links: Vec<OutLink>,

    /// Parsed front-matter
    #[serde(default)]
    pub frontmatter: BTreeMap<String, Value>,
}

impl DocumentRecord {
    /// Create an empty record; the name defaults to the final path segment
    pub fn new<P: Into<String>>(path: P) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            name,
            content_hash: ContentHash::default(),
            tags: Vec::new(),
            links: Vec::new(),
            frontmatter: BTreeMap::new(),
        }
    }

    /// Builder: override the display name
    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: hash the given raw content
    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.content_hash = ContentHash::of(content);
        self
    }

    /// Builder: append a tag
    pub fn with_tag<T: Into<String>>(mut self, tag: T) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder: append an outbound link
    pub fn with_link(mut self, link: OutLink) -> Self {
        self.links.push(link);
        self
    }

    /// Builder: set a front-matter field
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.frontmatter.insert(key.into(), value.into());
        self
    }
}
