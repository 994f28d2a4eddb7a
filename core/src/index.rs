use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a source document, derived from its location.
///
/// Never empty: the extractor only builds ids from non-empty file names, and
/// the record format has no spelling for an empty id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

/// A term occurring at least once in a document. Emitted once per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Posting {
    pub token: String,
    pub doc_id: DocumentId,
}

/// Final output unit: a term and the distinct documents it occurs in.
/// `doc_ids` is sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub token: String,
    pub doc_ids: Vec<DocumentId>,
}

impl IndexEntry {
    pub fn contains(&self, doc_id: &str) -> bool {
        self.doc_ids.iter().any(|d| d.as_str() == doc_id)
    }
}
