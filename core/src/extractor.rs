//! Map side of the index job: turns lines of one document into postings.

use std::io::BufRead;
use std::path::Path;

use crate::error::{IndexError, Result};
use crate::index::{DocumentId, Posting};
use crate::tokenizer::tokenize;

/// Per-partition context, resolved once before the first line is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionContext {
    doc_id: DocumentId,
}

impl PartitionContext {
    pub fn new(doc_id: DocumentId) -> Self { Self { doc_id } }

    /// Derive the document id from the partition's source location (its file name).
    pub fn from_source<P: AsRef<Path>>(source: P) -> Result<Self> {
        let source = source.as_ref();
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| IndexError::MissingDocumentId(source.to_path_buf()))?;
        Ok(Self::new(DocumentId::new(name)))
    }

    pub fn doc_id(&self) -> &DocumentId { &self.doc_id }
}

/// Emit one posting per non-empty token in `line`, attributed to the partition's document.
pub fn extract<'a>(ctx: &'a PartitionContext, line: &'a str) -> impl Iterator<Item = Posting> + 'a {
    tokenize(line).map(move |token| Posting { token, doc_id: ctx.doc_id.clone() })
}

/// Run a whole partition through [`extract`], line by line.
pub fn extract_partition<R: BufRead>(ctx: &PartitionContext, reader: R) -> Result<Vec<Posting>> {
    let mut postings = Vec::new();
    for line in reader.lines() {
        let line = line?;
        postings.extend(extract(ctx, &line));
    }
    Ok(postings)
}
