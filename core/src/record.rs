//! Text record format for index entries: `term<TAB>id1,id2,...`.
//!
//! Identifiers are escaped so the list can be split back unambiguously:
//! `\` becomes `\\`, `,` becomes `\,`, TAB becomes `\t`, newline `\n` and
//! carriage return `\r`. Identifiers without those characters are written
//! verbatim.
//!
//! Identifiers are never empty, so an empty list field means no identifiers
//! and an empty element inside a list is rejected as malformed.

use crate::error::{IndexError, Result};
use crate::index::{DocumentId, IndexEntry};

const KEY_SEP: char = '\t';
const ID_SEP: char = ',';

fn escape_into(out: &mut String, id: &str) {
    for c in id.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

fn malformed(line: &str, reason: &str) -> IndexError {
    IndexError::MalformedRecord { line: line.to_string(), reason: reason.to_string() }
}

fn take_id(line: &str, cur: &mut String) -> Result<DocumentId> {
    if cur.is_empty() {
        return Err(malformed(line, "empty document id"));
    }
    Ok(DocumentId::new(std::mem::take(cur)))
}

fn split_ids(line: &str, field: &str) -> Result<Vec<DocumentId>> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    let mut cur = String::new();
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => cur.push('\\'),
                Some(',') => cur.push(','),
                Some('t') => cur.push('\t'),
                Some('n') => cur.push('\n'),
                Some('r') => cur.push('\r'),
                Some(_) => return Err(malformed(line, "unknown escape sequence")),
                None => return Err(malformed(line, "dangling escape")),
            },
            ID_SEP => ids.push(take_id(line, &mut cur)?),
            c => cur.push(c),
        }
    }
    ids.push(take_id(line, &mut cur)?);
    Ok(ids)
}

impl IndexEntry {
    /// Serialize as one output line, without the trailing newline.
    pub fn to_record(&self) -> String {
        let mut out = String::with_capacity(self.token.len() + 1 + self.doc_ids.len() * 8);
        out.push_str(&self.token);
        out.push(KEY_SEP);
        for (i, id) in self.doc_ids.iter().enumerate() {
            if i > 0 {
                out.push(ID_SEP);
            }
            escape_into(&mut out, id.as_str());
        }
        out
    }

    pub fn parse_record(line: &str) -> Result<Self> {
        let (token, field) = line.split_once(KEY_SEP).ok_or_else(|| malformed(line, "missing tab separator"))?;
        if token.is_empty() {
            return Err(malformed(line, "empty term"));
        }
        Ok(IndexEntry { token: token.to_string(), doc_ids: split_ids(line, field)? })
    }
}
