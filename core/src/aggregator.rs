//! Reduce side of the index job.

use std::collections::BTreeSet;

use crate::index::{DocumentId, IndexEntry};

/// Collapse every document id grouped under `token` into one entry.
///
/// Duplicates are absorbed and the ids come out in lexicographic order, so the
/// result does not depend on the order the engine delivered them in. Always
/// returns exactly one entry, even for an empty group.
pub fn aggregate<I>(token: &str, doc_ids: I) -> IndexEntry
where
    I: IntoIterator<Item = DocumentId>,
{
    let unique: BTreeSet<DocumentId> = doc_ids.into_iter().collect();
    IndexEntry { token: token.to_string(), doc_ids: unique.into_iter().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<DocumentId> {
        raw.iter().map(|s| DocumentId::from(*s)).collect()
    }

    #[test]
    fn duplicates_collapse() {
        let entry = aggregate("dog", ids(&["b.txt", "a.txt", "b.txt", "a.txt", "c.txt"]));
        assert_eq!(entry.token, "dog");
        assert_eq!(entry.doc_ids, ids(&["a.txt", "b.txt", "c.txt"]));
    }

    #[test]
    fn order_of_arrival_does_not_matter() {
        let a = aggregate("x", ids(&["z", "y", "x", "y"]));
        let b = aggregate("x", ids(&["y", "x", "y", "z"]));
        assert_eq!(a, b);
    }

    #[test]
    fn single_and_empty_groups_still_yield_one_entry() {
        assert_eq!(aggregate("solo", ids(&["a.txt"])).doc_ids.len(), 1);
        let empty = aggregate("none", Vec::new());
        assert_eq!(empty.token, "none");
        assert!(empty.doc_ids.is_empty());
    }
}
