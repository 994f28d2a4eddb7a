//! Group-by-term between the map and reduce stages.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::aggregator::aggregate;
use crate::index::{DocumentId, IndexEntry, Posting};

/// Terms of one reduce partition, sorted, each with every id emitted for it.
pub type Group = BTreeMap<String, Vec<DocumentId>>;

/// Reduce partition a term is routed to. Stable for a given binary.
pub fn partition_for(token: &str, reduce_tasks: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() % reduce_tasks.max(1) as u64) as usize
}

pub struct Shuffle {
    groups: Vec<Group>,
    postings: usize,
}

impl Shuffle {
    pub fn new(reduce_tasks: usize) -> Self {
        Self { groups: vec![Group::new(); reduce_tasks.max(1)], postings: 0 }
    }

    pub fn push(&mut self, posting: Posting) {
        let n = partition_for(&posting.token, self.groups.len());
        self.groups[n].entry(posting.token).or_default().push(posting.doc_id);
        self.postings += 1;
    }

    pub fn postings(&self) -> usize { self.postings }

    pub fn terms(&self) -> usize { self.groups.iter().map(BTreeMap::len).sum() }

    pub fn into_groups(self) -> Vec<Group> { self.groups }
}

impl Extend<Posting> for Shuffle {
    fn extend<I: IntoIterator<Item = Posting>>(&mut self, iter: I) {
        for p in iter {
            self.push(p);
        }
    }
}

/// Run the aggregator once per term of a partition, in term order.
pub fn reduce_group(group: Group) -> Vec<IndexEntry> {
    group.into_iter().map(|(token, ids)| aggregate(&token, ids)).collect()
}
