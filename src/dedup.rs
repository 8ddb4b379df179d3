use crate::models::{DedupKey, NameRecord};
use rustc_hash::FxHashSet;

/// Keeps the first record seen for each [`DedupKey`], in input order.
#[derive(Default)]
pub struct Deduplicator {
    seen: FxHashSet<DedupKey>,
    kept: Vec<NameRecord>,
    discarded: u64,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
            kept: Vec::with_capacity(capacity),
            discarded: 0,
        }
    }

    /// Returns `true` if the record was kept.
    pub fn push(&mut self, record: NameRecord) -> bool {
        if self.seen.insert(record.dedup_key()) {
            self.kept.push(record);
            true
        } else {
            self.discarded += 1;
            false
        }
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn finish(self) -> Vec<NameRecord> {
        self.kept
    }
}

/// Unique records in first-seen order, and how many duplicates were discarded.
pub fn dedup_records<I>(records: I) -> (Vec<NameRecord>, u64)
where
    I: IntoIterator<Item = NameRecord>,
{
    let records = records.into_iter();
    let mut dedup = Deduplicator::with_capacity(records.size_hint().0);
    for record in records {
        dedup.push(record);
    }
    let discarded = dedup.discarded();
    (dedup.finish(), discarded)
}
