use crate::record::Record;
use crate::values::RecordId;
use std::collections::HashSet;

/// The last-fetched collection of one record kind, in server order.
///
/// The cache never talks to the backend. Its `apply_*` methods are meant to
/// run only after the corresponding remote call succeeded, and all of them
/// are total: an update or removal for an unknown id is a no-op.
///
/// Every mutation bumps [`generation`](Self::generation) so derived views
/// know their page bounds must be recomputed.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Vec<Record>,
    hydrated: bool,
    generation: u64,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh fetch.
    ///
    /// Duplicate ids in the fetched sequence keep their first occurrence.
    pub fn hydrate(&mut self, records: Vec<Record>) {
        let mut seen = HashSet::with_capacity(records.len());
        let before = records.len();
        self.records = records
            .into_iter()
            .filter(|r| seen.insert(r.id().clone()))
            .collect();
        if self.records.len() != before {
            tracing::warn!(
                dropped = before - self.records.len(),
                "hydrate dropped records with duplicate ids"
            );
        }
        self.hydrated = true;
        self.bump();
    }

    /// Append a newly created record.
    ///
    /// If a record with the same id is already cached it is replaced in
    /// place instead, keeping ids unique.
    pub fn apply_create(&mut self, record: Record) {
        match self.position(record.id()) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
        self.bump();
    }

    /// Replace the cached record with the same id. No-op if absent.
    pub fn apply_update(&mut self, record: Record) {
        if let Some(index) = self.position(record.id()) {
            self.records[index] = record;
        } else {
            tracing::debug!(id = %record.id(), "update for uncached record ignored");
        }
        self.bump();
    }

    /// Remove the record with `id`. No-op if absent.
    pub fn apply_remove(&mut self, id: &RecordId) {
        self.records.retain(|r| r.id() != id);
        self.bump();
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a fetch has ever succeeded.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Monotonic counter bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
