use std::collections::{BTreeSet, HashSet};

use log::{debug, info};

use crate::{
    core::book::{Book, BookId, BookPatch, BookRecord},
    error::{EditorError, Result},
};

/// The canonical in-memory list of book records.
///
/// A store holds three things:
///
/// - `current`: the records as edited, in insertion order
/// - `baseline`: a snapshot taken at load time, never mutated afterwards
/// - the set of ids edited since the last load or reset
///
/// Invariants:
///
/// - every modified id belongs to a record of `current`
/// - every id of `current` was present in `baseline`
/// - no two records of `current` share an id
///
/// # Examples
///
/// ```
/// use book_csv_editor::core::book::{Book, BookField, BookPatch};
/// use book_csv_editor::core::store::RecordStore;
///
/// let mut store = RecordStore::new();
/// store.load(vec![Book::new("Dune", "Frank Herbert", "Science Fiction", "1965", "")]);
///
/// let id = store.records()[0].id;
/// store.edit(id, &BookPatch::new().with(BookField::Title, "Dune Messiah")).unwrap();
/// assert!(store.is_modified(id));
///
/// store.reset();
/// assert_eq!(store.records()[0].book.title, "Dune");
/// assert_eq!(store.modified_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct RecordStore {
    current: Vec<BookRecord>,
    baseline: Vec<BookRecord>,
    modified: BTreeSet<BookId>,
    next_id: u64,
    revision: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every record with `books`, each tagged with a fresh id.
    pub fn load<I>(&mut self, books: I)
    where
        I: IntoIterator<Item = Book>,
    {
        let records = books
            .into_iter()
            .map(|book| BookRecord::new(self.fresh_id(), book))
            .collect();
        self.replace(records);
    }

    /// Replaces every record with already tagged `records`.
    ///
    /// Tags are kept as long as they are unique within the batch; a repeated
    /// tag is swapped for a fresh id. The id counter moves past every kept tag
    /// so later loads never hand out an id seen before.
    pub fn load_records<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = BookRecord>,
    {
        let records: Vec<BookRecord> = records.into_iter().collect();
        if let Some(max) = records.iter().map(|record| record.id.0).max() {
            self.next_id = self.next_id.max(max.saturating_add(1));
        }

        let mut seen = HashSet::with_capacity(records.len());
        let records = records
            .into_iter()
            .map(|record| {
                if seen.insert(record.id) {
                    record
                } else {
                    debug!("Duplicate id {} retagged on load", record.id);
                    BookRecord::new(self.fresh_id(), record.book)
                }
            })
            .collect();
        self.replace(records);
    }

    fn replace(&mut self, records: Vec<BookRecord>) {
        self.baseline = records.clone();
        self.current = records;
        self.modified.clear();
        self.bump();
        info!("Store loaded with {} records", self.current.len());
    }

    fn fresh_id(&mut self) -> BookId {
        let id = BookId(self.next_id);
        self.next_id += 1;
        id
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Merges `patch` into the record `id` and marks it as modified.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownRecord`] when no record carries `id`; the store is
    /// left untouched.
    pub fn edit(&mut self, id: BookId, patch: &BookPatch) -> Result<&BookRecord> {
        let index = self.position(id).ok_or(EditorError::UnknownRecord(id))?;

        let record = &mut self.current[index];
        record.book = patch.apply_to(&record.book);
        self.modified.insert(id);
        self.bump();
        debug!("Record {} edited: {}", id, self.current[index].book);

        Ok(&self.current[index])
    }

    /// Removes the record `id`. Returns `None` when it does not exist.
    pub fn delete(&mut self, id: BookId) -> Option<BookRecord> {
        let index = self.position(id)?;
        let removed = self.current.remove(index);
        self.modified.remove(&id);
        self.bump();
        debug!("Record {} deleted", id);
        Some(removed)
    }

    /// Restores every record from the baseline and forgets all modifications.
    pub fn reset(&mut self) {
        self.current = self.baseline.clone();
        self.modified.clear();
        self.bump();
        info!("Store reset to {} baseline records", self.current.len());
    }

    pub fn is_modified(&self, id: BookId) -> bool {
        self.modified.contains(&id)
    }

    pub fn get(&self, id: BookId) -> Option<&BookRecord> {
        self.position(id).map(|index| &self.current[index])
    }

    fn position(&self, id: BookId) -> Option<usize> {
        self.current.iter().position(|record| record.id == id)
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.current
    }

    pub fn baseline(&self) -> &[BookRecord] {
        &self.baseline
    }

    pub fn modified_ids(&self) -> impl Iterator<Item = BookId> + '_ {
        self.modified.iter().copied()
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Counter bumped by every mutation; equal revisions mean equal contents.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Distinct non-empty genres of the current records, sorted.
    pub fn genres(&self) -> Vec<&str> {
        self.current
            .iter()
            .map(|record| record.book.genre.as_str())
            .filter(|genre| !genre.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
