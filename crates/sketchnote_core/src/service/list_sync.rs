//! Presentation-facing note collection and its reconciliation.
//!
//! # Responsibility
//! - Merge a freshly fetched storage collection into the displayed one.
//! - Publish whole-collection replacements to observers.
//!
//! # Invariants
//! - Reconciliation is pure; no I/O happens here.
//! - Existing entries keep their positions; new entries are appended in
//!   storage order.
//! - Readers always see a complete collection, never a partial update.
//! - `NoteList` has exactly one writer (its owner); readers subscribe.

use crate::model::note::{NoteId, NoteRecord};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, immutable view of the displayed notes.
pub type NoteCollection = Arc<Vec<NoteRecord>>;

/// Which storage write preceded the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Created(NoteId),
    Updated(NoteId),
}

impl SyncOp {
    pub fn note_id(self) -> NoteId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Reconciles `fetched` (storage truth) into `current` (displayed order).
///
/// - Entries present in both are refreshed in place.
/// - Entries no longer in storage are dropped.
/// - Entries only in storage (the created note) are appended in fetched order.
pub fn reconcile(current: &[NoteRecord], fetched: &[NoteRecord], op: SyncOp) -> Vec<NoteRecord> {
    let fetched_by_id: HashMap<NoteId, &NoteRecord> =
        fetched.iter().map(|note| (note.id(), note)).collect();
    if !fetched_by_id.contains_key(&op.note_id()) {
        warn!(
            "event=list_sync module=list_sync status=warn note_id={} error_code=target_missing",
            op.note_id()
        );
    }

    let mut next: Vec<NoteRecord> = current
        .iter()
        .filter_map(|note| fetched_by_id.get(&note.id()).map(|fresh| (*fresh).clone()))
        .collect();
    let known: HashSet<NoteId> = next.iter().map(NoteRecord::id).collect();
    next.extend(
        fetched
            .iter()
            .filter(|note| !known.contains(&note.id()))
            .cloned(),
    );
    next
}

/// Single-writer, many-reader store backing the note list view.
#[derive(Debug)]
pub struct NoteList {
    sender: watch::Sender<NoteCollection>,
}

impl Default for NoteList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl NoteList {
    pub fn new(notes: Vec<NoteRecord>) -> Self {
        let (sender, _) = watch::channel(Arc::new(notes));
        Self { sender }
    }

    /// Current collection. Later writes replace it; this value never changes.
    pub fn snapshot(&self) -> NoteCollection {
        self.sender.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sender.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.borrow().is_empty()
    }

    /// Observer handle; `changed()` fires on every published collection.
    pub fn subscribe(&self) -> watch::Receiver<NoteCollection> {
        self.sender.subscribe()
    }

    /// Replaces the whole collection, e.g. after the initial storage load.
    pub fn replace_all(&self, notes: Vec<NoteRecord>) {
        self.sender.send_replace(Arc::new(notes));
    }

    /// Reconciles a fetched collection and notifies observers.
    pub fn apply(&self, fetched: &[NoteRecord], op: SyncOp) -> NoteCollection {
        let current = self.snapshot();
        let next = Arc::new(reconcile(&current, fetched, op));
        self.sender.send_replace(Arc::clone(&next));
        debug!(
            "event=list_sync module=list_sync status=ok op={op:?} before={} after={}",
            current.len(),
            next.len()
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::{reconcile, NoteList, SyncOp};
    use crate::model::note::NoteRecord;
    use crate::model::rich_text::RichText;
    use chrono::Local;

    fn note(id: i64, title: &str) -> NoteRecord {
        NoteRecord::new(id, title, RichText::plain(title), None, Local::now())
    }

    fn ids(notes: &[NoteRecord]) -> Vec<i64> {
        notes.iter().map(NoteRecord::id).collect()
    }

    #[test]
    fn created_note_is_appended_after_existing_order() {
        let current = vec![note(2, "b"), note(0, "a")];
        let fetched = vec![note(0, "a"), note(2, "b"), note(3, "new")];
        let next = reconcile(&current, &fetched, SyncOp::Created(3));
        assert_eq!(ids(&next), vec![2, 0, 3]);
    }

    #[test]
    fn updated_note_is_replaced_in_place() {
        let current = vec![note(1, "a"), note(7, "old"), note(9, "c")];
        let fetched = vec![note(1, "a"), note(7, "new"), note(9, "c")];
        let next = reconcile(&current, &fetched, SyncOp::Updated(7));
        assert_eq!(ids(&next), vec![1, 7, 9]);
        assert_eq!(next[1].title(), "new");
    }

    #[test]
    fn entries_missing_from_storage_are_dropped() {
        let current = vec![note(1, "a"), note(2, "gone")];
        let fetched = vec![note(1, "a")];
        let next = reconcile(&current, &fetched, SyncOp::Updated(1));
        assert_eq!(ids(&next), vec![1]);
    }

    #[test]
    fn apply_publishes_whole_collection_to_subscribers() {
        let list = NoteList::new(vec![note(0, "a")]);
        let mut observer = list.subscribe();
        let before = list.snapshot();

        list.apply(&[note(0, "a"), note(1, "b")], SyncOp::Created(1));

        assert!(observer.has_changed().unwrap());
        assert_eq!(observer.borrow_and_update().len(), 2);
        assert_eq!(before.len(), 1);
        assert_eq!(list.len(), 2);
    }
}
