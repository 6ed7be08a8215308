//! Background note saves.
//!
//! # Responsibility
//! - Run one storage write plus a full re-fetch off the interaction thread.
//! - Hand the result back through a `SaveHandle` that the interaction thread
//!   awaits or polls; list reconciliation runs there.
//!
//! # Invariants
//! - The worker only sees the immutable `NoteRecord` it was given.
//! - A handle yields exactly one outcome. On failure the list is untouched.
//! - A write that reached storage always reports its id, even when the
//!   follow-up fetch fails.
//! - No retry, cancellation or timeout.
//! - One save in flight per editing session (caller precondition).

use crate::model::note::{NoteId, NoteRecord};
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::service::list_sync::{NoteList, SyncOp};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use uuid::Uuid;

/// User-visible confirmation kind for a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveNotice {
    Created,
    Updated,
}

impl SaveNotice {
    /// Short confirmation text shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::Created => "Note saved",
            Self::Updated => "Note updated",
        }
    }
}

/// Why a save did not complete.
#[derive(Debug)]
pub enum SaveError {
    /// The write failed; nothing was stored.
    Storage(RepoError),
    /// The note was stored under `note_id`, but the list re-fetch failed.
    RefreshFailed { note_id: NoteId, source: RepoError },
    /// The worker panicked or was dropped before reporting.
    WorkerLost,
    /// The outcome was already delivered by an earlier poll.
    AlreadyCompleted,
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "note save failed: {err}"),
            Self::RefreshFailed { note_id, source } => {
                write!(f, "note {note_id} saved but list refresh failed: {source}")
            }
            Self::WorkerLost => write!(f, "note save worker stopped before reporting"),
            Self::AlreadyCompleted => write!(f, "note save outcome was already delivered"),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) | Self::RefreshFailed { source: err, .. } => Some(err),
            Self::WorkerLost | Self::AlreadyCompleted => None,
        }
    }
}

impl From<RepoError> for SaveError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Result of one save, as observed on the interaction thread.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved { notice: SaveNotice, note_id: NoteId },
    Failed(SaveError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Id the note is stored under, whenever the write reached storage.
    pub fn note_id(&self) -> Option<NoteId> {
        match self {
            Self::Saved { note_id, .. }
            | Self::Failed(SaveError::RefreshFailed { note_id, .. }) => Some(*note_id),
            Self::Failed(_) => None,
        }
    }
}

/// What the worker reports back.
#[derive(Debug)]
struct SaveReport {
    note_id: NoteId,
    notes: Vec<NoteRecord>,
}

type WorkerResult = Result<SaveReport, SaveError>;

/// Entry point for background saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceTask;

impl PersistenceTask {
    /// Starts a save on the runtime's blocking pool and returns immediately.
    ///
    /// `is_update` selects `update_note`; otherwise the record is created and
    /// storage assigns its id.
    pub fn dispatch<R>(
        runtime: &Handle,
        repo: Arc<R>,
        record: NoteRecord,
        is_update: bool,
    ) -> SaveHandle
    where
        R: NoteRepository + Send + Sync + ?Sized + 'static,
    {
        let task_id = Uuid::new_v4();
        let notice = if is_update {
            SaveNotice::Updated
        } else {
            SaveNotice::Created
        };
        let (sender, receiver) = oneshot::channel();

        info!(
            "event=note_save module=persistence status=start task_id={task_id} note_id={} mode={notice:?}",
            record.id()
        );
        // Detached: completion is observed through the channel only.
        drop(runtime.spawn_blocking(move || {
            let result = run_save(repo.as_ref(), &record, is_update, task_id);
            // The handle may already be gone; nothing is waiting then.
            let _ = sender.send(result);
        }));

        SaveHandle {
            task_id,
            notice,
            receiver: Some(receiver),
        }
    }
}

fn run_save<R>(repo: &R, record: &NoteRecord, is_update: bool, task_id: Uuid) -> WorkerResult
where
    R: NoteRepository + ?Sized,
{
    let started_at = Instant::now();
    let note_id = if is_update {
        repo.update_note(record)?;
        record.id()
    } else {
        repo.create_note(record)?
    };
    let notes = repo
        .list_all_notes()
        .map_err(|source| SaveError::RefreshFailed { note_id, source })?;
    info!(
        "event=note_save module=persistence status=written task_id={task_id} note_id={note_id} notes={} duration_ms={}",
        notes.len(),
        started_at.elapsed().as_millis()
    );
    Ok(SaveReport { note_id, notes })
}

/// Interaction-thread side of a dispatched save.
#[derive(Debug)]
pub struct SaveHandle {
    task_id: Uuid,
    notice: SaveNotice,
    receiver: Option<oneshot::Receiver<WorkerResult>>,
}

impl SaveHandle {
    /// Log correlation id shared with the worker.
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// `true` once an outcome has been delivered by `try_complete`.
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }

    /// Waits for the worker, then reconciles `list` on the caller.
    pub async fn complete(mut self, list: &NoteList) -> SaveOutcome {
        let Some(receiver) = self.receiver.take() else {
            return SaveOutcome::Failed(SaveError::AlreadyCompleted);
        };
        let result = receiver.await.ok();
        self.finish(result, list)
    }

    /// Polls without blocking.
    ///
    /// Returns `None` while the worker runs, and after the outcome has been
    /// delivered once.
    pub fn try_complete(&mut self, list: &NoteList) -> Option<SaveOutcome> {
        let receiver = self.receiver.as_mut()?;
        let result = match receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => None,
        };
        self.receiver = None;
        Some(self.finish(result, list))
    }

    fn finish(&self, result: Option<WorkerResult>, list: &NoteList) -> SaveOutcome {
        let task_id = self.task_id;
        match result {
            Some(Ok(report)) => {
                let op = match self.notice {
                    SaveNotice::Created => SyncOp::Created(report.note_id),
                    SaveNotice::Updated => SyncOp::Updated(report.note_id),
                };
                list.apply(&report.notes, op);
                info!(
                    "event=note_save module=persistence status=ok task_id={task_id} note_id={}",
                    report.note_id
                );
                SaveOutcome::Saved {
                    notice: self.notice,
                    note_id: report.note_id,
                }
            }
            Some(Err(err)) => {
                error!(
                    "event=note_save module=persistence status=error task_id={task_id} error={err}"
                );
                SaveOutcome::Failed(err)
            }
            None => {
                error!(
                    "event=note_save module=persistence status=error task_id={task_id} error_code=worker_lost"
                );
                SaveOutcome::Failed(SaveError::WorkerLost)
            }
        }
    }
}
