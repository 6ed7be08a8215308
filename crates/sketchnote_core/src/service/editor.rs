//! One note-editing session.
//!
//! # Responsibility
//! - Own the title, rich-text body and sketch canvas while a note is open.
//! - Build the immutable `NoteRecord` snapshot handed to persistence.
//!
//! # Invariants
//! - A failed load never leaves partial state; the editor resets to a new,
//!   empty note and reports the failure.
//! - `build_record` copies pixels; later strokes never reach a dispatched save.

use crate::canvas::StrokeCanvas;
use crate::config::{BrushSize, ColorPreset, CoreConfig};
use crate::model::note::{NoteId, NoteRecord, UNSAVED_NOTE_ID};
use crate::model::rich_text::{RichText, StyleAttribute};
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::service::persistence::{PersistenceTask, SaveHandle, SaveOutcome};
use chrono::{DateTime, Local};
use log::{error, info};
use std::ops::Range;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Result of opening an existing note.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    /// The note could not be read; the editor now holds an empty new note.
    FellBackToEmpty(RepoError),
}

#[derive(Debug)]
pub struct NoteEditor {
    config: CoreConfig,
    note_id: NoteId,
    title: String,
    body: RichText,
    canvas: StrokeCanvas,
}

impl NoteEditor {
    /// Starts a new, unsaved note.
    pub fn new(config: CoreConfig) -> Self {
        let canvas = StrokeCanvas::new(&config);
        Self {
            config,
            note_id: UNSAVED_NOTE_ID,
            title: String::new(),
            body: RichText::default(),
            canvas,
        }
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    /// Whether the next save updates an existing note.
    pub fn is_editing_existing(&self) -> bool {
        self.note_id >= 0
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn body(&self) -> &RichText {
        &self.body
    }

    pub fn set_body(&mut self, body: RichText) {
        self.body = body;
    }

    /// Styles a char range of the body.
    pub fn apply_format(&mut self, range: Range<usize>, attribute: StyleAttribute) {
        self.body.add_attribute(range, attribute);
    }

    pub fn canvas(&self) -> &StrokeCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut StrokeCanvas {
        &mut self.canvas
    }

    pub fn set_brush(&mut self, size: BrushSize) -> bool {
        self.canvas
            .set_brush_size(size.logical_size(), self.config.display_density)
    }

    pub fn set_color(&mut self, preset: ColorPreset) {
        self.canvas.set_paint_color(preset.color());
    }

    /// Opens a stored note, replacing the current session content.
    ///
    /// The stored sketch is placed at the top-left of the current surface
    /// when one is already laid out.
    pub fn load<R>(&mut self, repo: &R, id: NoteId) -> LoadOutcome
    where
        R: NoteRepository + ?Sized,
    {
        let note = match repo.get_note(id) {
            Ok(note) => note,
            Err(err) => {
                error!("event=note_load module=editor status=error note_id={id} error={err}");
                self.reset();
                return LoadOutcome::FellBackToEmpty(err);
            }
        };

        let layout = self.canvas.size();
        self.canvas.cancel_stroke();
        match note.image() {
            Some(image) => {
                self.canvas.restore(image);
                if let Some((width, height)) = layout {
                    self.canvas.resize(width, height);
                }
            }
            None => self.canvas.clear(),
        }
        self.note_id = note.id();
        self.title = note.title().to_string();
        self.body = note.body().clone();

        info!(
            "event=note_load module=editor status=ok note_id={id} has_image={}",
            note.image().is_some()
        );
        LoadOutcome::Loaded
    }

    /// Drops all content and becomes a new, unsaved note.
    pub fn reset(&mut self) {
        self.note_id = UNSAVED_NOTE_ID;
        self.title.clear();
        self.body = RichText::default();
        self.canvas.cancel_stroke();
        self.canvas.clear();
    }

    /// Snapshot of the session as a record stamped with `now`.
    pub fn build_record(&self, now: DateTime<Local>) -> NoteRecord {
        NoteRecord::new(
            self.note_id,
            self.title.clone(),
            self.body.clone(),
            self.canvas.snapshot(),
            now,
        )
    }

    /// Dispatches a background save of the current content.
    pub fn save<R>(&self, runtime: &Handle, repo: Arc<R>) -> SaveHandle
    where
        R: NoteRepository + Send + Sync + ?Sized + 'static,
    {
        let record = self.build_record(Local::now());
        PersistenceTask::dispatch(runtime, repo, record, self.is_editing_existing())
    }

    /// Adopts the id storage assigned, so later saves update instead of create.
    ///
    /// Also applies when the write landed but the list refresh failed.
    pub fn mark_saved(&mut self, outcome: &SaveOutcome) {
        if let Some(id) = outcome.note_id() {
            self.note_id = id;
        }
    }
}
