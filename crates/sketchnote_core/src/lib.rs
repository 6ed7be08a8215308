//! Core logic for SketchNote: sketch canvas, rich-text notes and their
//! background persistence.
//! Hosts (UI shells, the CLI) drive this crate; it owns all invariants.

pub mod canvas;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod raster;
pub mod repo;
pub mod service;

pub use canvas::{
    CanvasState, CompositeMode, PaintSpec, PointerAction, PointerEvent, PointerId, StrokeCanvas,
};
pub use config::{BrushSize, ColorPreset, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::markup::{from_markup, to_markup, MarkupError};
pub use model::note::{NoteId, NoteRecord, NoteSummary, UNSAVED_NOTE_ID};
pub use model::rich_text::{RichText, StyleAttribute, StyleSpan};
pub use raster::{CodecError, PixelBuffer, Rgba};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::editor::{LoadOutcome, NoteEditor};
pub use service::list_sync::{reconcile, NoteCollection, NoteList, SyncOp};
pub use service::persistence::{PersistenceTask, SaveError, SaveHandle, SaveNotice, SaveOutcome};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
