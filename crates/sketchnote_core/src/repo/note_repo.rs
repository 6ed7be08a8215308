//! Note storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the CRUD contract the persistence pipeline writes through.
//! - Map `NoteRecord` to the persisted row shape (markup body, PNG image,
//!   legacy timestamp text plus epoch milliseconds).
//!
//! # Invariants
//! - Unsaved records (`id == -1`) get a count-based id on create, falling
//!   back to `MAX(id) + 1` when that id is already taken.
//! - `update_note` never inserts; a missing id is `NotFound`.
//! - Corrupt image or markup columns surface as errors, never as empty notes.
//! - `list_all_notes` is ordered by `id ASC`.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::markup::{from_markup, to_markup, MarkupError};
use crate::model::note::{parse_legacy_timestamp, timestamp_from_millis, NoteId, NoteRecord};
use crate::raster::{self, CodecError};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    image,
    updated_at,
    updated_at_ms
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure for note persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// Backend unavailable or statement rejected.
    Db(DbError),
    /// No note with this id exists.
    NotFound(NoteId),
    /// Stored or outgoing image payload is corrupt.
    Codec(CodecError),
    /// Stored body markup cannot be parsed.
    Markup(MarkupError),
    /// Row content violates the schema contract.
    InvalidData(String),
    /// A previous holder of the connection panicked.
    LockPoisoned,
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Markup(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::LockPoisoned => write!(f, "note storage connection lock is poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Markup(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<MarkupError> for RepoError {
    fn from(value: MarkupError) -> Self {
        Self::Markup(value)
    }
}

/// Storage contract consumed by the persistence pipeline.
///
/// Calls may block on I/O; never invoke them from the interaction thread.
pub trait NoteRepository {
    /// Inserts a note and returns the id it was stored under.
    fn create_note(&self, note: &NoteRecord) -> RepoResult<NoteId>;
    /// Replaces the stored note with the same id.
    fn update_note(&self, note: &NoteRecord) -> RepoResult<()>;
    /// Loads one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<NoteRecord>;
    /// Number of stored notes.
    fn note_count(&self) -> RepoResult<i64>;
    /// All stored notes, in storage order.
    fn list_all_notes(&self) -> RepoResult<Vec<NoteRecord>>;
}

/// SQLite-backed note repository.
///
/// The connection sits behind a mutex so the repository can be shared with
/// the persistence worker.
pub struct SqliteNoteRepository {
    conn: Mutex<Connection>,
}

impl SqliteNoteRepository {
    /// Wraps a migrated connection, checking that the notes table exists.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_notes_table(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens and migrates a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn create_note(&self, note: &NoteRecord) -> RepoResult<NoteId> {
        let row = PersistedRow::from_record(note)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = if note.is_persisted() {
            note.id()
        } else {
            allocate_note_id(&tx)?
        };

        tx.execute(
            "INSERT INTO notes (
                id,
                title,
                body,
                image,
                updated_at,
                updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                note.title(),
                row.body,
                row.image,
                row.updated_at,
                row.updated_at_ms,
            ],
        )
        .inspect_err(|err| {
            error!("event=note_create module=repo status=error note_id={id} error={err}");
        })?;
        tx.commit()?;

        info!(
            "event=note_create module=repo status=ok note_id={id} has_image={}",
            row.image.is_some()
        );
        Ok(id)
    }

    fn update_note(&self, note: &NoteRecord) -> RepoResult<()> {
        if !note.is_persisted() {
            return Err(RepoError::NotFound(note.id()));
        }
        let row = PersistedRow::from_record(note)?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                body = ?3,
                image = ?4,
                updated_at = ?5,
                updated_at_ms = ?6
             WHERE id = ?1;",
            params![
                note.id(),
                note.title(),
                row.body,
                row.image,
                row.updated_at,
                row.updated_at_ms,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id()));
        }
        info!(
            "event=note_update module=repo status=ok note_id={} has_image={}",
            note.id(),
            row.image.is_some()
        );
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<NoteRecord> {
        let raw = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
            let raw = stmt.query_row([id], RawNoteRow::read).optional()?;
            raw
        };
        match raw {
            Some(raw) => raw.into_record(),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn note_count(&self) -> RepoResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn list_all_notes(&self) -> RepoResult<Vec<NoteRecord>> {
        let raw_rows = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"))?;
            let rows = stmt.query_map([], RawNoteRow::read)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        raw_rows.into_iter().map(RawNoteRow::into_record).collect()
    }
}

/// Storage-facing column values for one record.
struct PersistedRow {
    body: String,
    image: Option<Vec<u8>>,
    updated_at: String,
    updated_at_ms: i64,
}

impl PersistedRow {
    fn from_record(note: &NoteRecord) -> RepoResult<Self> {
        let image = note.image().map(raster::encode).transpose()?;
        Ok(Self {
            body: to_markup(note.body()),
            image,
            updated_at: note.formatted_updated_at(),
            updated_at_ms: note.updated_at().timestamp_millis(),
        })
    }
}

/// Column values as read, before decoding.
struct RawNoteRow {
    id: NoteId,
    title: String,
    body: String,
    image: Option<Vec<u8>>,
    updated_at: String,
    updated_at_ms: Option<i64>,
}

impl RawNoteRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            image: row.get("image")?,
            updated_at: row.get("updated_at")?,
            updated_at_ms: row.get("updated_at_ms")?,
        })
    }

    fn into_record(self) -> RepoResult<NoteRecord> {
        let body = from_markup(&self.body)?;
        let image = self
            .image
            .as_deref()
            .map(raster::decode)
            .transpose()
            .inspect_err(|err| {
                error!(
                    "event=note_decode module=repo status=error note_id={} error={err}",
                    self.id
                );
            })?;
        let updated_at = match self.updated_at_ms {
            Some(millis) => timestamp_from_millis(millis),
            None => parse_legacy_timestamp(&self.updated_at),
        }
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{}` for note {}",
                self.updated_at, self.id
            ))
        })?;

        Ok(NoteRecord::new(self.id, self.title, body, image, updated_at))
    }
}

fn allocate_note_id(tx: &Transaction<'_>) -> RepoResult<NoteId> {
    let count: i64 = tx.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
    let taken: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [count],
        |row| row.get(0),
    )?;
    if taken == 0 {
        return Ok(count);
    }
    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(id), -1) + 1 FROM notes;",
        [],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn ensure_notes_table(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::InvalidData(
            "missing required table `notes`; open the connection with db::open_db".to_string(),
        ))
    }
}
