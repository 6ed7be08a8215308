//! Note domain record.
//!
//! # Responsibility
//! - Define the immutable per-save `NoteRecord` handed to persistence.
//! - Own the legacy timestamp format shared with existing stored notes.
//! - Project records into list-row summaries.
//!
//! # Invariants
//! - `raw_text` is derived from `body` once, in the constructor.
//! - A record is never mutated after construction; every save builds a new one.
//! - `id == UNSAVED_NOTE_ID` means the note has not been persisted yet.

use crate::model::rich_text::RichText;
use crate::raster::PixelBuffer;
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Integer note identity assigned by storage.
pub type NoteId = i64;

/// Sentinel id for notes that have not been stored yet.
pub const UNSAVED_NOTE_ID: NoteId = -1;

/// Legacy display/storage timestamp format (`dd.MM.yyyy, hh:mm:ss`).
///
/// The hour is on a 12-hour clock with no AM/PM marker.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %I:%M:%S";

const EMPTY_TEXT_PREVIEW: &str = "INFO: Note has no text";

/// One saved (or about-to-be-saved) note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    id: NoteId,
    title: String,
    body: RichText,
    raw_text: String,
    image: Option<Arc<PixelBuffer>>,
    updated_at: DateTime<Local>,
}

impl NoteRecord {
    /// Builds a record, deriving the plain-text projection from `body`.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        body: RichText,
        image: Option<PixelBuffer>,
        updated_at: DateTime<Local>,
    ) -> Self {
        let raw_text = body.text().to_string();
        Self {
            id,
            title: title.into(),
            body,
            raw_text,
            image: image.map(Arc::new),
            updated_at,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id >= 0
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &RichText {
        &self.body
    }

    /// Plain-text flattening of the body at construction time.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn image(&self) -> Option<&PixelBuffer> {
        self.image.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Local> {
        self.updated_at
    }

    /// Timestamp in the legacy `dd.MM.yyyy, hh:mm:ss` format.
    pub fn formatted_updated_at(&self) -> String {
        format_timestamp(self.updated_at)
    }

    pub fn summary(&self) -> NoteSummary {
        let display_title = if self.title.trim().is_empty() {
            format!("Note #{}", self.id)
        } else {
            self.title.clone()
        };
        let preview_text = if self.raw_text.is_empty() {
            EMPTY_TEXT_PREVIEW.to_string()
        } else {
            self.raw_text.clone()
        };
        NoteSummary {
            id: self.id,
            display_title,
            preview_text,
            updated_label: self.formatted_updated_at(),
            has_sketch: self.image.is_some(),
        }
    }
}

/// List-row projection of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub id: NoteId,
    /// Title, or `Note #<id>` when blank.
    pub display_title: String,
    /// Raw text, or a placeholder when the note has no text.
    pub preview_text: String,
    pub updated_label: String,
    pub has_sketch: bool,
}

pub fn format_timestamp(value: DateTime<Local>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a legacy timestamp string in local time.
///
/// The format carries no AM/PM marker, so the hour is read as ante-meridiem
/// (`12` maps to `00`). Callers that need exact instants should prefer the
/// stored epoch milliseconds.
pub fn parse_legacy_timestamp(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%d.%m.%Y, %H:%M:%S").ok()?;
    if !(1..=12).contains(&naive.hour()) {
        return None;
    }
    let naive = if naive.hour() == 12 {
        naive.with_hour(0)?
    } else {
        naive
    };
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(value) => Some(value),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

/// Converts epoch milliseconds into local time.
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Local>> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::{
        format_timestamp, parse_legacy_timestamp, timestamp_from_millis, NoteRecord,
        UNSAVED_NOTE_ID,
    };
    use crate::model::rich_text::{RichText, StyleAttribute};
    use crate::raster::PixelBuffer;
    use chrono::{Local, TimeZone, Timelike};

    #[test]
    fn raw_text_is_plain_flattening_of_body() {
        let body = RichText::plain("milk, eggs").with_attribute(0..4, StyleAttribute::Bold);
        let note = NoteRecord::new(UNSAVED_NOTE_ID, "Groceries", body, None, Local::now());
        assert_eq!(note.raw_text(), "milk, eggs");
        assert!(!note.is_persisted());
        assert!(note.image().is_none());
    }

    #[test]
    fn image_is_copied_not_aliased() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        let note = NoteRecord::new(3, "", RichText::default(), Some(buffer.clone()), Local::now());
        buffer.fill(crate::raster::Rgba::RED);
        assert!(note.image().unwrap().is_fully_transparent());
    }

    #[test]
    fn summary_falls_back_for_blank_title_and_text() {
        let note = NoteRecord::new(4, "  ", RichText::default(), None, Local::now());
        let summary = note.summary();
        assert_eq!(summary.display_title, "Note #4");
        assert_eq!(summary.preview_text, "INFO: Note has no text");
        assert!(!summary.has_sketch);
    }

    #[test]
    fn legacy_format_uses_twelve_hour_clock() {
        let afternoon = Local.with_ymd_and_hms(2024, 3, 9, 15, 4, 5).single().unwrap();
        assert_eq!(format_timestamp(afternoon), "09.03.2024, 03:04:05");
    }

    #[test]
    fn legacy_parse_reads_hours_as_morning() {
        let parsed = parse_legacy_timestamp("09.03.2024, 03:04:05").unwrap();
        assert_eq!(parsed.hour(), 3);
        let midnight = parse_legacy_timestamp("01.01.2024, 12:00:00").unwrap();
        assert_eq!(midnight.hour(), 0);
        assert!(parse_legacy_timestamp("not a date").is_none());
        assert!(parse_legacy_timestamp("01.01.2024, 13:00:00").is_none());
    }

    #[test]
    fn millis_roundtrip_through_local_time() {
        let now = Local::now();
        let restored = timestamp_from_millis(now.timestamp_millis()).unwrap();
        assert_eq!(restored.timestamp_millis(), now.timestamp_millis());
    }
}
