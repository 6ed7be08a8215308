//! Note domain model.
//!
//! # Responsibility
//! - Define the immutable note record handed from editing to persistence.
//! - Represent rich-text bodies as explicit `(range, attribute)` spans.
//! - Own the markup string codec used at the storage boundary.
//!
//! # Invariants
//! - Records are built atomically; `raw_text` always matches `body`.
//! - Markup conversion is deterministic and round-trips normalized bodies.

pub mod markup;
pub mod note;
pub mod rich_text;
