//! Editing session, background saves and list synchronization.
//!
//! # Responsibility
//! - Orchestrate canvas, model and repository into the save flow.
//! - Keep storage calls off the interaction thread.
//!
//! # Invariants
//! - Only immutable `NoteRecord` snapshots cross to the worker.
//! - List reconciliation runs where the `SaveHandle` is completed.

pub mod editor;
pub mod list_sync;
pub mod persistence;
