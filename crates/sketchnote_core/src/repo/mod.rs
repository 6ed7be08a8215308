//! Note storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the CRUD contract the persistence pipeline writes through.
//! - Keep SQL, PNG and markup conversion out of editing and list code.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.
//! - Every call may block; callers run them off the interaction thread.

pub mod note_repo;
