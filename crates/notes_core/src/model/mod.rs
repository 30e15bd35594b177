//! Domain model for cached notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, cache and services.
//!
//! # Invariants
//! - A note is identified by a store-assigned positive `NoteId`.
//! - Titles are unique across live notes (enforced by the store).

pub mod note;
pub mod timestamp;
