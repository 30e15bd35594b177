//! Repository layer: the authoritative store and the cached repository.
//!
//! # Responsibility
//! - Keep SQL details behind `NoteStore`.
//! - Implement the cache-aside protocol in `CachedNoteRepository`.
//!
//! # Invariants
//! - A store "not found" on lookup is `Ok(None)`, distinct from failures.
//! - Store and cache errors are propagated, never swallowed.

pub mod note_repo;
pub mod note_store;
