//! Core logic for a note store with a read-through hash cache.
//!
//! The relational store is authoritative; the cache mirrors records read
//! from or written through it and may be discarded at any time.

pub mod cache;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

#[cfg(feature = "redis")]
pub use cache::RedisHashCache;
pub use cache::{CacheError, CacheResult, HashCache, InMemoryHashCache};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteValidationError};
pub use repo::note_repo::{CachedNoteRepository, NoteRepository, RepoError, RepoResult};
pub use repo::note_store::{NoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use service::note_service::{NoteService, NoteServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
