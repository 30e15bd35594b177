//! Read-through / write-invalidate note repository.
//!
//! # Responsibility
//! - Serve note reads from the hash cache, falling back to the store and
//!   populating both cache keys on a miss.
//! - Invalidate cache entries before every store write or delete.
//!
//! # Invariants
//! - A cache hit performs no store call.
//! - Writes delete the affected `notes:<id>` / `notes:<title>` keys before
//!   the store is touched; the cache is never updated in place.
//! - A cached record that fails to decode is reported as
//!   `RepoError::CorruptCacheEntry` on reads, never treated as a miss.
//!   Writes delete such a record along with the other affected keys.
//! - A well-formed record under a key it does not own (a digits-only title
//!   sharing `notes:<n>` with note `n`) is a miss, not corruption.
//! - The repository holds no mutable state of its own; consistency under
//!   concurrent callers is delegated to the store and the cache.

use crate::cache::codec::{
    decode_note, encode_note, id_key, invalidation_keys, title_key, CodecError,
};
use crate::cache::{CacheError, HashCache};
use crate::model::note::{Note, NoteId};
use crate::repo::note_store::{NoteStore, StoreError, StoreResult};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised by the cached repository.
#[derive(Debug)]
pub enum RepoError {
    /// Failure reported by the relational store, unchanged.
    Store(StoreError),
    /// Transport failure reported by the cache.
    Cache(CacheError),
    /// A cached record could not be turned back into the note it mirrors.
    CorruptCacheEntry { key: String, source: CodecError },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::CorruptCacheEntry { key, source } => {
                write!(f, "corrupt cache entry `{key}`: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::CorruptCacheEntry { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CacheError> for RepoError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Note persistence as seen by use-case services.
pub trait NoteRepository {
    /// Creates (no positive id) or updates (positive id) a note.
    ///
    /// Returns the stored record with id and timestamps filled in.
    fn save_note(&self, note: &Note) -> RepoResult<Note>;
    /// Gets one note by id; `Ok(None)` when no row exists.
    fn get_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Gets one note by exact title; `Ok(None)` when no row exists.
    fn get_note_by_title(&self, title: &str) -> RepoResult<Option<Note>>;
    /// Deletes a note and its cache entries. Missing ids are not an error.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

/// Which cache key a read goes through, and what the record must match.
#[derive(Debug, Clone, Copy)]
enum CacheLookup<'a> {
    Id(NoteId),
    Title(&'a str),
}

impl CacheLookup<'_> {
    fn key(&self) -> String {
        match self {
            Self::Id(id) => id_key(*id),
            Self::Title(title) => title_key(title),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Title(_) => "title",
        }
    }

    fn owns(&self, note: &Note) -> bool {
        match self {
            Self::Id(id) => note.id == *id,
            Self::Title(title) => note.title == *title,
        }
    }
}

/// `NoteRepository` over an authoritative store and a hash cache.
///
/// Both collaborators are injected; pass references (`&store`, `&cache`)
/// to keep ownership with the caller.
pub struct CachedNoteRepository<S, C> {
    store: S,
    cache: C,
}

impl<S: NoteStore, C: HashCache> CachedNoteRepository<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    fn read_through<F>(&self, lookup: CacheLookup<'_>, fetch: F) -> RepoResult<Option<Note>>
    where
        F: FnOnce(&S) -> StoreResult<Option<Note>>,
    {
        if let Some(note) = self.read_cached(lookup)? {
            debug!(
                "event=note_read module=repo status=hit key_kind={} note_id={}",
                lookup.kind(),
                note.id
            );
            return Ok(Some(note));
        }

        debug!(
            "event=note_read module=repo status=miss key_kind={}",
            lookup.kind()
        );
        let Some(note) = fetch(&self.store)? else {
            return Ok(None);
        };
        self.populate(&note)?;
        Ok(Some(note))
    }

    fn read_cached(&self, lookup: CacheLookup<'_>) -> RepoResult<Option<Note>> {
        let key = lookup.key();
        let fields = self.cache.hash_get_all(&key)?;
        if fields.is_empty() {
            return Ok(None);
        }

        match decode_note(&fields) {
            Ok(note) if lookup.owns(&note) => Ok(Some(note)),
            Ok(note) => {
                debug!(
                    "event=note_read module=repo status=collision key_kind={} note_id={}",
                    lookup.kind(),
                    note.id
                );
                Ok(None)
            }
            Err(source) => {
                error!(
                    "event=note_cache module=repo status=corrupt key_kind={} error={}",
                    lookup.kind(),
                    source
                );
                Err(RepoError::CorruptCacheEntry { key, source })
            }
        }
    }

    fn populate(&self, note: &Note) -> RepoResult<()> {
        let fields = encode_note(note).map_err(|err| {
            StoreError::InvalidData(format!("store returned an uncacheable note: {err}"))
        })?;
        self.cache.hash_set_all(&id_key(note.id), &fields)?;
        self.cache.hash_set_all(&title_key(&note.title), &fields)?;
        debug!(
            "event=note_cache module=repo status=populated note_id={}",
            note.id
        );
        Ok(())
    }

    /// Current version of note `id` as known before a write.
    ///
    /// Prefers the id-key; a corrupt or foreign record there falls through
    /// to the store.
    fn current_for_write(&self, id: NoteId) -> RepoResult<Option<Note>> {
        match self.read_cached(CacheLookup::Id(id)) {
            Ok(Some(note)) => return Ok(Some(note)),
            Ok(None) | Err(RepoError::CorruptCacheEntry { .. }) => {}
            Err(err) => return Err(err),
        }
        Ok(self.store.find_by_id(id)?)
    }

    fn invalidate(&self, keys: &[String]) -> RepoResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let removed = self.cache.delete(keys)?;
        debug!(
            "event=note_cache module=repo status=invalidated keys={} removed={}",
            keys.len(),
            removed
        );
        Ok(())
    }
}

impl<S: NoteStore, C: HashCache> NoteRepository for CachedNoteRepository<S, C> {
    fn save_note(&self, note: &Note) -> RepoResult<Note> {
        let mut keys = invalidation_keys(note);
        if note.is_persisted() {
            // A rename leaves the old title key behind unless we find it here.
            if let Some(current) = self.current_for_write(note.id)? {
                if current.title != note.title {
                    keys.push(title_key(&current.title));
                }
            }
        }
        self.invalidate(&keys)?;

        let saved = self.store.upsert(note)?;
        debug!(
            "event=note_save module=repo status=ok note_id={}",
            saved.id
        );
        Ok(saved)
    }

    fn get_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.read_through(CacheLookup::Id(id), |store| store.find_by_id(id))
    }

    fn get_note_by_title(&self, title: &str) -> RepoResult<Option<Note>> {
        self.read_through(CacheLookup::Title(title), |store| {
            store.find_by_title(title)
        })
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let mut keys = vec![id_key(id)];
        if let Some(current) = self.current_for_write(id)? {
            keys.push(title_key(&current.title));
        }
        self.invalidate(&keys)?;

        self.store.delete_by_id(id)?;
        debug!("event=note_delete module=repo status=ok note_id={id}");
        Ok(())
    }
}

impl<T: NoteRepository + ?Sized> NoteRepository for &T {
    fn save_note(&self, note: &Note) -> RepoResult<Note> {
        (**self).save_note(note)
    }

    fn get_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get_note_by_id(id)
    }

    fn get_note_by_title(&self, title: &str) -> RepoResult<Option<Note>> {
        (**self).get_note_by_title(title)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        (**self).delete_note(id)
    }
}
