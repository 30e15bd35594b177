use notes_core::cache::codec::{encode_note, id_key, title_key, CodecError};
use notes_core::db::open_db_in_memory;
use notes_core::{
    CacheError, CacheResult, CachedNoteRepository, HashCache, InMemoryHashCache, Note, NoteId,
    NoteRepository, NoteStore, RepoError, SqliteNoteStore, StoreError, StoreResult,
};
use std::collections::HashMap;

/// Store double for paths that must be served from the cache alone.
struct UnreachableStore;

impl NoteStore for UnreachableStore {
    fn find_by_id(&self, id: NoteId) -> StoreResult<Option<Note>> {
        panic!("unexpected store lookup by id {id}");
    }

    fn find_by_title(&self, _title: &str) -> StoreResult<Option<Note>> {
        panic!("unexpected store lookup by title");
    }

    fn upsert(&self, _note: &Note) -> StoreResult<Note> {
        panic!("unexpected store upsert");
    }

    fn delete_by_id(&self, id: NoteId) -> StoreResult<()> {
        panic!("unexpected store delete of id {id}");
    }
}

/// Cache double whose every call fails.
struct BrokenCache;

impl HashCache for BrokenCache {
    fn hash_get_all(&self, _key: &str) -> CacheResult<HashMap<String, String>> {
        Err(CacheError::Poisoned)
    }

    fn hash_set(&self, _key: &str, _field: &str, _value: &str) -> CacheResult<()> {
        Err(CacheError::Poisoned)
    }

    fn exists(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Poisoned)
    }

    fn delete(&self, _keys: &[String]) -> CacheResult<u64> {
        Err(CacheError::Poisoned)
    }
}

fn assert_cached_fields(cache: &InMemoryHashCache, key: &str, note: &Note) {
    let cached = cache.hash_get_all(key).unwrap();
    let expected: HashMap<String, String> = encode_note(note)
        .unwrap()
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect();
    assert_eq!(cached, expected, "cached record under {key}");
    assert_eq!(cached.len(), 5);
}

#[test]
fn save_new_note_leaves_cache_cold() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);

    let saved = repo
        .save_note(&Note::new("Testing 123", "This note was just inserted"))
        .unwrap();

    assert!(saved.is_persisted());
    assert!(cache.keys().unwrap().is_empty());
    let stored = store.find_by_id(saved.id).unwrap().unwrap();
    assert_eq!(stored, saved);
}

#[test]
fn read_by_id_populates_both_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store
        .upsert(&Note::new("Testing 123", "This is a test content"))
        .unwrap();

    let loaded = repo.get_note_by_id(stored.id).unwrap().unwrap();

    assert_eq!(loaded, stored);
    assert_cached_fields(&cache, &id_key(stored.id), &stored);
    assert_cached_fields(&cache, &title_key("Testing 123"), &stored);
    assert_eq!(
        cache.hash_get_all(&id_key(stored.id)).unwrap()["id"],
        stored.id.to_string()
    );
}

#[test]
fn read_by_title_populates_both_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store
        .upsert(&Note::new("Testing 1234", "This is a test content"))
        .unwrap();

    let loaded = repo.get_note_by_title("Testing 1234").unwrap().unwrap();

    assert_eq!(loaded, stored);
    assert_cached_fields(&cache, &id_key(stored.id), &stored);
    assert_cached_fields(&cache, &title_key("Testing 1234"), &stored);
}

#[test]
fn cache_hit_bypasses_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let stored = store.upsert(&Note::new("cached", "body")).unwrap();
    CachedNoteRepository::new(&store, &cache)
        .get_note_by_id(stored.id)
        .unwrap();

    let cache_only = CachedNoteRepository::new(UnreachableStore, &cache);
    assert_eq!(cache_only.get_note_by_id(stored.id).unwrap(), Some(stored.clone()));
    assert_eq!(
        cache_only.get_note_by_title("cached").unwrap(),
        Some(stored)
    );
}

#[test]
fn save_invalidates_cached_keys_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store
        .upsert(&Note::new("Test Update", "This note will be inserted now"))
        .unwrap();
    repo.get_note_by_id(stored.id).unwrap();
    assert!(cache.exists(&id_key(stored.id)).unwrap());

    let mut changed = stored.clone();
    changed.content = "This note has been updated".to_string();
    let saved = repo.save_note(&changed).unwrap();

    assert!(!cache.exists(&id_key(stored.id)).unwrap());
    assert!(!cache.exists(&title_key("Test Update")).unwrap());
    let in_store = store.find_by_id(stored.id).unwrap().unwrap();
    assert_eq!(in_store.content, "This note has been updated");
    assert_eq!(in_store, saved);
    assert_eq!(in_store.created_at, stored.created_at);
}

#[test]
fn rename_invalidates_previous_title_key() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store.upsert(&Note::new("old title", "body")).unwrap();
    repo.get_note_by_title("old title").unwrap();

    let mut renamed = stored.clone();
    renamed.title = "new title".to_string();
    repo.save_note(&renamed).unwrap();

    assert!(cache.keys().unwrap().is_empty());
    assert!(repo.get_note_by_title("old title").unwrap().is_none());
    let by_new_title = repo.get_note_by_title("new title").unwrap().unwrap();
    assert_eq!(by_new_title.id, stored.id);
}

#[test]
fn read_after_save_sees_new_content() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let mut note = repo.save_note(&Note::new("draft", "v1")).unwrap();
    repo.get_note_by_id(note.id).unwrap();

    note.content = "v2".to_string();
    repo.save_note(&note).unwrap();

    assert_eq!(repo.get_note_by_id(note.id).unwrap().unwrap().content, "v2");
    assert_eq!(
        repo.get_note_by_title("draft").unwrap().unwrap().content,
        "v2"
    );
}

#[test]
fn delete_clears_both_cache_keys_and_row() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store
        .upsert(&Note::new("Test Update", "This note will be deleted"))
        .unwrap();
    repo.get_note_by_id(stored.id).unwrap();

    repo.delete_note(stored.id).unwrap();

    assert!(!cache.exists(&id_key(stored.id)).unwrap());
    assert!(!cache.exists(&title_key("Test Update")).unwrap());
    assert!(store.find_by_id(stored.id).unwrap().is_none());
}

#[test]
fn delete_without_cache_entry_still_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store.upsert(&Note::new("uncached", "body")).unwrap();

    repo.delete_note(stored.id).unwrap();

    assert!(store.find_by_id(stored.id).unwrap().is_none());
}

#[test]
fn delete_twice_is_safe() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = repo.save_note(&Note::new("twice", "body")).unwrap();
    repo.get_note_by_id(stored.id).unwrap();

    repo.delete_note(stored.id).unwrap();
    repo.delete_note(stored.id).unwrap();

    assert!(repo.get_note_by_id(stored.id).unwrap().is_none());
}

#[test]
fn missing_note_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);

    assert!(repo.get_note_by_id(12345).unwrap().is_none());
    assert!(repo.get_note_by_title("nope").unwrap().is_none());
    assert!(cache.keys().unwrap().is_empty());
}

#[test]
fn cached_record_round_trips_with_nanosecond_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let stored = store.upsert(&Note::new("precise", "body")).unwrap();
    CachedNoteRepository::new(&store, &cache)
        .get_note_by_id(stored.id)
        .unwrap();

    let from_cache = CachedNoteRepository::new(UnreachableStore, &cache)
        .get_note_by_id(stored.id)
        .unwrap()
        .unwrap();

    assert_eq!(from_cache.id, stored.id);
    assert_eq!(from_cache.title, stored.title);
    assert_eq!(from_cache.content, stored.content);
    assert_eq!(from_cache.created_at, stored.created_at);
    assert_eq!(from_cache.updated_at, stored.updated_at);
}

#[test]
fn corrupt_cache_entry_is_reported_not_refetched() {
    let cache = InMemoryHashCache::new();
    cache.hash_set("notes:7", "id", "seven").unwrap();
    cache.hash_set("notes:7", "title", "t").unwrap();
    cache.hash_set("notes:7", "content", "c").unwrap();
    cache
        .hash_set("notes:7", "created_at", "2024-03-01T10:20:30.000000001Z")
        .unwrap();
    cache
        .hash_set("notes:7", "updated_at", "2024-03-01T10:20:30.000000001Z")
        .unwrap();
    let repo = CachedNoteRepository::new(UnreachableStore, &cache);

    let err = repo.get_note_by_id(7).unwrap_err();
    match err {
        RepoError::CorruptCacheEntry { key, source } => {
            assert_eq!(key, "notes:7");
            assert_eq!(source, CodecError::InvalidId("seven".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupt_timestamp_is_reported_on_title_lookup() {
    let cache = InMemoryHashCache::new();
    for (field, value) in [
        ("id", "3"),
        ("title", "t"),
        ("content", "c"),
        ("created_at", "2024-03-01 10:20:30"),
        ("updated_at", "2024-03-01T10:20:30Z"),
    ] {
        cache.hash_set("notes:t", field, value).unwrap();
    }
    let repo = CachedNoteRepository::new(UnreachableStore, &cache);

    let err = repo.get_note_by_title("t").unwrap_err();
    assert!(matches!(
        err,
        RepoError::CorruptCacheEntry {
            source: CodecError::InvalidTimestamp { field: "created_at", .. },
            ..
        }
    ));
}

#[test]
fn record_under_foreign_id_key_is_a_miss() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let stored = store.upsert(&Note::new("mine", "body")).unwrap();
    let foreign_key = id_key(stored.id + 1);
    cache
        .hash_set_all(&foreign_key, &encode_note(&stored).unwrap())
        .unwrap();
    let repo = CachedNoteRepository::new(&store, &cache);

    assert!(repo.get_note_by_id(stored.id + 1).unwrap().is_none());
}

#[test]
fn digit_title_sharing_an_id_key_does_not_lock_out_the_note() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let first = store.upsert(&Note::new("x", "first")).unwrap();
    let second = store.upsert(&Note::new(first.id.to_string(), "second")).unwrap();

    // Caching `second` writes its record under `notes:<first.id>` too.
    repo.get_note_by_id(second.id).unwrap();
    assert_eq!(repo.get_note_by_id(first.id).unwrap().unwrap(), first);
    assert_eq!(repo.get_note_by_title(&second.title).unwrap().unwrap(), second);

    let mut changed = first.clone();
    changed.content = "updated".to_string();
    repo.save_note(&changed).unwrap();
    assert_eq!(store.find_by_id(first.id).unwrap().unwrap().content, "updated");

    repo.get_note_by_title("x").unwrap();
    repo.get_note_by_title(&second.title).unwrap();
    repo.delete_note(first.id).unwrap();

    assert!(store.find_by_id(first.id).unwrap().is_none());
    assert!(!cache.exists(&title_key("x")).unwrap());
    assert!(repo.get_note_by_title("x").unwrap().is_none());
    assert_eq!(repo.get_note_by_id(second.id).unwrap().unwrap(), second);
}

#[test]
fn save_over_corrupt_id_key_invalidates_and_writes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store.upsert(&Note::new("draft", "v1")).unwrap();
    repo.get_note_by_id(stored.id).unwrap();
    cache.hash_set(&id_key(stored.id), "id", "garbage").unwrap();

    let mut changed = stored.clone();
    changed.content = "v2".to_string();
    repo.save_note(&changed).unwrap();

    assert!(!cache.exists(&id_key(stored.id)).unwrap());
    assert!(!cache.exists(&title_key("draft")).unwrap());
    assert_eq!(store.find_by_id(stored.id).unwrap().unwrap().content, "v2");
    assert_eq!(repo.get_note_by_id(stored.id).unwrap().unwrap().content, "v2");
}

#[test]
fn delete_over_corrupt_id_key_clears_both_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    let stored = store.upsert(&Note::new("doomed", "body")).unwrap();
    repo.get_note_by_id(stored.id).unwrap();
    cache.hash_set(&id_key(stored.id), "created_at", "yesterday").unwrap();

    repo.delete_note(stored.id).unwrap();

    assert!(cache.keys().unwrap().is_empty());
    assert!(store.find_by_id(stored.id).unwrap().is_none());
}

#[test]
fn duplicate_title_error_is_returned_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let cache = InMemoryHashCache::new();
    let repo = CachedNoteRepository::new(&store, &cache);
    repo.save_note(&Note::new("taken", "a")).unwrap();

    let err = repo.save_note(&Note::new("taken", "b")).unwrap_err();
    assert!(matches!(err, RepoError::Store(StoreError::DuplicateTitle(_))));
}

#[test]
fn cache_failures_are_propagated() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let stored = store.upsert(&Note::new("kept", "body")).unwrap();
    let repo = CachedNoteRepository::new(&store, BrokenCache);

    assert!(matches!(
        repo.get_note_by_id(stored.id),
        Err(RepoError::Cache(CacheError::Poisoned))
    ));
    assert!(matches!(
        repo.save_note(&stored),
        Err(RepoError::Cache(CacheError::Poisoned))
    ));
    assert!(matches!(
        repo.delete_note(stored.id),
        Err(RepoError::Cache(CacheError::Poisoned))
    ));

    // Invalidation failed first, so the row was never touched.
    assert_eq!(store.find_by_id(stored.id).unwrap().unwrap(), stored);
}
