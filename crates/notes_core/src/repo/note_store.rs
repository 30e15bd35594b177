//! Authoritative note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes by primary key and look them up by id or unique title.
//! - Own id assignment and `created_at`/`updated_at` stamping.
//!
//! # Invariants
//! - Lookups report a missing row as `Ok(None)`, never as an error.
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::model::timestamp::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by the authoritative note store.
#[derive(Debug)]
pub enum StoreError {
    Validation(NoteValidationError),
    Db(DbError),
    /// An update targeted an id with no row.
    NotFound(NoteId),
    /// Another live note already owns this title.
    DuplicateTitle(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateTitle(_) => write!(f, "a note with the same title already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Relational store operations required by the cached repository.
pub trait NoteStore {
    /// Point lookup by primary key.
    fn find_by_id(&self, id: NoteId) -> StoreResult<Option<Note>>;
    /// Point lookup by the unique `title` column.
    fn find_by_title(&self, title: &str) -> StoreResult<Option<Note>>;
    /// Inserts an unsaved note or updates a persisted one by id.
    ///
    /// Returns the record as stored, including assigned id and timestamps.
    fn upsert(&self, note: &Note) -> StoreResult<Note>;
    /// Deletes by primary key. Deleting a missing id is not an error.
    fn delete_by_id(&self, id: NoteId) -> StoreResult<()>;
}

impl<T: NoteStore + ?Sized> NoteStore for &T {
    fn find_by_id(&self, id: NoteId) -> StoreResult<Option<Note>> {
        (**self).find_by_id(id)
    }

    fn find_by_title(&self, title: &str) -> StoreResult<Option<Note>> {
        (**self).find_by_title(title)
    }

    fn upsert(&self, note: &Note) -> StoreResult<Note> {
        (**self).upsert(note)
    }

    fn delete_by_id(&self, id: NoteId) -> StoreResult<()> {
        (**self).delete_by_id(id)
    }
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Wraps a migrated connection, checking that the `notes` table exists.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        if !table_exists(conn, "notes")? {
            return Err(StoreError::MissingRequiredTable("notes"));
        }
        Ok(Self { conn })
    }

    fn insert(&self, note: &Note, now: DateTime<Utc>) -> StoreResult<Note> {
        let now_text = format_timestamp(now);
        self.conn
            .execute(
                "INSERT INTO notes (title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3);",
                params![note.title.as_str(), note.content.as_str(), now_text],
            )
            .map_err(|err| write_error(err, note.title.as_str()))?;

        Ok(Note {
            id: self.conn.last_insert_rowid(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    fn update(&self, note: &Note, now: DateTime<Utc>) -> StoreResult<Note> {
        let created_text: Option<String> = self
            .conn
            .query_row(
                "UPDATE notes
                 SET
                    title = ?2,
                    content = ?3,
                    updated_at = ?4
                 WHERE id = ?1
                 RETURNING created_at;",
                params![
                    note.id,
                    note.title.as_str(),
                    note.content.as_str(),
                    format_timestamp(now),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| write_error(err, note.title.as_str()))?;

        let Some(created_text) = created_text else {
            return Err(StoreError::NotFound(note.id));
        };

        Ok(Note {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: Some(parse_column_timestamp(&created_text, "created_at")?),
            updated_at: Some(now),
        })
    }

    fn find_one(&self, filter: &str, value: &dyn rusqlite::ToSql) -> StoreResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn find_by_id(&self, id: NoteId) -> StoreResult<Option<Note>> {
        self.find_one("id", &id)
    }

    fn find_by_title(&self, title: &str) -> StoreResult<Option<Note>> {
        self.find_one("title", &title)
    }

    fn upsert(&self, note: &Note) -> StoreResult<Note> {
        note.validate()?;

        let now = Utc::now();
        if note.is_persisted() {
            self.update(note, now)
        } else {
            self.insert(note, now)
        }
    }

    fn delete_by_id(&self, id: NoteId) -> StoreResult<()> {
        self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn write_error(err: rusqlite::Error, title: &str) -> StoreError {
    let err = DbError::from(err);
    if err.is_unique_violation() {
        StoreError::DuplicateTitle(title.to_string())
    } else {
        StoreError::Db(err)
    }
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let id: NoteId = row.get("id")?;
    if id <= 0 {
        return Err(StoreError::InvalidData(format!(
            "non-positive id `{id}` in notes.id"
        )));
    }

    let created_text: String = row.get("created_at")?;
    let updated_text: String = row.get("updated_at")?;

    let note = Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: Some(parse_column_timestamp(&created_text, "created_at")?),
        updated_at: Some(parse_column_timestamp(&updated_text, "updated_at")?),
    };
    note.validate()?;
    Ok(note)
}

fn parse_column_timestamp(value: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    parse_timestamp(value).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid timestamp `{value}` in notes.{column}"))
    })
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
