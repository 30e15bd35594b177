//! Note cache key scheme and field-set codec.
//!
//! Every cached note lives under two keys, `notes:<id>` and
//! `notes:<title>`, each holding the same five fields: `id`, `title`,
//! `content`, `created_at`, `updated_at`. `id` is a decimal string and
//! timestamps use the lossless RFC 3339 form from `model::timestamp`.

use crate::model::note::{Note, NoteId};
use crate::model::timestamp::{format_timestamp, parse_timestamp};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const KEY_PREFIX: &str = "notes";

pub const FIELD_ID: &str = "id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_CREATED_AT: &str = "created_at";
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Reason a note could not be converted to or from a cached field-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    MissingField(&'static str),
    InvalidId(String),
    InvalidTimestamp { field: &'static str, value: String },
    /// Only persisted notes (positive id, both timestamps) are cacheable.
    NotPersisted,
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidId(value) => write!(f, "invalid id `{value}`"),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "invalid timestamp `{value}` in field `{field}`")
            }
            Self::NotPersisted => write!(f, "note is not persisted"),
        }
    }
}

impl Error for CodecError {}

/// Cache key addressing a note by id.
pub fn id_key(id: NoteId) -> String {
    format!("{KEY_PREFIX}:{id}")
}

/// Cache key addressing a note by title.
pub fn title_key(title: &str) -> String {
    format!("{KEY_PREFIX}:{title}")
}

/// Keys to drop before writing `note`: its id-key when persisted and its
/// title-key when the title is non-empty.
pub fn invalidation_keys(note: &Note) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if note.is_persisted() {
        keys.push(id_key(note.id));
    }
    if !note.title.is_empty() {
        keys.push(title_key(&note.title));
    }
    keys
}

/// Encodes a persisted note into its five cached fields.
pub fn encode_note(note: &Note) -> Result<Vec<(&'static str, String)>, CodecError> {
    let (Some(created_at), Some(updated_at)) = (note.created_at, note.updated_at) else {
        return Err(CodecError::NotPersisted);
    };
    if !note.is_persisted() {
        return Err(CodecError::NotPersisted);
    }

    Ok(vec![
        (FIELD_ID, note.id.to_string()),
        (FIELD_TITLE, note.title.clone()),
        (FIELD_CONTENT, note.content.clone()),
        (FIELD_CREATED_AT, format_timestamp(created_at)),
        (FIELD_UPDATED_AT, format_timestamp(updated_at)),
    ])
}

/// Decodes a cached field-set back into a note.
///
/// Extra fields are ignored; any of the five being absent or malformed is
/// an error.
pub fn decode_note(fields: &HashMap<String, String>) -> Result<Note, CodecError> {
    let id_text = required(fields, FIELD_ID)?;
    let id = id_text
        .parse::<NoteId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CodecError::InvalidId(id_text.to_string()))?;

    Ok(Note {
        id,
        title: required(fields, FIELD_TITLE)?.to_string(),
        content: required(fields, FIELD_CONTENT)?.to_string(),
        created_at: Some(required_timestamp(fields, FIELD_CREATED_AT)?),
        updated_at: Some(required_timestamp(fields, FIELD_UPDATED_AT)?),
    })
}

fn required<'a>(
    fields: &'a HashMap<String, String>,
    field: &'static str,
) -> Result<&'a str, CodecError> {
    fields
        .get(field)
        .map(String::as_str)
        .ok_or(CodecError::MissingField(field))
}

fn required_timestamp(
    fields: &HashMap<String, String>,
    field: &'static str,
) -> Result<chrono::DateTime<chrono::Utc>, CodecError> {
    let value = required(fields, field)?;
    parse_timestamp(value).ok_or_else(|| CodecError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
