//! Note domain model.
//!
//! # Responsibility
//! - Define the note record and its identity rules.
//! - Validate caller-controlled fields before persistence.
//!
//! # Invariants
//! - `id` is `0` until the store assigns a positive id on first insert.
//! - `created_at` is set once by the store and never changes afterward.
//! - `updated_at` should not be earlier than `created_at` when both are set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier. Positive once persisted.
pub type NoteId = i64;

/// Validation error for note fields owned by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
    /// `updated_at` precedes `created_at`.
    UpdatedBeforeCreated,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::UpdatedBeforeCreated => {
                write!(f, "note updated_at must not be earlier than created_at")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned id; `0` while unsaved.
    pub id: NoteId,
    /// Unique, non-blank title.
    pub title: String,
    /// Free-form body.
    pub content: String,
    /// First insert time. `None` while unsaved.
    pub created_at: Option<DateTime<Utc>>,
    /// Last persisted write time. `None` while unsaved.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Creates an unsaved note; id and timestamps are left for the store.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns whether the store has assigned this note an id.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Checks caller-controlled invariants.
    ///
    /// Uniqueness of `title` is not checked here; the store owns it.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        if let (Some(created), Some(updated)) = (self.created_at, self.updated_at) {
            if updated < created {
                return Err(NoteValidationError::UpdatedBeforeCreated);
            }
        }
        Ok(())
    }
}
