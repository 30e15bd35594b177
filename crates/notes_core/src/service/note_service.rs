//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/delete entry points over `NoteRepository`.
//! - Reject duplicate titles and map missing notes to `NoteNotFound`.
//!
//! # Invariants
//! - Callers never see store- or cache-specific error types; unexpected
//!   failures collapse into `NoteServiceError::Internal` after being logged.
//! - The service holds no caching logic of its own.

use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::repo::note_store::StoreError;
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteServiceError {
    /// Caller input violates note invariants.
    InvalidNote(NoteValidationError),
    /// Another note already uses this title.
    DuplicateNote,
    /// Target note does not exist.
    NoteNotFound,
    /// Unexpected persistence failure; details are logged, not returned.
    Internal,
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNote(err) => write!(f, "invalid note: {err}"),
            Self::DuplicateNote => write!(f, "note with same title already exists"),
            Self::NoteNotFound => write!(f, "note not found"),
            Self::Internal => write!(f, "something went wrong"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidNote(err) => Some(err),
            _ => None,
        }
    }
}

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a note with a title no other note uses.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let note = Note::new(title, content);
        note.validate().map_err(NoteServiceError::InvalidNote)?;

        let existing = self
            .repo
            .get_note_by_title(&note.title)
            .map_err(|err| internal("note_create", err))?;
        if existing.is_some() {
            return Err(NoteServiceError::DuplicateNote);
        }

        self.repo.save_note(&note).map_err(|err| match err {
            // Lost the race against a concurrent create with the same title.
            RepoError::Store(StoreError::DuplicateTitle(_)) => NoteServiceError::DuplicateNote,
            other => internal("note_create", other),
        })
    }

    /// Replaces the content of an existing note.
    pub fn update_note(
        &self,
        id: NoteId,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self
            .repo
            .get_note_by_id(id)
            .map_err(|err| internal("note_update", err))?
            .ok_or(NoteServiceError::NoteNotFound)?;
        note.content = content.into();

        self.repo.save_note(&note).map_err(|err| match err {
            RepoError::Store(StoreError::NotFound(_)) => NoteServiceError::NoteNotFound,
            other => internal("note_update", other),
        })
    }

    /// Gets one note by id.
    pub fn get_note_by_id(&self, id: NoteId) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note_by_id(id)
            .map_err(|err| internal("note_get", err))?
            .ok_or(NoteServiceError::NoteNotFound)
    }

    /// Gets one note by exact title.
    pub fn get_note_by_title(&self, title: &str) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note_by_title(title)
            .map_err(|err| internal("note_get", err))?
            .ok_or(NoteServiceError::NoteNotFound)
    }

    /// Deletes an existing note.
    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        self.get_note_by_id(id)?;
        self.repo
            .delete_note(id)
            .map_err(|err| internal("note_delete", err))
    }
}

fn internal(event: &'static str, err: RepoError) -> NoteServiceError {
    error!("event={event} module=service status=error error={err}");
    NoteServiceError::Internal
}
