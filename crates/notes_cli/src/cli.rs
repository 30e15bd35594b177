//! Command-line arguments.
//!
//! Every connection setting can also come from the environment so the
//! binary can run under a process supervisor without flags.

use clap::{Parser, Subcommand};
use notes_core::NoteId;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notes", version, about = "Notes backed by SQLite with a read-through cache")]
pub struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, env = "NOTES_DB", default_value = "notes.sqlite3")]
    pub db: PathBuf,

    /// Redis URL for the shared cache. Without it a process-local cache is used.
    #[arg(long, env = "NOTES_REDIS_URL")]
    pub redis_url: Option<String>,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "NOTES_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long, env = "NOTES_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print core health and version without opening storage.
    Ping,
    /// Create a note with a unique title.
    Create { title: String, content: String },
    /// Replace the content of an existing note.
    Update { id: NoteId, content: String },
    /// Print one note by id.
    Get { id: NoteId },
    /// Print one note by exact title.
    GetByTitle { title: String },
    /// Delete one note by id.
    Delete { id: NoteId },
}
