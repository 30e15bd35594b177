//! `notes` command-line entry point.
//!
//! Wires a SQLite file and a cache backend into the core service and runs a
//! single command. Notes are printed as JSON.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use log::info;
use notes_core::db::open_db;
use notes_core::{
    default_log_level, init_logging, CachedNoteRepository, HashCache, InMemoryHashCache, Note,
    NoteService, SqliteNoteStore,
};
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = log_dir
            .to_str()
            .ok_or("log directory must be valid UTF-8")?;
        init_logging(level, log_dir)?;
    }

    if cli.command == Command::Ping {
        return print_ping();
    }

    let conn = open_db(&cli.db)?;
    let store = SqliteNoteStore::try_new(&conn)?;
    match cli.redis_url.as_deref() {
        Some(url) => execute_with_redis(&store, url, cli.command),
        None => execute(&store, InMemoryHashCache::new(), cli.command),
    }
}

#[cfg(feature = "redis")]
fn execute_with_redis(
    store: &SqliteNoteStore<'_>,
    url: &str,
    command: Command,
) -> CliResult<()> {
    execute(store, notes_core::RedisHashCache::open(url)?, command)
}

#[cfg(not(feature = "redis"))]
fn execute_with_redis(
    _store: &SqliteNoteStore<'_>,
    _url: &str,
    _command: Command,
) -> CliResult<()> {
    Err("a redis URL was given but notes_cli was built without the `redis` feature".into())
}

fn execute<C: HashCache>(
    store: &SqliteNoteStore<'_>,
    cache: C,
    command: Command,
) -> CliResult<()> {
    let service = NoteService::new(CachedNoteRepository::new(store, cache));
    match command {
        Command::Ping => print_ping(),
        Command::Create { title, content } => print_note(&service.create_note(title, content)?),
        Command::Update { id, content } => print_note(&service.update_note(id, content)?),
        Command::Get { id } => print_note(&service.get_note_by_id(id)?),
        Command::GetByTitle { title } => print_note(&service.get_note_by_title(&title)?),
        Command::Delete { id } => {
            service.delete_note(id)?;
            info!("event=cli_delete module=cli status=ok note_id={id}");
            println!("{{\"deleted\":{id}}}");
            Ok(())
        }
    }
}

fn print_ping() -> CliResult<()> {
    println!("notes_core ping={}", notes_core::ping());
    println!("notes_core version={}", notes_core::core_version());
    Ok(())
}

fn print_note(note: &Note) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(note)?);
    Ok(())
}
