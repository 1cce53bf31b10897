//! Command-line driver for calmerge.
//!
//! # Responsibility
//! - Map subcommands onto `calmerge_core` services.
//! - Print results as JSON on stdout; errors go to stderr with exit code 1.

use anyhow::{Context, Result};
use calmerge_core::db::open_db;
use calmerge_core::{
    default_log_level, init_logging, CreateEventRequest, EventService, EventStatus,
    SqliteEventRepository, SqliteUserRepository, UserService,
};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "calmerge")]
#[command(about = "Keep calendar events and merge overlapping ones")]
struct Cli {
    /// SQLite database file, created if missing.
    #[arg(long, default_value = "calmerge.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error (defaults to debug in debug builds).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Health check.
    Ping,
    /// Manage users.
    #[command(subcommand)]
    User(UserCommand),
    /// Manage events.
    #[command(subcommand)]
    Event(EventCommand),
    /// Merge every run of overlapping events attended by a user.
    Merge { user_id: Uuid },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Add { name: String },
    List,
    Show { id: Uuid },
    Remove { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// todo|in_progress|completed
        #[arg(long, default_value = "todo", value_parser = parse_status)]
        status: EventStatus,
        /// Start, epoch milliseconds.
        #[arg(long)]
        start: i64,
        /// End, epoch milliseconds.
        #[arg(long)]
        end: i64,
        /// Attendee user ID; repeatable.
        #[arg(long = "invitee")]
        invitees: Vec<Uuid>,
    },
    Show { id: Uuid },
    Remove { id: Uuid },
}

fn parse_status(value: &str) -> Result<EventStatus, String> {
    EventStatus::parse(value)
        .ok_or_else(|| format!("unknown status `{value}`; expected todo|in_progress|completed"))
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    if let Command::Ping = cli.command {
        println!("{}", calmerge_core::ping());
        return Ok(());
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    info!("event=cli_command module=cli status=start db={}", cli.db.display());

    match cli.command {
        Command::Ping => Ok(()),
        Command::User(command) => run_user(&conn, command),
        Command::Event(command) => run_event(&conn, command),
        Command::Merge { user_id } => {
            let merged = event_service(&conn)?.merge_all_overlapping_events(user_id)?;
            print_json(&merged)
        }
    }
}

fn run_user(conn: &Connection, command: UserCommand) -> Result<()> {
    let service = UserService::new(SqliteUserRepository::try_new(conn)?);
    match command {
        UserCommand::Add { name } => print_json(&service.create_user(&name)?),
        UserCommand::List => print_json(&service.list_users()?),
        UserCommand::Show { id } => print_json(&service.get_user(id)?),
        UserCommand::Remove { id } => {
            service.remove_user(id)?;
            Ok(())
        }
    }
}

fn run_event(conn: &Connection, command: EventCommand) -> Result<()> {
    let service = event_service(conn)?;
    match command {
        EventCommand::Add {
            title,
            description,
            status,
            start,
            end,
            invitees,
        } => {
            let request = CreateEventRequest {
                title,
                description,
                status,
                start_ms: start,
                end_ms: end,
                invitee_ids: invitees,
            };
            print_json(&service.create_event(&request)?)
        }
        EventCommand::Show { id } => print_json(&service.get_event(id)?),
        EventCommand::Remove { id } => {
            service.remove_event(id)?;
            Ok(())
        }
    }
}

fn event_service(
    conn: &Connection,
) -> Result<EventService<SqliteEventRepository<'_>, SqliteUserRepository<'_>>> {
    Ok(EventService::new(
        SqliteEventRepository::try_new(conn)?,
        SqliteUserRepository::try_new(conn)?,
    ))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_status, Cli, Command, EventCommand};
    use calmerge_core::EventStatus;
    use clap::Parser;

    #[test]
    fn parses_event_add_with_repeated_invitees() {
        let a = "11111111-2222-4333-8444-555555555555";
        let b = "66666666-7777-4888-9999-aaaaaaaaaaaa";
        let cli = Cli::try_parse_from([
            "calmerge",
            "event",
            "add",
            "--title",
            "sync",
            "--status",
            "IN_PROGRESS",
            "--start",
            "0",
            "--end",
            "10",
            "--invitee",
            a,
            "--invitee",
            b,
        ])
        .unwrap();

        match cli.command {
            Command::Event(EventCommand::Add {
                status, invitees, ..
            }) => {
                assert_eq!(status, EventStatus::InProgress);
                assert_eq!(invitees.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        assert!(parse_status("done").is_err());
    }
}
