//! Command-line interface for vido
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is defined in its own submodule.

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::ical::DateValue;
use crate::output::{self, Formatter, PorcelainTodo};
use crate::todo::{Status, Todo};

mod edit;
mod lifecycle;
mod list;
mod new;
mod show;
mod transfer;

/// vido - VTODO task manager
///
/// Manages RFC 5545 todo files in vdir-style list directories, the same
/// storage a CalDAV sync client writes.
#[derive(Parser, Debug)]
#[command(name = "vido")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub porcelain: bool,

    /// When to colour the output
    #[arg(long, global = true, value_enum, default_value_t = ColourMode::Auto)]
    pub colour: ColourMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColourMode {
    Auto,
    Always,
    Never,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List todos, filtered and sorted
    List {
        /// Restrict to these lists
        lists: Vec<String>,

        /// Statuses to show (comma-separated, or ANY for all)
        #[arg(long)]
        status: Option<String>,

        /// Only todos carrying any of these categories
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Substring match on summary and description
        #[arg(long)]
        grep: Option<String>,

        /// Substring match on location
        #[arg(long)]
        location: Option<String>,

        /// Only todos at least this important (low, medium, high, or 0-9)
        #[arg(long)]
        priority: Option<String>,

        /// Only todos due within this many hours
        #[arg(long)]
        due: Option<u32>,

        /// Only todos starting on or before this date
        #[arg(long)]
        start_before: Option<String>,

        /// Only todos starting on or after this date
        #[arg(long)]
        start_after: Option<String>,

        /// Only todos that can be started (no start date, or started)
        #[arg(long)]
        startable: bool,

        /// Sort specification, e.g. "due,-priority"; `-` reverses a key
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
    },

    /// Create a todo
    New {
        /// Summary of the new todo
        #[arg(required = true)]
        summary: Vec<String>,

        /// List to create the todo in
        #[arg(short, long)]
        list: Option<String>,

        /// Due date
        #[arg(short, long)]
        due: Option<String>,

        /// Start date
        #[arg(short, long)]
        start: Option<String>,

        /// Priority (low, medium, high, or 0-9)
        #[arg(short, long)]
        priority: Option<String>,

        /// Location
        #[arg(long)]
        location: Option<String>,

        /// Categories
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Long description
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit one or more todos
    Edit {
        /// Ids to edit
        #[arg(required = true)]
        ids: Vec<i64>,

        /// New summary
        #[arg(long)]
        summary: Option<String>,

        /// New due date; an empty string clears it
        #[arg(short, long)]
        due: Option<String>,

        /// New start date; an empty string clears it
        #[arg(short, long)]
        start: Option<String>,

        /// New priority (low, medium, high, or 0-9)
        #[arg(short, long)]
        priority: Option<String>,

        /// New location; an empty string clears it
        #[arg(long)]
        location: Option<String>,

        /// New categories, replacing the old set
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// New description; an empty string clears it
        #[arg(long)]
        description: Option<String>,

        /// Open the raw .ics file in $EDITOR instead
        #[arg(long)]
        raw: bool,
    },

    /// Show a todo in detail
    Show {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Print the file path backing a todo
    Path {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Mark todos as done
    Done {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Restore completed or cancelled todos to NEEDS-ACTION
    Undo {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Mark todos as cancelled
    Cancel {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete todos from disk
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Copy todos into another list under a new identity
    Copy {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Destination list
        #[arg(short, long)]
        to: String,
    },

    /// Move todos into another list
    Move {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Destination list
        #[arg(short, long)]
        to: String,
    },

    /// Delete all completed and cancelled todos from disk
    Flush {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Everything a command needs at runtime
pub struct Context {
    pub config: Config,
    pub db: Database,
    pub formatter: Formatter,
    pub porcelain: bool,
}

impl Context {
    /// Print todos on stdout, as the porcelain JSON array or as human lines.
    pub fn print_todos(&self, todos: &[Todo]) -> Result<()> {
        if self.porcelain {
            let rows: Vec<PorcelainTodo<'_>> = todos
                .iter()
                .map(|t| PorcelainTodo::from_todo(t, self.db.list_colour(&t.list_name)))
                .collect();
            println!("{}", output::porcelain_json(&rows)?);
        } else {
            for todo in todos {
                let colour = self.db.list_colour(&todo.list_name);
                println!("{}", self.formatter.todo_line(todo, colour));
            }
        }
        Ok(())
    }

    /// Parse a user-typed date or datetime with the configured formats.
    pub fn parse_date(&self, value: &str) -> Result<DateValue> {
        let value = value.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, &self.config.datetime_format()) {
            let utc = Local
                .from_local_datetime(&dt)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .unwrap_or_else(|| dt.and_utc());
            return Ok(DateValue::DateTime(utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, &self.config.date_format) {
            return Ok(DateValue::Date(date));
        }
        Err(Error::InvalidArgument(format!(
            "cannot parse '{value}' with '{}' or '{}'",
            self.config.datetime_format(),
            self.config.date_format
        )))
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = Config::discover(self.config.as_deref())?;
        let (db, report) = Database::open(&config.list_pattern(), config.cache_file()?)?;
        output::emit_reconcile_warnings(&report);

        let colour = match self.colour {
            ColourMode::Always => true,
            ColourMode::Never => false,
            ColourMode::Auto => std::io::stdout().is_terminal(),
        };
        let formatter = Formatter {
            date_format: config.date_format.clone(),
            datetime_format: config.datetime_format(),
            colour,
        };
        let mut ctx = Context {
            config,
            db,
            formatter,
            porcelain: self.porcelain,
        };

        match self.command {
            Commands::List {
                lists,
                status,
                categories,
                grep,
                location,
                priority,
                due,
                start_before,
                start_after,
                startable,
                sort,
            } => list::run(
                &ctx,
                list::Options {
                    lists,
                    status,
                    categories,
                    grep,
                    location,
                    priority,
                    due,
                    start_before,
                    start_after,
                    startable,
                    sort,
                },
            ),
            Commands::New {
                summary,
                list,
                due,
                start,
                priority,
                location,
                categories,
                description,
            } => new::run(
                &mut ctx,
                new::Options {
                    summary: summary.join(" "),
                    list,
                    due,
                    start,
                    priority,
                    location,
                    categories,
                    description,
                },
            ),
            Commands::Edit {
                ids,
                summary,
                due,
                start,
                priority,
                location,
                categories,
                description,
                raw,
            } => edit::run(
                &mut ctx,
                edit::Options {
                    ids,
                    summary,
                    due,
                    start,
                    priority,
                    location,
                    categories,
                    description,
                    raw,
                },
            ),
            Commands::Show { ids } => show::run_show(&ctx, &ids),
            Commands::Path { ids } => show::run_path(&ctx, &ids),
            Commands::Done { ids } => lifecycle::run_done(&mut ctx, &ids),
            Commands::Undo { ids } => lifecycle::run_undo(&mut ctx, &ids),
            Commands::Cancel { ids } => lifecycle::run_cancel(&mut ctx, &ids),
            Commands::Delete { ids, yes } => lifecycle::run_delete(&mut ctx, &ids, yes),
            Commands::Flush { yes } => lifecycle::run_flush(&mut ctx, yes),
            Commands::Copy { ids, to } => transfer::run_copy(&mut ctx, &ids, &to),
            Commands::Move { ids, to } => transfer::run_move(&mut ctx, &ids, &to),
        }
    }
}

/// Parse the `--status` value: a comma-separated set, or ANY for everything.
/// None keeps the default (pending todos only).
pub fn parse_statuses(value: Option<&str>) -> Result<Option<Vec<Status>>> {
    let Some(value) = value else { return Ok(None) };
    if value.trim().eq_ignore_ascii_case("any") {
        return Ok(Some(Status::ALL.to_vec()));
    }
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Status::parse)
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Run `f` for every id; failures are reported but do not stop the rest.
/// The last failure becomes the command's result, earlier ones are printed
/// here.
pub fn for_each_id(ids: &[i64], mut f: impl FnMut(i64) -> Result<()>) -> Result<()> {
    let mut failed: Option<Error> = None;
    for &id in ids {
        if let Err(err) = f(id) {
            if let Some(prev) = failed.replace(err) {
                output::emit_error(&prev);
            }
        }
    }
    match failed {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Ask a yes/no question on the terminal; anything but y/yes declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_arg_parsing() {
        assert_eq!(parse_statuses(None).unwrap(), None);
        assert_eq!(
            parse_statuses(Some("ANY")).unwrap(),
            Some(Status::ALL.to_vec())
        );
        assert_eq!(
            parse_statuses(Some("completed,in-process")).unwrap(),
            Some(vec![Status::Completed, Status::InProcess])
        );
        assert!(parse_statuses(Some("bogus")).is_err());
    }

    #[test]
    fn for_each_id_continues_past_failures() {
        let mut seen = Vec::new();
        let result = for_each_id(&[1, 2, 3], |id| {
            seen.push(id);
            if id == 2 {
                Err(Error::NoSuchTodo(id))
            } else {
                Ok(())
            }
        });
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(matches!(result, Err(Error::NoSuchTodo(2))));
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
