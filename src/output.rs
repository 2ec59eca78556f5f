//! Output formatting for the CLI
//!
//! Two surfaces: a human listing/show view, and a porcelain JSON mode with a
//! frozen field set. Porcelain fields are always present (null when absent)
//! and are never removed across versions; scripts depend on that.

use serde::Serialize;

use crate::error::Error;
use crate::ical::DateValue;
use crate::todo::{priority_label, Todo};

const RESET: &str = "\x1b[0m";

/// Render `#RRGGBB` as a 24-bit ANSI foreground escape
pub fn rgb_to_ansi(colour: &str) -> Option<String> {
    let hex = colour.strip_prefix('#')?;
    // The colour file is user data; non-ASCII bytes must not panic the slice.
    if hex.len() < 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(format!("\x1b[38;2;{r};{g};{b}m"))
}

/// Formats todos with the user's configured date and time formats
pub struct Formatter {
    pub date_format: String,
    pub datetime_format: String,
    pub colour: bool,
}

impl Formatter {
    pub fn format_date(&self, value: &DateValue) -> String {
        match value {
            DateValue::Date(d) => d.format(&self.date_format).to_string(),
            DateValue::DateTime(dt) => dt
                .with_timezone(&chrono::Local)
                .format(&self.datetime_format)
                .to_string(),
        }
    }

    /// One-line listing entry: `id [x] !! due summary @list`
    pub fn todo_line(&self, todo: &Todo, list_colour: Option<&str>) -> String {
        let id = todo.id.unwrap_or(0);
        let done = if todo.is_completed() { "X" } else { " " };
        let bang = match todo.priority {
            0 => "  ",
            1..=4 => "!!",
            _ => " !",
        };
        let due = todo
            .due
            .as_ref()
            .map(|d| self.format_date(d))
            .unwrap_or_default();

        let list = match list_colour.filter(|_| self.colour).and_then(rgb_to_ansi) {
            Some(ansi) => format!("{ansi}@{}{RESET}", todo.list_name),
            None => format!("@{}", todo.list_name),
        };

        let mut line = format!("{id:3} [{done}] {bang} ");
        if !due.is_empty() {
            line.push_str(&due);
            line.push(' ');
        }
        line.push_str(&todo.summary);
        line.push(' ');
        line.push_str(&list);
        line
    }

    /// Multi-line detail view for `show`
    pub fn todo_detail(&self, todo: &Todo) -> String {
        let mut out = String::new();
        let id = todo.id.unwrap_or(0);
        out.push_str(&format!("{id} {}\n", todo.summary));
        out.push_str(&format!("Status: {}\n", todo.status.as_str()));
        out.push_str(&format!("List: {}\n", todo.list_name));
        out.push_str(&format!("UID: {}\n", todo.uid));
        if todo.priority > 0 {
            out.push_str(&format!(
                "Priority: {} ({})\n",
                priority_label(todo.priority),
                todo.priority
            ));
        }
        if todo.percent_complete > 0 {
            out.push_str(&format!("Percent complete: {}%\n", todo.percent_complete));
        }
        if let Some(start) = &todo.start {
            out.push_str(&format!("Start: {}\n", self.format_date(start)));
        }
        if let Some(due) = &todo.due {
            out.push_str(&format!("Due: {}\n", self.format_date(due)));
        }
        if !todo.categories.is_empty() {
            out.push_str(&format!("Categories: {}\n", todo.categories.join(", ")));
        }
        if !todo.location.is_empty() {
            out.push_str(&format!("Location: {}\n", todo.location));
        }
        if todo.is_recurring() {
            out.push_str(&format!("Recurring: {}\n", todo.rrule));
        }
        if !todo.description.is_empty() {
            out.push('\n');
            out.push_str(&todo.description);
            out.push('\n');
        }
        out
    }
}

/// The stable porcelain representation of one todo.
/// Field names and presence are a compatibility contract.
#[derive(Debug, Serialize)]
pub struct PorcelainTodo<'a> {
    pub id: i64,
    pub list: &'a str,
    pub list_colour: Option<&'a str>,
    pub summary: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub completed: bool,
    pub percent: u8,
    pub priority: u8,
    pub categories: &'a [String],
    pub start: Option<i64>,
    pub due: Option<i64>,
    pub completed_at: Option<i64>,
    pub recurring: bool,
}

impl<'a> PorcelainTodo<'a> {
    pub fn from_todo(todo: &'a Todo, list_colour: Option<&'a str>) -> Self {
        Self {
            id: todo.id.unwrap_or(0),
            list: &todo.list_name,
            list_colour,
            summary: &todo.summary,
            description: non_empty(&todo.description),
            location: non_empty(&todo.location),
            completed: todo.is_completed(),
            percent: todo.percent_complete,
            priority: todo.priority,
            categories: &todo.categories,
            start: todo.start.as_ref().map(DateValue::timestamp),
            due: todo.due.as_ref().map(DateValue::timestamp),
            completed_at: todo.completed_at.map(|dt| dt.timestamp()),
            recurring: todo.is_recurring(),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Serialize todos as the porcelain JSON array
pub fn porcelain_json(todos: &[PorcelainTodo<'_>]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(todos)
}

/// Print an error to stderr as a single line, with a next-step hint when one
/// exists. No stack traces.
pub fn emit_error(err: &Error) {
    eprintln!("error: {err}");
    if let Some(hint) = hint_for(err) {
        eprintln!("hint: {hint}");
    }
}

fn hint_for(err: &Error) -> Option<&'static str> {
    match err {
        Error::Cache(_) => Some("delete the cache file to force a rebuild"),
        Error::NoSuchTodo(_) => Some("run 'vido list' to see current ids"),
        Error::ReadOnlyTodo(_) => {
            Some("files holding several todos can be read but not modified")
        }
        Error::InvalidConfig(_) => Some("check config.toml, or set VIDO_CONFIG"),
        _ => None,
    }
}

/// Print reconcile warnings (skipped files, duplicate UIDs) to stderr.
pub fn emit_reconcile_warnings(report: &crate::cache::ReconcileReport) {
    for (path, reason) in &report.skipped {
        eprintln!("warning: skipping {}: {reason}", path.display());
    }
    for (path, uid) in &report.duplicates {
        eprintln!(
            "warning: {} duplicates UID {uid}; using the most recently modified file",
            path.display()
        );
    }
}
