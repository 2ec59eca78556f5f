//! `vido edit`

use std::process::Command;

use crate::cli::{for_each_id, Context};
use crate::error::{Error, Result};
use crate::ical::DateValue;
use crate::todo::parse_priority;

pub struct Options {
    pub ids: Vec<i64>,
    pub summary: Option<String>,
    pub due: Option<String>,
    pub start: Option<String>,
    pub priority: Option<String>,
    pub location: Option<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub raw: bool,
}

pub fn run(ctx: &mut Context, opts: Options) -> Result<()> {
    if opts.raw {
        return run_raw(ctx, &opts.ids);
    }

    // Parse shared values once so a bad date fails before touching anything.
    let due = parse_clearable(ctx, opts.due.as_deref())?;
    let start = parse_clearable(ctx, opts.start.as_deref())?;
    let priority = opts.priority.as_deref().map(parse_priority).transpose()?;

    let ids = opts.ids.clone();
    for_each_id(&ids, |id| {
        let mut todo = ctx.db.todo_for_update(id)?;

        if let Some(summary) = &opts.summary {
            todo.summary = summary.clone();
        }
        if let Some(value) = &due {
            todo.due = *value;
        }
        if let Some(value) = &start {
            todo.start = *value;
        }
        if let Some(priority) = priority {
            todo.priority = priority;
        }
        if let Some(location) = &opts.location {
            todo.location = location.clone();
        }
        if !opts.categories.is_empty() {
            todo.categories = opts.categories.clone();
        }
        if let Some(description) = &opts.description {
            todo.description = description.clone();
        }

        if let Some(warning) = ctx.db.save(&mut todo)? {
            eprintln!("warning: {warning}");
        }
        ctx.print_todos(&[todo])
    })
}

/// `None` = flag absent, `Some(None)` = clear, `Some(Some(_))` = set.
fn parse_clearable(ctx: &Context, value: Option<&str>) -> Result<Option<Option<DateValue>>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(Some(None)),
        Some(v) => Ok(Some(Some(ctx.parse_date(v)?))),
    }
}

/// Hand the raw .ics file to $EDITOR. Whatever comes back is the user's
/// responsibility; a broken file surfaces as a parse warning on the next run.
fn run_raw(ctx: &mut Context, ids: &[i64]) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| Error::InvalidArgument("--raw requires $EDITOR to be set".to_string()))?;

    for_each_id(ids, |id| {
        let path = ctx.db.path_of(id)?;
        let status = Command::new(&editor).arg(&path).status()?;
        if !status.success() {
            return Err(Error::OperationFailed(format!(
                "editor exited with {status} for {}",
                path.display()
            )));
        }
        Ok(())
    })
}
