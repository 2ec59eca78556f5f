//! `vido new`

use chrono::{Duration, Utc};

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::ical::DateValue;
use crate::todo::{parse_priority, Todo};

pub struct Options {
    pub summary: String,
    pub list: Option<String>,
    pub due: Option<String>,
    pub start: Option<String>,
    pub priority: Option<String>,
    pub location: Option<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,
}

pub fn run(ctx: &mut Context, opts: Options) -> Result<()> {
    let list = resolve_list(ctx, opts.list.as_deref())?;

    let mut todo = Todo::new(&list);
    todo.summary = opts.summary;

    todo.due = match opts.due.as_deref() {
        Some(value) => Some(ctx.parse_date(value)?),
        None if ctx.config.default_due > 0 => Some(DateValue::DateTime(
            Utc::now() + Duration::hours(i64::from(ctx.config.default_due)),
        )),
        None => None,
    };
    todo.start = opts.start.as_deref().map(|v| ctx.parse_date(v)).transpose()?;
    todo.priority = match opts.priority.as_deref() {
        Some(value) => parse_priority(value)?,
        None => ctx.config.default_priority,
    };
    todo.location = opts.location.unwrap_or_default();
    todo.categories = opts.categories;
    todo.description = opts.description.unwrap_or_default();

    if let Some(warning) = ctx.db.save(&mut todo)? {
        eprintln!("warning: {warning}");
    }
    ctx.print_todos(&[todo])
}

fn resolve_list(ctx: &Context, flag: Option<&str>) -> Result<String> {
    if let Some(name) = flag {
        return Ok(ctx.db.find_list(name)?.name.clone());
    }
    if let Some(name) = &ctx.config.default_list {
        return Ok(ctx.db.find_list(name)?.name.clone());
    }
    match ctx.db.lists() {
        [only] => Ok(only.name.clone()),
        _ => Err(Error::InvalidArgument(
            "no list specified; pass --list or set default_list".to_string(),
        )),
    }
}
