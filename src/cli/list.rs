//! `vido list`

use crate::cli::{parse_statuses, Context};
use crate::error::Result;
use crate::query::{self, TodoFilter};
use crate::todo::parse_priority;

pub struct Options {
    pub lists: Vec<String>,
    pub status: Option<String>,
    pub categories: Vec<String>,
    pub grep: Option<String>,
    pub location: Option<String>,
    pub priority: Option<String>,
    pub due: Option<u32>,
    pub start_before: Option<String>,
    pub start_after: Option<String>,
    pub startable: bool,
    pub sort: Option<String>,
}

pub fn run(ctx: &Context, opts: Options) -> Result<()> {
    // Resolve list names up front so a typo fails with the alternatives.
    let mut lists = Vec::with_capacity(opts.lists.len());
    for name in &opts.lists {
        lists.push(ctx.db.find_list(name)?.name.clone());
    }

    let filter = TodoFilter {
        lists,
        statuses: parse_statuses(opts.status.as_deref())?,
        categories: opts.categories,
        grep: opts.grep,
        location: opts.location,
        priority_at_least: opts.priority.as_deref().map(parse_priority).transpose()?,
        due_within_hours: opts.due,
        start_before: opts
            .start_before
            .as_deref()
            .map(|v| ctx.parse_date(v))
            .transpose()?,
        start_after: opts
            .start_after
            .as_deref()
            .map(|v| ctx.parse_date(v))
            .transpose()?,
        startable: opts.startable || ctx.config.startable,
    };

    let sort = match opts.sort.as_deref() {
        Some(spec) => query::parse_sort(spec)?,
        None => query::default_sort(),
    };

    let todos = ctx.db.todos(&filter, &sort);
    ctx.print_todos(&todos)
}
