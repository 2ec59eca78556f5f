//! `vido done`, `undo`, `cancel`, `delete`, and `flush`

use crate::cli::{confirm, for_each_id, Context};
use crate::error::Result;
use crate::todo::Todo;

fn save_warned(ctx: &mut Context, todo: &mut Todo) -> Result<()> {
    if let Some(warning) = ctx.db.save(todo)? {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

pub fn run_done(ctx: &mut Context, ids: &[i64]) -> Result<()> {
    for_each_id(ids, |id| {
        let mut todo = ctx.db.todo_for_update(id)?;
        let had_rrule = todo.is_recurring();
        let next = todo.complete();
        if had_rrule && next.is_none() {
            eprintln!(
                "warning: cannot compute the next occurrence of '{}'; completing it for good",
                todo.summary
            );
        }
        save_warned(ctx, &mut todo)?;

        if let Some(mut next) = next {
            save_warned(ctx, &mut next)?;
            ctx.print_todos(&[todo, next])?;
        } else {
            ctx.print_todos(&[todo])?;
        }
        Ok(())
    })
}

pub fn run_undo(ctx: &mut Context, ids: &[i64]) -> Result<()> {
    for_each_id(ids, |id| {
        let mut todo = ctx.db.todo_for_update(id)?;
        todo.undo();
        save_warned(ctx, &mut todo)?;
        ctx.print_todos(&[todo])
    })
}

pub fn run_cancel(ctx: &mut Context, ids: &[i64]) -> Result<()> {
    for_each_id(ids, |id| {
        let mut todo = ctx.db.todo_for_update(id)?;
        todo.cancel();
        save_warned(ctx, &mut todo)?;
        ctx.print_todos(&[todo])
    })
}

pub fn run_delete(ctx: &mut Context, ids: &[i64], yes: bool) -> Result<()> {
    for_each_id(ids, |id| {
        let todo = ctx.db.todo(id)?;
        if !yes && !confirm(&format!("Delete '{}'?", todo.summary))? {
            return Ok(());
        }
        let deleted = ctx.db.delete(id)?;
        if !ctx.porcelain {
            println!("Deleted '{}'", deleted.summary);
        }
        Ok(())
    })
}

pub fn run_flush(ctx: &mut Context, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete all completed and cancelled todos?")? {
        return Ok(());
    }
    let flushed = ctx.db.flush()?;
    if ctx.porcelain {
        ctx.print_todos(&flushed)?;
    } else {
        for todo in &flushed {
            println!("Flushed '{}'", todo.summary);
        }
    }
    Ok(())
}
