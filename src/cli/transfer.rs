//! `vido copy` and `vido move`

use crate::cli::{for_each_id, Context};
use crate::error::Result;

pub fn run_copy(ctx: &mut Context, ids: &[i64], to: &str) -> Result<()> {
    for_each_id(ids, |id| {
        let copy = ctx.db.copy_to(id, to)?;
        ctx.print_todos(&[copy])
    })
}

pub fn run_move(ctx: &mut Context, ids: &[i64], to: &str) -> Result<()> {
    for_each_id(ids, |id| {
        let moved = ctx.db.move_to(id, to)?;
        ctx.print_todos(&[moved])
    })
}
