//! `vido show` and `vido path`

use crate::cli::{for_each_id, Context};
use crate::error::Result;
use crate::output::{self, PorcelainTodo};

pub fn run_show(ctx: &Context, ids: &[i64]) -> Result<()> {
    for_each_id(ids, |id| {
        let todo = ctx.db.todo(id)?;
        if ctx.porcelain {
            let row = PorcelainTodo::from_todo(&todo, ctx.db.list_colour(&todo.list_name));
            println!("{}", output::porcelain_json(&[row])?);
        } else {
            print!("{}", ctx.formatter.todo_detail(&todo));
        }
        Ok(())
    })
}

pub fn run_path(ctx: &Context, ids: &[i64]) -> Result<()> {
    for_each_id(ids, |id| {
        println!("{}", ctx.db.path_of(id)?.display());
        Ok(())
    })
}
