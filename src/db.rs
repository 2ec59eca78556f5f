//! Database façade over the discovered lists and the open cache.
//!
//! Every command goes through here. Reads come from the cache; writes go to
//! disk first (atomically, against the current file bytes) and then update
//! the cache in place so the same run sees its own changes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::cache::{Cache, FileEntry, ReconcileReport};
use crate::error::{Error, Result};
use crate::list::{self, TodoList};
use crate::query::{self, SortKey, TodoFilter};
use crate::todo::{Status, Todo};
use crate::vtodo;

pub struct Database {
    lists: Vec<TodoList>,
    cache: Cache,
}

impl Database {
    /// Discover lists, open the cache, and reconcile it with the filesystem.
    /// The report carries per-file warnings for the caller to surface.
    pub fn open(list_pattern: &str, cache_path: PathBuf) -> Result<(Self, ReconcileReport)> {
        let lists = TodoList::discover(list_pattern)?;
        let mut cache = Cache::open(cache_path);
        let report = cache.reconcile(&lists)?;
        cache.save()?;
        debug!(
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            unchanged = report.unchanged,
            "cache reconciled"
        );
        Ok((Self { lists, cache }, report))
    }

    pub fn lists(&self) -> &[TodoList] {
        &self.lists
    }

    pub fn find_list(&self, name: &str) -> Result<&TodoList> {
        list::find(&self.lists, name)
    }

    pub fn list_colour(&self, name: &str) -> Option<&str> {
        self.lists
            .iter()
            .find(|l| l.name == name)
            .and_then(|l| l.colour.as_deref())
    }

    /// Filtered, sorted snapshot of the cached todos.
    pub fn todos(&self, filter: &TodoFilter, sort: &[SortKey]) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self
            .cache
            .entries()
            .iter()
            .map(|e| e.todo.clone())
            .filter(|t| filter.matches(t))
            .collect();
        query::sort_todos(&mut todos, sort);
        todos
    }

    pub fn todo(&self, id: i64) -> Result<Todo> {
        Ok(self.cache.get(id)?.todo.clone())
    }

    /// Look up a todo for mutation; refuses read-only entries.
    pub fn todo_for_update(&self, id: i64) -> Result<Todo> {
        let entry = self.cache.get(id)?;
        if entry.read_only {
            return Err(Error::ReadOnlyTodo(entry.path.clone()));
        }
        Ok(entry.todo.clone())
    }

    /// The on-disk path backing a todo.
    pub fn path_of(&self, id: i64) -> Result<PathBuf> {
        Ok(self.cache.get(id)?.path.clone())
    }

    /// Persist a record to its .ics file and update the cache.
    ///
    /// Bumps the sequence, stamps last-modified, enforces the date invariant
    /// (returning its warning), and serializes against the bytes currently on
    /// disk so foreign properties survive.
    pub fn save(&mut self, todo: &mut Todo) -> Result<Option<String>> {
        let list = self.find_list(&todo.list_name)?.clone();
        let path = list.path.join(&todo.filename);

        if let Some(entry) = self.entry_for_path(&path) {
            if entry.read_only {
                return Err(Error::ReadOnlyTodo(path));
            }
        }

        let warning = todo.normalize_dates();
        todo.sequence += 1;
        todo.last_modified = Some(Utc::now());
        if todo.dtstamp.is_none() {
            todo.dtstamp = Some(Utc::now());
        }

        let existing = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        let serialized = vtodo::serialize(existing.as_deref(), todo, &path)?;
        write_atomic(&path, serialized.as_bytes())?;

        self.cache.upsert(&list.name, &path, todo.clone())?;
        self.cache.save()?;
        Ok(warning)
    }

    /// Delete a todo's file and drop it from the cache.
    pub fn delete(&mut self, id: i64) -> Result<Todo> {
        let entry = self.cache.get(id)?;
        if entry.read_only {
            return Err(Error::ReadOnlyTodo(entry.path.clone()));
        }
        let path = entry.path.clone();
        let todo = entry.todo.clone();

        fs::remove_file(&path)?;
        self.cache.remove(&path);
        self.cache.save()?;
        Ok(todo)
    }

    /// Move a todo's file into another list.
    pub fn move_to(&mut self, id: i64, dest: &str) -> Result<Todo> {
        let dest = self.find_list(dest)?.clone();
        let entry = self.cache.get(id)?;
        if entry.read_only {
            return Err(Error::ReadOnlyTodo(entry.path.clone()));
        }
        let old_path = entry.path.clone();
        let mut todo = entry.todo.clone();

        let new_path = dest.path.join(&todo.filename);
        if new_path.exists() {
            return Err(Error::AlreadyExists {
                kind: "todo",
                name: todo.filename.clone(),
            });
        }
        fs::rename(&old_path, &new_path)?;
        todo.list_name = dest.name.clone();

        self.cache.remove(&old_path);
        self.cache.upsert(&dest.name, &new_path, todo.clone())?;
        self.cache.save()?;
        Ok(todo)
    }

    /// Copy a todo into another list under a fresh identity.
    pub fn copy_to(&mut self, id: i64, dest: &str) -> Result<Todo> {
        let dest = self.find_list(dest)?.name.clone();
        let source = self.cache.get(id)?.todo.clone();
        let mut copy = source.clone_new();
        copy.list_name = dest;
        self.save(&mut copy)?;
        Ok(copy)
    }

    /// Delete the files of all completed and cancelled todos.
    pub fn flush(&mut self) -> Result<Vec<Todo>> {
        let taken = self
            .cache
            .take_with_status(&[Status::Completed, Status::Cancelled]);
        let mut flushed = Vec::with_capacity(taken.len());
        for entry in taken {
            match fs::remove_file(&entry.path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            flushed.push(entry.todo);
        }
        self.cache.save()?;
        Ok(flushed)
    }

    fn entry_for_path(&self, path: &Path) -> Option<&FileEntry> {
        self.cache.entries().iter().find(|e| e.path == path)
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial
/// calendar.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::OperationFailed(format!("no parent for {}", path.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path)
        .map_err(|err| Error::OperationFailed(format!("writing {}: {err}", path.display())))?;
    Ok(())
}
