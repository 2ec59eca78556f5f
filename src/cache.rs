//! Persistent todo cache
//!
//! A schema-versioned JSON snapshot of every parsed .ics file, keyed by file
//! mtime and size so reconciliation only re-reads what changed. The snapshot
//! is disposable: a version bump or an unreadable file silently rebuilds it
//! from the filesystem.
//!
//! Ids are a derived view. After every reconcile the entries are sorted by
//! (list name, path, uid) and numbered 1..n; ids are never persisted as
//! identity, the UID is.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::list::{file_mtime_ns, TodoList};
use crate::todo::{Status, Todo};
use crate::vtodo;

/// Bumped whenever the snapshot layout changes; mismatches rebuild silently
pub const SCHEMA_VERSION: u32 = 1;

/// One cached on-disk file holding a VTODO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path of the .ics file
    pub path: PathBuf,
    /// Name of the owning list
    pub list_name: String,
    /// File mtime in nanoseconds at parse time
    pub mtime_ns: u128,
    /// File size in bytes at parse time
    pub size: u64,
    /// True when the file holds more than one VTODO; mutations are refused
    pub read_only: bool,
    /// The parsed record
    pub todo: Todo,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    generated_at: DateTime<Utc>,
    lists: Vec<TodoList>,
    files: Vec<FileEntry>,
}

/// What a reconcile pass did, and what it had to skip
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// Files that could not be parsed, with the reason; not indexed
    pub skipped: Vec<(PathBuf, String)>,
    /// Files losing a duplicate-UID tie-break, with the UID; not indexed
    pub duplicates: Vec<(PathBuf, String)>,
}

/// The open cache: list rows plus one entry per indexed file
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    lists: Vec<TodoList>,
    entries: Vec<FileEntry>,
}

impl Cache {
    /// Open the snapshot at `path`, starting empty when it is missing,
    /// unreadable, or written by a different schema version.
    pub fn open(path: PathBuf) -> Self {
        let snapshot = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<Snapshot>(&text).ok())
            .filter(|snap| snap.schema_version == SCHEMA_VERSION);

        match snapshot {
            Some(snap) => Self {
                path,
                lists: snap.lists,
                entries: snap.files,
            },
            None => {
                debug!(path = %path.display(), "no usable cache snapshot, starting empty");
                Self {
                    path,
                    lists: Vec::new(),
                    entries: Vec::new(),
                }
            }
        }
    }

    /// Persist the snapshot atomically (temp file + rename).
    ///
    /// An uncreatable or unwritable cache location is fatal; everything in
    /// the cache can be rebuilt, but a broken path would make every run pay
    /// for a full re-scan.
    pub fn save(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Cache(format!("cache path has no parent: {}", self.path.display()))
        })?;
        fs::create_dir_all(parent)
            .map_err(|err| Error::Cache(format!("cannot create {}: {err}", parent.display())))?;

        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            lists: self.lists.clone(),
            files: self.entries.clone(),
        };
        let json = serde_json::to_string(&snapshot)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|err| Error::Cache(format!("cannot write cache: {err}")))?;
        tmp.write_all(json.as_bytes())
            .map_err(|err| Error::Cache(format!("cannot write cache: {err}")))?;
        tmp.persist(&self.path)
            .map_err(|err| Error::Cache(format!("cannot write cache: {err}")))?;
        Ok(())
    }

    /// Bring the cache in line with the filesystem.
    ///
    /// Unchanged files (same mtime and size) are not re-read, so the work
    /// done is proportional to what changed since the last run.
    pub fn reconcile(&mut self, lists: &[TodoList]) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        self.lists = lists.to_vec();

        let mut previous: HashMap<PathBuf, FileEntry> =
            self.entries.drain(..).map(|e| (e.path.clone(), e)).collect();

        let mut next = Vec::new();
        for list in lists {
            for (path, mtime_ns, size) in scan_list_dir(&list.path)? {
                let prior = previous.remove(&path);
                if let Some(entry) = prior.as_ref().filter(|entry| {
                    entry.mtime_ns == mtime_ns
                        && entry.size == size
                        && entry.list_name == list.name
                }) {
                    report.unchanged += 1;
                    next.push(entry.clone());
                    continue;
                }

                let was_known = prior.is_some();
                match parse_file(&path, &list.name) {
                    Ok(mut entry) => {
                        entry.mtime_ns = mtime_ns;
                        entry.size = size;
                        if was_known {
                            report.updated += 1;
                        } else {
                            report.added += 1;
                        }
                        next.push(entry);
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "skipping unparseable file");
                        report.skipped.push((path, err.to_string()));
                    }
                }
            }
        }

        report.removed = previous.len();

        self.entries = resolve_duplicate_uids(next, &mut report);
        self.assign_ids();
        Ok(report)
    }

    /// Re-number ids densely over (list name, path, uid) order
    pub fn assign_ids(&mut self) {
        self.entries.sort_by(|a, b| {
            (&a.list_name, &a.path, &a.todo.uid).cmp(&(&b.list_name, &b.path, &b.todo.uid))
        });
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.todo.id = Some(index as i64 + 1);
        }
    }

    pub fn lists(&self) -> &[TodoList] {
        &self.lists
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn get(&self, id: i64) -> Result<&FileEntry> {
        self.entries
            .iter()
            .find(|e| e.todo.id == Some(id))
            .ok_or(Error::NoSuchTodo(id))
    }

    pub fn get_by_uid(&self, uid: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.todo.uid == uid)
    }

    /// Record a file this process just wrote, without a full re-scan
    pub fn upsert(&mut self, list_name: &str, path: &Path, todo: Todo) -> Result<()> {
        let mtime_ns = file_mtime_ns(path).unwrap_or(0);
        let size = fs::metadata(path)?.len();
        let entry = FileEntry {
            path: path.to_path_buf(),
            list_name: list_name.to_string(),
            mtime_ns,
            size,
            read_only: false,
            todo,
        };
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == path) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
        self.assign_ids();
        Ok(())
    }

    /// Drop the entry for a deleted file
    pub fn remove(&mut self, path: &Path) {
        self.entries.retain(|e| e.path != path);
        self.assign_ids();
    }

    /// Remove and return every entry whose status is in `statuses`
    pub fn take_with_status(&mut self, statuses: &[Status]) -> Vec<FileEntry> {
        let (taken, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| statuses.contains(&e.todo.status));
        self.entries = kept;
        self.assign_ids();
        taken
    }
}

fn scan_list_dir(dir: &Path) -> Result<Vec<(PathBuf, u128, u64)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ics = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("ics"))
            .unwrap_or(false);
        if !is_ics || !path.is_file() {
            continue;
        }
        let meta = entry.metadata()?;
        let mtime_ns = file_mtime_ns(&path).unwrap_or(0);
        files.push((path, mtime_ns, meta.len()));
    }
    files.sort();
    Ok(files)
}

fn parse_file(path: &Path, list_name: &str) -> Result<FileEntry> {
    let text = fs::read_to_string(path)?;
    let parsed = vtodo::parse(&text, path)?;
    let mut todo = parsed.todo;
    todo.list_name = list_name.to_string();
    todo.filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FileEntry {
        path: path.to_path_buf(),
        list_name: list_name.to_string(),
        mtime_ns: 0,
        size: 0,
        read_only: parsed.vtodo_count > 1,
        todo,
    })
}

/// When two files carry the same UID, the most recently modified one wins;
/// the rest are reported and left out of the index.
fn resolve_duplicate_uids(entries: Vec<FileEntry>, report: &mut ReconcileReport) -> Vec<FileEntry> {
    let mut winners: HashMap<String, u128> = HashMap::new();
    for entry in &entries {
        let best = winners.entry(entry.todo.uid.clone()).or_insert(0);
        if entry.mtime_ns >= *best {
            *best = entry.mtime_ns;
        }
    }

    let mut taken: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        let is_winner = winners.get(&entry.todo.uid) == Some(&entry.mtime_ns)
            && taken.insert(entry.todo.uid.clone());
        if is_winner {
            kept.push(entry);
        } else {
            warn!(
                path = %entry.path.display(),
                uid = %entry.todo.uid,
                "duplicate UID, keeping the most recently modified file"
            );
            report.duplicates.push((entry.path, entry.todo.uid));
        }
    }
    kept
}
