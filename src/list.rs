//! Todo list discovery
//!
//! A list is a directory matched by the configured glob pattern. Two sibling
//! metadata files are honoured per the vdir convention:
//! - `displayname` - human-readable list name
//! - `color` - `#RRGGBB` list colour
//!
//! Metadata is read fresh on every discovery; it is never cached.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single todo list backed by a directory of .ics files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    /// Display name (from `displayname`, else the directory base name)
    pub name: String,
    /// Absolute path to the list directory
    pub path: PathBuf,
    /// Colour from the `color` file, as `#RRGGBB`
    pub colour: Option<String>,
}

impl TodoList {
    fn from_dir(path: PathBuf) -> Self {
        let name = read_meta(&path, "displayname").unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });
        let colour = read_meta(&path, "color").filter(|c| !c.is_empty());
        Self { name, path, colour }
    }

    /// Expand the configured glob and build the list set.
    ///
    /// Only directories count. Fails with `NoListsFound` when nothing
    /// matches, and with `AlreadyExists` when two directories resolve to the
    /// same display name. The result is sorted by name.
    pub fn discover(pattern: &str) -> Result<Vec<TodoList>> {
        let matches = glob::glob(pattern)
            .map_err(|err| Error::InvalidConfig(format!("invalid path glob '{pattern}': {err}")))?;

        let mut lists = Vec::new();
        for entry in matches {
            let path = entry
                .map_err(|err| Error::OperationFailed(format!("reading list directory: {err}")))?;
            if path.is_dir() {
                lists.push(TodoList::from_dir(path));
            }
        }

        if lists.is_empty() {
            return Err(Error::NoListsFound(pattern.to_string()));
        }

        lists.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        for pair in lists.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(Error::AlreadyExists {
                    kind: "list",
                    name: pair[0].name.clone(),
                });
            }
        }

        Ok(lists)
    }
}

/// Resolve a user-supplied list name against the discovered lists.
///
/// Exact match wins. Otherwise a case-insensitive match is accepted when it is
/// unambiguous; two lists differing only in case must be named exactly.
pub fn find<'a>(lists: &'a [TodoList], name: &str) -> Result<&'a TodoList> {
    if let Some(list) = lists.iter().find(|l| l.name == name) {
        return Ok(list);
    }

    let lowered = name.to_lowercase();
    let mut folded = lists.iter().filter(|l| l.name.to_lowercase() == lowered);
    match (folded.next(), folded.next()) {
        (Some(list), None) => Ok(list),
        _ => Err(Error::ListNotFound {
            name: name.to_string(),
            available: lists
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn read_meta(dir: &Path, file: &str) -> Option<String> {
    fs::read_to_string(dir.join(file))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn file_mtime_ns(path: &Path) -> Option<u128> {
    let meta = fs::metadata(path).ok()?;
    let mtime = meta.modified().ok()?;
    mtime
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_nanos())
}
