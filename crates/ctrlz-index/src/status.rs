//! Working directory status.
//!
//! Status compares three states: the tree of the head commit, the staged
//! entries, and the files currently on disk. Nothing is written to the
//! object store; content ids are computed in memory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use ctrlz_store::{Blob, EntryMode, ObjectStore, Tree};
use ctrlz_types::ObjectId;
use ctrlz_worktree::{PathFilter, META_DIR};
use walkdir::WalkDir;

use crate::entry::IndexEntry;
use crate::error::IndexResult;

/// Complete status of the working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Paths staged for the next commit.
    pub staged: Vec<StatusEntry>,
    /// Tracked files whose content differs from the head commit.
    pub modified: Vec<StatusEntry>,
    /// Files present on disk but absent from the head commit.
    pub untracked: Vec<String>,
    /// Tracked files missing from disk.
    pub deleted: Vec<String>,
}

impl WorkdirStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.untracked.is_empty()
            && self.deleted.is_empty()
    }

    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.staged.len() + self.modified.len() + self.untracked.len() + self.deleted.len()
    }
}

/// A single path and how it changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// Not present in the head commit.
    New,
    /// Present in the head commit with different content.
    Modified,
}

/// Compute the status of the working directory at `root`.
///
/// `head_tree` is the tree of the current head commit, if any. Paths covered
/// by a staged entry (the entry itself or anything below a staged
/// directory) are reported only as staged.
pub fn compute_status(
    store: &dyn ObjectStore,
    root: &Path,
    head_tree: Option<&ObjectId>,
    staged: &[IndexEntry],
    filter: &dyn PathFilter,
) -> IndexResult<WorkdirStatus> {
    let mut head = BTreeMap::new();
    if let Some(tree) = head_tree {
        flatten(store, tree, "", &mut head)?;
    }

    let mut status = WorkdirStatus::new();
    let mut latest: BTreeMap<&str, &IndexEntry> = BTreeMap::new();
    for entry in staged {
        latest.insert(entry.path.as_str(), entry);
    }
    for (path, entry) in &latest {
        match head.get(*path) {
            Some(&(_, id)) if id == entry.object_id => {}
            Some(_) => status.staged.push(StatusEntry::new(*path, FileStatus::Modified)),
            None => status.staged.push(StatusEntry::new(*path, FileStatus::New)),
        }
    }
    let covered = |path: &str| {
        latest.keys().any(|staged| {
            path == *staged
                || path
                    .strip_prefix(*staged)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    };

    let mut seen = BTreeSet::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let Ok(rel) = e.path().strip_prefix(root) else {
                return false;
            };
            if rel.as_os_str().is_empty() {
                return true;
            }
            if e.depth() == 1 && e.file_name() == META_DIR {
                return false;
            }
            !filter.is_ignored(rel, e.file_type().is_dir())
        });
    for item in walker {
        let item = item?;
        if !item.file_type().is_file() {
            continue;
        }
        let rel = slash_path(item.path().strip_prefix(root).unwrap_or(item.path()));
        seen.insert(rel.clone());
        if covered(&rel) {
            continue;
        }
        match head.get(&rel) {
            Some(&(EntryMode::Regular, tracked)) => {
                let data = fs::read(item.path())?;
                if Blob::new(data).to_stored_object().compute_id() != tracked {
                    status.modified.push(StatusEntry::new(rel, FileStatus::Modified));
                }
            }
            _ => status.untracked.push(rel),
        }
    }

    for (path, (mode, _)) in &head {
        if *mode == EntryMode::Regular
            && !seen.contains(path)
            && !covered(path)
            && !filter.is_ignored(Path::new(path), false)
        {
            status.deleted.push(path.clone());
        }
    }
    Ok(status)
}

/// Map every path in `tree` (files and directories) to its mode and id.
fn flatten(
    store: &dyn ObjectStore,
    tree: &ObjectId,
    prefix: &str,
    out: &mut BTreeMap<String, (EntryMode, ObjectId)>,
) -> IndexResult<()> {
    let tree = Tree::from_stored_object(&store.get(tree)?)?;
    for entry in tree.entries {
        let path = if prefix.is_empty() {
            entry.name
        } else {
            format!("{prefix}/{}", entry.name)
        };
        if entry.mode.is_dir() {
            flatten(store, &entry.object_id, &path, out)?;
        }
        out.insert(path, (entry.mode, entry.object_id));
    }
    Ok(())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
