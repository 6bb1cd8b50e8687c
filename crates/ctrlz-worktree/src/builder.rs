//! Snapshotting the working directory into blobs and trees.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use ctrlz_store::{Blob, EntryMode, ObjectStore, Tree, TreeEntry};
use ctrlz_types::ObjectId;
use tracing::debug;

use crate::error::{IoContext, WorktreeError, WorktreeResult};
use crate::filter::{NoIgnore, PathFilter};
use crate::META_DIR;

/// Writes working-directory content into an [`ObjectStore`].
///
/// Directory listings are processed in name order, so the resulting tree
/// ids depend only on names and contents, never on creation order. The
/// metadata directory is always skipped, as is anything the filter
/// ignores. Symlinks and special files are left out.
pub struct TreeBuilder<'a> {
    store: &'a dyn ObjectStore,
    root: PathBuf,
    meta_dir: PathBuf,
    filter: &'a dyn PathFilter,
}

impl<'a> TreeBuilder<'a> {
    /// A builder for the working directory at `root` that ignores nothing
    /// but the metadata directory.
    pub fn new(store: &'a dyn ObjectStore, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            store,
            meta_dir: root.join(META_DIR),
            root,
            filter: &NoIgnore,
        }
    }

    /// Skip paths matched by `filter`.
    pub fn with_filter(mut self, filter: &'a dyn PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot the whole working directory and return the root tree id.
    pub fn write_tree(&self) -> WorktreeResult<ObjectId> {
        self.build_dir(&self.root)
    }

    /// Store the contents of a single file as a blob.
    pub fn hash_file(&self, path: &Path) -> WorktreeResult<ObjectId> {
        let data = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => WorktreeError::PathNotFound(path.to_path_buf()),
            _ => WorktreeError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let size = data.len();
        let id = self.store.write(&Blob::new(data).to_stored_object())?;
        debug!(path = %path.display(), size, blob = %id.short_hex(), "stored blob");
        Ok(id)
    }

    /// Express `path` relative to the working directory root.
    ///
    /// Relative inputs are taken as relative to the root. The result always
    /// names something strictly inside the root.
    pub fn relative_path(&self, path: &Path) -> WorktreeResult<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let rel = absolute
            .strip_prefix(&self.root)
            .map_err(|_| WorktreeError::OutsideWorktree(path.to_path_buf()))?;

        let mut clean = PathBuf::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => return Err(WorktreeError::OutsideWorktree(path.to_path_buf())),
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(WorktreeError::OutsideWorktree(path.to_path_buf()));
        }
        Ok(clean)
    }

    /// Snapshot one path (file or directory) into a tree entry named after
    /// its last component.
    ///
    /// Returns `Ok(None)` when the path is ignored, lies inside the metadata
    /// directory, or is neither a regular file nor a directory.
    pub fn build_entry(&self, path: &Path) -> WorktreeResult<Option<TreeEntry>> {
        let rel = self.relative_path(path)?;
        let absolute = self.root.join(&rel);
        if let Err(e) = fs::symlink_metadata(&absolute) {
            return Err(match e.kind() {
                ErrorKind::NotFound => WorktreeError::PathNotFound(path.to_path_buf()),
                _ => WorktreeError::Io {
                    path: absolute,
                    source: e,
                },
            });
        }
        self.snapshot(&absolute)
    }

    fn build_dir(&self, dir: &Path) -> WorktreeResult<ObjectId> {
        let mut entries = Vec::new();
        for child in sorted_children(dir)? {
            if let Some(entry) = self.snapshot(&child)? {
                entries.push(entry);
            }
        }
        let tree = Tree::new(entries);
        let id = self.store.write(&tree.to_stored_object()?)?;
        debug!(dir = %dir.display(), entries = tree.len(), tree = %id.short_hex(), "stored tree");
        Ok(id)
    }

    fn snapshot(&self, path: &Path) -> WorktreeResult<Option<TreeEntry>> {
        if path.starts_with(&self.meta_dir) {
            return Ok(None);
        }
        let file_type = fs::symlink_metadata(path).at(path)?.file_type();
        if !file_type.is_file() && !file_type.is_dir() {
            debug!(path = %path.display(), "skipping special file");
            return Ok(None);
        }
        let rel = self.relative_path(path)?;
        if self.filter.is_ignored(&rel, file_type.is_dir()) {
            debug!(path = %rel.display(), "ignored");
            return Ok(None);
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WorktreeError::NonUtf8Name(path.to_path_buf()))?;
        let entry = if file_type.is_dir() {
            TreeEntry::new(EntryMode::Directory, name, self.build_dir(path)?)
        } else {
            TreeEntry::new(EntryMode::Regular, name, self.hash_file(path)?)
        };
        Ok(Some(entry))
    }
}

/// Children of `dir`, ordered by file name.
pub(crate) fn sorted_children(dir: &Path) -> WorktreeResult<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        children.push(entry.at(dir)?.path());
    }
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}
