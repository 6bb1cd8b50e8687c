//! Materializing a stored tree into the working directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use ctrlz_store::{Blob, EntryMode, ObjectStore, Tree};
use ctrlz_types::ObjectId;
use tracing::{debug, info};

use crate::builder::sorted_children;
use crate::error::{IoContext, WorktreeError, WorktreeResult};
use crate::META_DIR;

/// Counts of what a checkout wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub files: usize,
    pub dirs: usize,
}

/// Replaces working-directory content with the content of a stored tree.
pub struct Materializer<'a> {
    store: &'a dyn ObjectStore,
    root: PathBuf,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a dyn ObjectStore, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    /// Clear the working directory (except the metadata directory) and
    /// write out `tree`.
    ///
    /// The root tree is decoded before anything on disk is removed, so an
    /// unknown or malformed root leaves the working directory untouched.
    pub fn checkout_tree(&self, tree: &ObjectId) -> WorktreeResult<CheckoutSummary> {
        let root_tree = self.read_tree(tree)?;
        self.clear()?;
        let mut summary = CheckoutSummary::default();
        self.restore(&root_tree, &self.root, &mut summary)?;
        info!(
            tree = %tree.short_hex(),
            files = summary.files,
            dirs = summary.dirs,
            "checked out tree"
        );
        Ok(summary)
    }

    /// Remove every top-level entry except the metadata directory.
    pub fn clear(&self) -> WorktreeResult<()> {
        for path in sorted_children(&self.root)? {
            if path.file_name().is_some_and(|n| n == META_DIR) {
                continue;
            }
            let meta = fs::symlink_metadata(&path).at(&path)?;
            if meta.is_dir() {
                fs::remove_dir_all(&path).at(&path)?;
            } else {
                fs::remove_file(&path).at(&path)?;
            }
            debug!(path = %path.display(), "removed");
        }
        Ok(())
    }

    fn read_tree(&self, id: &ObjectId) -> WorktreeResult<Tree> {
        Ok(Tree::from_stored_object(&self.store.get(id)?)?)
    }

    fn restore(&self, tree: &Tree, dir: &Path, summary: &mut CheckoutSummary) -> WorktreeResult<()> {
        for entry in &tree.entries {
            let name = entry.name.as_str();
            let mut components = Path::new(name).components();
            let single = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if !single || (dir == self.root && name == META_DIR) {
                return Err(WorktreeError::UnsafeEntryName(entry.name.clone()));
            }
            let path = dir.join(name);
            match entry.mode {
                EntryMode::Directory => {
                    let subtree = self.read_tree(&entry.object_id)?;
                    fs::create_dir_all(&path).at(&path)?;
                    summary.dirs += 1;
                    self.restore(&subtree, &path, summary)?;
                }
                EntryMode::Regular => {
                    let blob = Blob::from_stored_object(&self.store.get(&entry.object_id)?)?;
                    fs::write(&path, &blob.data).at(&path)?;
                    summary.files += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use ctrlz_store::{InMemoryObjectStore, ObjectKind, StoreError, StoredObject, TreeEntry};

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn snapshot_then_checkout_restores_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, ".git/HEAD", "ref: refs/heads/main\n");
        write(root, "readme.md", "v1");
        write(root, "src/main.rs", "fn main() {}");
        fs::create_dir(root.join("empty")).unwrap();

        let store = InMemoryObjectStore::new();
        let tree = TreeBuilder::new(&store, root).write_tree().unwrap();

        write(root, "readme.md", "v2");
        write(root, "scratch/notes.txt", "temporary");
        fs::remove_dir_all(root.join("src")).unwrap();

        let summary = Materializer::new(&store, root).checkout_tree(&tree).unwrap();
        assert_eq!(summary, CheckoutSummary { files: 2, dirs: 2 });
        assert_eq!(fs::read_to_string(root.join("readme.md")).unwrap(), "v1");
        assert_eq!(
            fs::read_to_string(root.join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
        assert!(root.join("empty").is_dir());
        assert!(!root.join("scratch").exists());
        assert_eq!(
            fs::read_to_string(root.join(".git/HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert_eq!(TreeBuilder::new(&store, root).write_tree().unwrap(), tree);
    }

    #[test]
    fn unknown_tree_leaves_worktree_alone() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "keep.txt", "still here");
        let store = InMemoryObjectStore::new();
        let err = Materializer::new(&store, dir.path())
            .checkout_tree(&ObjectId::from_bytes(b"missing"))
            .unwrap_err();
        assert!(matches!(err, WorktreeError::Store(StoreError::NotFound(_))));
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn crafted_tree_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        let store = InMemoryObjectStore::new();
        let blob = store.write(&Blob::new(b"x".to_vec()).to_stored_object()).unwrap();
        let mut data = b"100644 ../escaped.txt\0".to_vec();
        data.extend_from_slice(blob.as_bytes());
        let tree = store
            .write(&StoredObject::new(ObjectKind::Tree, data))
            .unwrap();

        let err = Materializer::new(&store, &work).checkout_tree(&tree).unwrap_err();
        assert!(matches!(
            err,
            WorktreeError::Store(StoreError::CorruptObject { .. })
        ));
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn restore_rejects_multi_component_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryObjectStore::new();
        let materializer = Materializer::new(&store, dir.path());
        let blob = ObjectId::from_bytes(b"x");
        for name in ["..", "a/b", "/etc"] {
            let tree = Tree {
                entries: vec![TreeEntry::new(EntryMode::Regular, name, blob)],
            };
            let mut summary = CheckoutSummary::default();
            assert!(
                matches!(
                    materializer.restore(&tree, dir.path(), &mut summary),
                    Err(WorktreeError::UnsafeEntryName(_))
                ),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn refuses_to_overwrite_meta_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryObjectStore::new();
        let blob = store.write(&Blob::new(b"x".to_vec()).to_stored_object()).unwrap();
        let tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, META_DIR, blob)]);
        let tree = store.write(&tree.to_stored_object().unwrap()).unwrap();
        assert!(matches!(
            Materializer::new(&store, dir.path()).checkout_tree(&tree),
            Err(WorktreeError::UnsafeEntryName(_))
        ));
    }
}
