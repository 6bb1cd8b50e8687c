//! The staging index file and the tree overlay built from it.
//!
//! The index is an append-only text file with one [`IndexEntry`] per line.
//! Staging appends, committing truncates. When the same path is staged
//! twice, the later line wins.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use ctrlz_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use ctrlz_types::ObjectId;
use tracing::debug;

use crate::entry::IndexEntry;
use crate::error::IndexResult;

/// The staging area, backed by a file under the metadata directory.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Load the index at `path`. A missing file is an empty index.
    pub fn open(path: impl Into<PathBuf>) -> IndexResult<Self> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| IndexEntry::parse_line(line, i + 1))
            .collect::<IndexResult<Vec<_>>>()?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staged entries in the order they were added.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The effective entry for each staged path, later stagings winning.
    pub fn latest(&self) -> BTreeMap<&str, &IndexEntry> {
        self.entries
            .iter()
            .map(|entry| (entry.path.as_str(), entry))
            .collect()
    }

    /// Append `entry` to the index file.
    pub fn stage(&mut self, entry: IndexEntry) -> IndexResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{entry}")?;
        debug!(path = %entry.path, object = %entry.object_id.short_hex(), "staged");
        self.entries.push(entry);
        Ok(())
    }

    /// Drop every staged entry.
    pub fn clear(&mut self) -> IndexResult<()> {
        fs::write(&self.path, "")?;
        self.entries.clear();
        Ok(())
    }

    /// Apply the staged entries on top of `base` and store the result.
    ///
    /// Subtrees the index does not touch keep their ids. Staging a path
    /// below an existing file replaces that file with a directory.
    pub fn write_tree(
        &self,
        store: &dyn ObjectStore,
        base: Option<&ObjectId>,
    ) -> IndexResult<ObjectId> {
        let mut root = match base {
            Some(id) => Node::load(store, id)?,
            None => BTreeMap::new(),
        };
        for entry in &self.entries {
            let parts: Vec<&str> = entry.components().collect();
            insert(store, &mut root, &parts, entry)?;
        }
        let id = write_node(store, root)?;
        debug!(tree = %id.short_hex(), staged = self.entries.len(), "wrote index tree");
        Ok(id)
    }
}

/// A tree under construction.
///
/// Directories untouched by the index stay as `Leaf(Directory, id)` and are
/// only expanded when a staged path descends into them.
enum Node {
    Leaf(EntryMode, ObjectId),
    Dir(BTreeMap<String, Node>),
}

impl Node {
    fn load(store: &dyn ObjectStore, id: &ObjectId) -> IndexResult<BTreeMap<String, Node>> {
        let tree = Tree::from_stored_object(&store.get(id)?)?;
        Ok(tree
            .entries
            .into_iter()
            .map(|e| (e.name, Node::Leaf(e.mode, e.object_id)))
            .collect())
    }
}

fn insert(
    store: &dyn ObjectStore,
    dir: &mut BTreeMap<String, Node>,
    parts: &[&str],
    entry: &IndexEntry,
) -> IndexResult<()> {
    let Some((name, rest)) = parts.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        dir.insert(name.to_string(), Node::Leaf(entry.mode, entry.object_id));
        return Ok(());
    }

    let mut children = match dir.remove(*name) {
        Some(Node::Dir(children)) => children,
        Some(Node::Leaf(EntryMode::Directory, id)) => Node::load(store, &id)?,
        Some(Node::Leaf(EntryMode::Regular, _)) | None => BTreeMap::new(),
    };
    insert(store, &mut children, rest, entry)?;
    dir.insert(name.to_string(), Node::Dir(children));
    Ok(())
}

fn write_node(store: &dyn ObjectStore, dir: BTreeMap<String, Node>) -> IndexResult<ObjectId> {
    let mut entries = Vec::with_capacity(dir.len());
    for (name, node) in dir {
        let entry = match node {
            Node::Leaf(mode, id) => TreeEntry::new(mode, name, id),
            Node::Dir(children) => TreeEntry::new(EntryMode::Directory, name, write_node(store, children)?),
        };
        entries.push(entry);
    }
    Ok(store.write(&Tree::new(entries).to_stored_object()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlz_store::{Blob, InMemoryObjectStore};

    fn blob(store: &InMemoryObjectStore, content: &str) -> ObjectId {
        store
            .write(&Blob::new(content.as_bytes().to_vec()).to_stored_object())
            .unwrap()
    }

    fn file(path: &str, id: ObjectId) -> IndexEntry {
        IndexEntry::new(EntryMode::Regular, path, id).unwrap()
    }

    fn read_tree(store: &InMemoryObjectStore, id: &ObjectId) -> Tree {
        Tree::from_stored_object(&store.get(id).unwrap()).unwrap()
    }

    fn temp_index() -> (tempfile::TempDir, Index) {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::open(dir.path().join("index")).unwrap();
        (dir, index)
    }

    #[test]
    fn missing_file_is_empty_index() {
        let (_dir, index) = temp_index();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn stage_appends_and_reopens() {
        let (dir, mut index) = temp_index();
        let a = ObjectId::from_bytes(b"a");
        let b = ObjectId::from_bytes(b"b");
        index.stage(file("a.txt", a)).unwrap();
        index.stage(file("dir name/b.txt", b)).unwrap();

        let text = fs::read_to_string(dir.path().join("index")).unwrap();
        assert_eq!(text, format!("100644 a.txt {a}\n100644 dir name/b.txt {b}\n"));

        let reopened = Index::open(dir.path().join("index")).unwrap();
        assert_eq!(reopened.entries(), index.entries());
    }

    #[test]
    fn clear_truncates_file() {
        let (dir, mut index) = temp_index();
        index.stage(file("a.txt", ObjectId::from_bytes(b"a"))).unwrap();
        index.clear().unwrap();
        assert!(index.is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("index")).unwrap(), "");
        assert!(Index::open(dir.path().join("index")).unwrap().is_empty());
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        let good = file("ok.txt", ObjectId::from_bytes(b"x"));
        fs::write(&path, format!("{good}\nbroken\n")).unwrap();
        assert!(matches!(
            Index::open(&path),
            Err(crate::IndexError::Malformed { line_no: 2, .. })
        ));
    }

    #[test]
    fn later_staging_wins() {
        let store = InMemoryObjectStore::new();
        let (_dir, mut index) = temp_index();
        let old = blob(&store, "old");
        let new = blob(&store, "new");
        index.stage(file("f.txt", old)).unwrap();
        index.stage(file("f.txt", new)).unwrap();

        assert_eq!(index.latest()["f.txt"].object_id, new);
        let tree = read_tree(&store, &index.write_tree(&store, None).unwrap());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("f.txt").unwrap().object_id, new);
    }

    #[test]
    fn overlay_keeps_unstaged_base_entries() {
        let store = InMemoryObjectStore::new();
        let keep = blob(&store, "keep");
        let base = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "keep.txt", keep)]);
        let base = store.write(&base.to_stored_object().unwrap()).unwrap();

        let (_dir, mut index) = temp_index();
        let added = blob(&store, "added");
        index.stage(file("added.txt", added)).unwrap();

        let tree = read_tree(&store, &index.write_tree(&store, Some(&base)).unwrap());
        let names: Vec<&str> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["added.txt", "keep.txt"]);
    }

    #[test]
    fn nested_path_expands_stored_subtree() {
        let store = InMemoryObjectStore::new();
        let lib = blob(&store, "lib");
        let src = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "lib.rs", lib)]);
        let src = store.write(&src.to_stored_object().unwrap()).unwrap();
        let base = Tree::new(vec![TreeEntry::new(EntryMode::Directory, "src", src)]);
        let base = store.write(&base.to_stored_object().unwrap()).unwrap();

        let (_dir, mut index) = temp_index();
        let main = blob(&store, "main");
        index.stage(file("src/bin/main.rs", main)).unwrap();

        let root = read_tree(&store, &index.write_tree(&store, Some(&base)).unwrap());
        let src = read_tree(&store, &root.get("src").unwrap().object_id);
        assert_eq!(src.get("lib.rs").unwrap().object_id, lib);
        let bin = read_tree(&store, &src.get("bin").unwrap().object_id);
        assert_eq!(bin.get("main.rs").unwrap().object_id, main);
    }

    #[test]
    fn untouched_subtree_keeps_its_id() {
        let store = InMemoryObjectStore::new();
        let docs = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "a.md", blob(&store, "a"))]);
        let docs = store.write(&docs.to_stored_object().unwrap()).unwrap();
        let base = Tree::new(vec![TreeEntry::new(EntryMode::Directory, "docs", docs)]);
        let base = store.write(&base.to_stored_object().unwrap()).unwrap();

        let (_dir, mut index) = temp_index();
        index.stage(file("top.txt", blob(&store, "top"))).unwrap();
        let root = read_tree(&store, &index.write_tree(&store, Some(&base)).unwrap());
        assert_eq!(root.get("docs").unwrap().object_id, docs);
    }

    #[test]
    fn staged_directory_replaces_subtree() {
        let store = InMemoryObjectStore::new();
        let old = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "gone.txt", blob(&store, "g"))]);
        let old = store.write(&old.to_stored_object().unwrap()).unwrap();
        let base = Tree::new(vec![TreeEntry::new(EntryMode::Directory, "dir", old)]);
        let base = store.write(&base.to_stored_object().unwrap()).unwrap();

        let new = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "new.txt", blob(&store, "n"))]);
        let new = store.write(&new.to_stored_object().unwrap()).unwrap();
        let (_dir, mut index) = temp_index();
        index
            .stage(IndexEntry::new(EntryMode::Directory, "dir", new).unwrap())
            .unwrap();

        let root = read_tree(&store, &index.write_tree(&store, Some(&base)).unwrap());
        assert_eq!(root.get("dir").unwrap().object_id, new);
    }

    #[test]
    fn missing_base_tree_is_an_error() {
        let store = InMemoryObjectStore::new();
        let (_dir, index) = temp_index();
        let err = index
            .write_tree(&store, Some(&ObjectId::from_bytes(b"gone")))
            .unwrap_err();
        assert!(matches!(err, crate::IndexError::Store(_)));
    }
}
