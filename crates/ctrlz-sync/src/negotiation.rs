//! Working out what the remote lacks.
//!
//! The remote advertises a single head. Every local commit between our head
//! and that head is missing, together with every tree and blob reachable
//! from those commits' trees.

use std::collections::HashSet;

use ctrlz_graph::CommitGraph;
use ctrlz_store::{Commit, EntryMode, ObjectStore, Tree};
use ctrlz_types::ObjectId;
use tracing::debug;

use crate::error::SyncResult;

/// Commits reachable from `local` but not from `remote`, newest first.
///
/// Equal heads yield nothing. A remote head unknown to the local history
/// means the whole local chain is sent.
pub fn missing_commits(
    store: &dyn ObjectStore,
    local: ObjectId,
    remote: Option<ObjectId>,
) -> SyncResult<Vec<ObjectId>> {
    let commits = CommitGraph::new(store)
        .ancestry(local, remote)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = commits.len(), "commits missing on remote");
    Ok(commits)
}

/// The result of expanding commits into the objects they reach.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reachable {
    /// Objects present locally, in first-visit order.
    pub objects: Vec<ObjectId>,
    /// Referenced objects the local store does not have.
    pub missing: Vec<ObjectId>,
}

/// Expand `commits` into every object they reach.
///
/// Each commit comes first, followed by a depth-first walk of its tree.
/// Objects shared between commits or directories are listed once.
pub fn reachable_objects(store: &dyn ObjectStore, commits: &[ObjectId]) -> SyncResult<Reachable> {
    let mut walk = Walk {
        store,
        seen: HashSet::new(),
        out: Reachable::default(),
    };
    for id in commits {
        if !walk.seen.insert(*id) {
            continue;
        }
        let Some(obj) = store.read(id)? else {
            walk.out.missing.push(*id);
            continue;
        };
        let commit = Commit::from_stored_object(&obj)?;
        walk.out.objects.push(*id);
        walk.tree(commit.tree)?;
    }
    debug!(
        objects = walk.out.objects.len(),
        missing = walk.out.missing.len(),
        "expanded reachable objects"
    );
    Ok(walk.out)
}

struct Walk<'a> {
    store: &'a dyn ObjectStore,
    seen: HashSet<ObjectId>,
    out: Reachable,
}

impl Walk<'_> {
    fn tree(&mut self, id: ObjectId) -> SyncResult<()> {
        if !self.seen.insert(id) {
            return Ok(());
        }
        let Some(obj) = self.store.read(&id)? else {
            self.out.missing.push(id);
            return Ok(());
        };
        let tree = Tree::from_stored_object(&obj)?;
        self.out.objects.push(id);
        for entry in tree.entries {
            match entry.mode {
                EntryMode::Directory => self.tree(entry.object_id)?,
                EntryMode::Regular => self.blob(entry.object_id)?,
            }
        }
        Ok(())
    }

    fn blob(&mut self, id: ObjectId) -> SyncResult<()> {
        if !self.seen.insert(id) {
            return Ok(());
        }
        if self.store.exists(&id)? {
            self.out.objects.push(id);
        } else {
            self.out.missing.push(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use ctrlz_store::{Blob, InMemoryObjectStore, TreeEntry};

    fn blob(store: &InMemoryObjectStore, content: &str) -> ObjectId {
        store
            .write(&Blob::new(content.as_bytes().to_vec()).to_stored_object())
            .unwrap()
    }

    fn tree(store: &InMemoryObjectStore, entries: Vec<TreeEntry>) -> ObjectId {
        store.write(&Tree::new(entries).to_stored_object().unwrap()).unwrap()
    }

    fn commit(store: &InMemoryObjectStore, tree: ObjectId, parent: Option<ObjectId>, n: i64) -> ObjectId {
        let when = FixedOffset::east_opt(0).unwrap().timestamp_opt(n, 0).unwrap();
        CommitGraph::new(store)
            .commit_at(tree, &format!("c{n}"), parent, when)
            .unwrap()
    }

    #[test]
    fn equal_heads_need_nothing() {
        let store = InMemoryObjectStore::new();
        let t = tree(&store, vec![]);
        let c = commit(&store, t, None, 1);
        assert!(missing_commits(&store, c, Some(c)).unwrap().is_empty());
    }

    #[test]
    fn only_commits_after_remote_head() {
        let store = InMemoryObjectStore::new();
        let t = tree(&store, vec![]);
        let c1 = commit(&store, t, None, 1);
        let c2 = commit(&store, t, Some(c1), 2);
        let c3 = commit(&store, t, Some(c2), 3);
        assert_eq!(missing_commits(&store, c3, Some(c1)).unwrap(), vec![c3, c2]);
        assert_eq!(missing_commits(&store, c3, None).unwrap(), vec![c3, c2, c1]);
    }

    #[test]
    fn expansion_is_depth_first_and_deduplicated() {
        let store = InMemoryObjectStore::new();
        let shared = blob(&store, "shared");
        let inner = tree(&store, vec![TreeEntry::new(EntryMode::Regular, "s.txt", shared)]);
        let root = tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Regular, "a.txt", shared),
                TreeEntry::new(EntryMode::Directory, "dir", inner),
            ],
        );
        let c1 = commit(&store, root, None, 1);
        let c2 = commit(&store, root, Some(c1), 2);

        let reach = reachable_objects(&store, &[c2, c1]).unwrap();
        assert_eq!(reach.objects, vec![c2, root, shared, inner, c1]);
        assert!(reach.missing.is_empty());
    }

    #[test]
    fn missing_blob_is_reported() {
        let store = InMemoryObjectStore::new();
        let gone = blob(&store, "gone");
        let kept = blob(&store, "kept");
        let root = tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Regular, "gone.txt", gone),
                TreeEntry::new(EntryMode::Regular, "kept.txt", kept),
            ],
        );
        let c = commit(&store, root, None, 1);
        store.remove(&gone);

        let reach = reachable_objects(&store, &[c]).unwrap();
        assert_eq!(reach.objects, vec![c, root, kept]);
        assert_eq!(reach.missing, vec![gone]);
    }

    #[test]
    fn missing_subtree_is_reported_without_descending() {
        let store = InMemoryObjectStore::new();
        let inner = tree(&store, vec![TreeEntry::new(EntryMode::Regular, "x", blob(&store, "x"))]);
        let root = tree(&store, vec![TreeEntry::new(EntryMode::Directory, "sub", inner)]);
        let c = commit(&store, root, None, 1);
        store.remove(&inner);

        let reach = reachable_objects(&store, &[c]).unwrap();
        assert_eq!(reach.objects, vec![c, root]);
        assert_eq!(reach.missing, vec![inner]);
    }
}
