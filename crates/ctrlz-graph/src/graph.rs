//! The commit graph: a singly-linked parent chain stored in the object store.
//!
//! # Invariants
//!
//! - Every commit has zero or one parent; the root commit has none.
//! - A commit is only written once its tree (and parent, if any) is stored
//!   with the right kind, and its signatures fit the header format.
//! - The graph never touches refs. Callers advance the branch exactly once,
//!   after the commit write succeeds.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Local};
use ctrlz_store::{Commit, ObjectKind, ObjectStore, Signature};
use ctrlz_types::ObjectId;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};

/// Commit creation and traversal over an [`ObjectStore`].
pub struct CommitGraph<'a> {
    store: &'a dyn ObjectStore,
    author: Signature,
    committer: Signature,
}

impl<'a> CommitGraph<'a> {
    /// A graph that signs commits with a placeholder identity.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        let anonymous = Signature::new("ctrlz", "ctrlz@localhost");
        Self {
            store,
            author: anonymous.clone(),
            committer: anonymous,
        }
    }

    /// Use `identity` as both author and committer.
    pub fn with_identity(mut self, identity: Signature) -> Self {
        self.author = identity.clone();
        self.committer = identity;
        self
    }

    /// Store a commit of `tree` on top of `parent`, timestamped now.
    pub fn commit(
        &self,
        tree: ObjectId,
        message: &str,
        parent: Option<ObjectId>,
    ) -> GraphResult<ObjectId> {
        let now = Local::now();
        self.commit_at(tree, message, parent, now.with_timezone(now.offset()))
    }

    /// Store a commit with an explicit timestamp.
    pub fn commit_at(
        &self,
        tree: ObjectId,
        message: &str,
        parent: Option<ObjectId>,
        timestamp: DateTime<FixedOffset>,
    ) -> GraphResult<ObjectId> {
        match self.store.read(&tree)? {
            Some(obj) if obj.kind == ObjectKind::Tree => {}
            _ => return Err(GraphError::MissingTree(tree)),
        }
        if let Some(parent) = parent {
            match self.store.read(&parent)? {
                Some(obj) if obj.kind == ObjectKind::Commit => {}
                _ => return Err(GraphError::MissingParent(parent)),
            }
        }
        self.author.validate()?;
        self.committer.validate()?;

        let commit = Commit {
            tree,
            parent,
            author: self.author.clone(),
            committer: self.committer.clone(),
            timestamp,
            message: message.to_string(),
        };
        let id = self.store.write(&commit.to_stored_object())?;
        info!(commit = %id.short_hex(), tree = %tree.short_hex(), "created commit");
        Ok(id)
    }

    /// Decode the commit stored at `id`.
    pub fn read_commit(&self, id: &ObjectId) -> GraphResult<Commit> {
        let obj = self.store.get(id)?;
        Ok(Commit::from_stored_object(&obj)?)
    }

    /// Lazily walk from `start` towards the root, stopping before `stop`.
    pub fn ancestry(&self, start: ObjectId, stop: Option<ObjectId>) -> Ancestry<'a> {
        Ancestry {
            store: self.store,
            next: Some(start),
            stop,
            seen: HashSet::new(),
        }
    }

    /// Every commit reachable from `start`, newest first.
    pub fn history(&self, start: ObjectId) -> GraphResult<Vec<(ObjectId, Commit)>> {
        let mut out = Vec::new();
        for id in self.ancestry(start, None) {
            let id = id?;
            out.push((id, self.read_commit(&id)?));
        }
        Ok(out)
    }
}

/// Iterator over a commit's ancestry, produced by [`CommitGraph::ancestry`].
///
/// Yields `start` first, then each parent in turn. Ends after the root
/// commit, before yielding the stop hash, or right after yielding an error.
pub struct Ancestry<'a> {
    store: &'a dyn ObjectStore,
    next: Option<ObjectId>,
    stop: Option<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl Iterator for Ancestry<'_> {
    type Item = GraphResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if Some(current) == self.stop {
            return None;
        }
        // A content-addressed chain cannot loop; a repeat means a corrupt store.
        if !self.seen.insert(current) {
            return Some(Err(GraphError::Store(ctrlz_store::StoreError::CorruptObject {
                id: current,
                reason: "commit appears twice in its own ancestry".into(),
            })));
        }

        let commit = self
            .store
            .get(&current)
            .and_then(|obj| Commit::from_stored_object(&obj));
        match commit {
            Ok(commit) => {
                debug!(commit = %current.short_hex(), "walked commit");
                self.next = commit.parent;
                Some(Ok(current))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
