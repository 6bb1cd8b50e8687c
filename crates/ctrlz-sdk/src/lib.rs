//! High-level API for ctrlz.
//!
//! [`Repository`] is the single entry point: it opens the `.git` metadata
//! directory next to a working tree and exposes every user operation, from
//! object plumbing (`cat_file`, `hash_object`, `ls_tree`, `write_tree`,
//! `commit_tree`) to the everyday workflow (`add`, `commit`, `status`,
//! `ls_commits`, `checkout`, `push`).

pub mod config;
pub mod error;
pub mod repository;

pub use config::RepoConfig;
pub use error::{SdkError, SdkResult};
pub use repository::Repository;

// Re-export key types
pub use ctrlz_index::{FileStatus, IndexEntry, StatusEntry, WorkdirStatus};
pub use ctrlz_store::{Blob, Commit, EntryMode, ObjectKind, Signature, StoredObject, Tree, TreeEntry};
pub use ctrlz_sync::{MissingObjectPolicy, PushReport};
pub use ctrlz_types::ObjectId;
pub use ctrlz_worktree::CheckoutSummary;
