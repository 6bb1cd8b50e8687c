use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a ctrlz repository (no .git directory): {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("invalid object id: {0}")]
    InvalidId(#[from] ctrlz_types::TypeError),

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] ctrlz_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] ctrlz_refs::RefError),

    #[error("graph error: {0}")]
    Graph(#[from] ctrlz_graph::GraphError),

    #[error("worktree error: {0}")]
    Worktree(#[from] ctrlz_worktree::WorktreeError),

    #[error("index error: {0}")]
    Index(#[from] ctrlz_index::IndexError),

    #[error("push failed: {0}")]
    Sync(#[from] ctrlz_sync::SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Whether the error means some object, ref or path does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            SdkError::NotFound(_) => true,
            SdkError::Store(ctrlz_store::StoreError::NotFound(_)) => true,
            SdkError::Ref(ctrlz_refs::RefError::NotFound { .. }) => true,
            SdkError::Graph(e) => e.is_not_found(),
            SdkError::Worktree(ctrlz_worktree::WorktreeError::PathNotFound(_)) => true,
            SdkError::Worktree(ctrlz_worktree::WorktreeError::Store(
                ctrlz_store::StoreError::NotFound(_),
            )) => true,
            _ => false,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
