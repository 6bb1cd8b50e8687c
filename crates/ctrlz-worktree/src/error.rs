//! Error types for working directory operations.

use std::path::PathBuf;

/// Errors that can occur while snapshotting or materializing a worktree.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    /// A path handed to the builder does not exist.
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A path lies outside the working directory root.
    #[error("path is outside the working directory: {}", .0.display())]
    OutsideWorktree(PathBuf),

    /// A file name cannot be stored because it is not valid UTF-8.
    #[error("file name is not valid UTF-8: {}", .0.display())]
    NonUtf8Name(PathBuf),

    /// A stored tree names an entry that must never be written to disk.
    #[error("refusing to materialize entry {0:?}")]
    UnsafeEntryName(String),

    /// The ignore file could not be parsed.
    #[error("invalid ignore rules: {0}")]
    Ignore(#[from] ignore::Error),

    /// Filesystem failure on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object store failure.
    #[error("store error: {0}")]
    Store(#[from] ctrlz_store::StoreError),
}

/// Attach the offending path to an I/O error.
pub(crate) trait IoContext<T> {
    fn at(self, path: &std::path::Path) -> WorktreeResult<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &std::path::Path) -> WorktreeResult<T> {
        self.map_err(|source| WorktreeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Convenience alias for worktree results.
pub type WorktreeResult<T> = Result<T, WorktreeError>;
