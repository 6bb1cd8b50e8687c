//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A line of the index file could not be parsed.
    #[error("malformed index line {line_no}: {line:?}")]
    Malformed { line_no: usize, line: String },

    /// An invalid path was provided.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] ctrlz_store::StoreError),

    /// Walking the working directory failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Reading or writing the index file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
