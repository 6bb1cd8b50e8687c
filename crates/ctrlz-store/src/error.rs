use ctrlz_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A tree entry name is not a single path component.
    #[error("invalid tree entry name: {0:?}")]
    InvalidEntryName(String),

    /// An author or committer cannot be written into a commit header.
    #[error("invalid signature: {0:?}")]
    InvalidSignature(String),

    /// A hash given by the caller could not be parsed.
    #[error("invalid object id: {0}")]
    InvalidId(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn corrupt(id: ObjectId, reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            id,
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
