//! Error types for the commit graph.

use ctrlz_store::StoreError;
use ctrlz_types::ObjectId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A commit's tree is not in the store.
    #[error("tree {0} does not exist")]
    MissingTree(ObjectId),

    /// A commit's parent is not a stored commit.
    #[error("parent {0} is not a stored commit")]
    MissingParent(ObjectId),

    /// Storage or decoding failure, including `NotFound` for absent commits.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GraphError {
    /// True when the error means an object is absent rather than broken.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::MissingTree(_)
                | GraphError::MissingParent(_)
                | GraphError::Store(StoreError::NotFound(_))
        )
    }
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
