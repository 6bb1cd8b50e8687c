//! Commit graph for ctrlz.
//!
//! History is a linear parent chain: each commit has zero or one parent.
//! [`CommitGraph`] creates commits (checking referential integrity first),
//! decodes them, and walks ancestry lazily with an optional stop hash, which
//! the sync engine uses to stop at the remote's known head.

pub mod error;
pub mod graph;

pub use error::{GraphError, GraphResult};
pub use graph::{Ancestry, CommitGraph};
