//! Staging index for ctrlz.
//!
//! Tracks which paths are staged for the next commit, overlays them onto
//! the head tree when committing, and compares the working directory with
//! the last commit.
//!
//! # Key Types
//!
//! - [`Index`] -- the append-only staging file
//! - [`IndexEntry`] -- one staged path
//! - [`WorkdirStatus`] -- result of [`compute_status`]
//! - [`FileStatus`] -- kind of change

pub mod entry;
pub mod error;
pub mod index;
pub mod status;

pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::Index;
pub use status::{compute_status, FileStatus, StatusEntry, WorkdirStatus};
