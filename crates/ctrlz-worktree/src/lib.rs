//! Working directory handling for ctrlz.
//!
//! [`TreeBuilder`] turns files and directories into blobs and trees;
//! [`Materializer`] does the reverse during checkout. Both treat the
//! metadata directory ([`META_DIR`]) as invisible.

pub mod builder;
pub mod checkout;
pub mod error;
pub mod filter;

/// Name of the repository metadata directory at the working directory root.
pub const META_DIR: &str = ".git";

pub use builder::TreeBuilder;
pub use checkout::{CheckoutSummary, Materializer};
pub use error::{WorktreeError, WorktreeResult};
pub use filter::{IgnoreRules, NoIgnore, PathFilter, IGNORE_FILE};
