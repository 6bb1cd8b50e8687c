//! Reference management for ctrlz.
//!
//! References are the human-readable entry points into the commit chain.
//! This tool manages a single branch, `main`, whose tip lives in
//! `refs/heads/main`; `HEAD` is a symbolic ref naming it.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`Head`] and branch naming helpers
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Ref name validation
//! - [`fs`] -- File-backed [`FsRefStore`]

pub mod error;
pub mod fs;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use names::validate_ref_name;
pub use traits::RefStore;
pub use types::{branch_ref, Head, DEFAULT_BRANCH};
