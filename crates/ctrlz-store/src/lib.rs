//! Content-addressed object storage for ctrlz.
//!
//! This crate implements a hash-keyed object store with the same on-disk
//! shape as git's `.git/objects/` directory. Every blob, tree and commit is
//! stored as an immutable object identified by the SHA-1 of its framed form
//! (`"<kind> <len>\0" + payload`).
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file contents
//! - [`Tree`] -- sorted directory listing mapping names to object ids
//! - [`Commit`] -- tree snapshot plus optional parent and metadata
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one zlib-compressed file per object, sharded
//!   by the first two hex characters of the id
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: callers write children before the objects that
//!    reference them, and update refs only after the write succeeds.
//! 3. A second write of an existing id is a no-op.
//! 4. The store never interprets object contents -- codecs live in [`object`].
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{
    Blob, Commit, EntryMode, ObjectKind, Signature, StoredObject, Tree, TreeEntry,
};
pub use traits::ObjectStore;
