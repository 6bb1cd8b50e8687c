//! Push synchronization for ctrlz.
//!
//! Sends the objects a remote lacks in size-bounded batches, then moves the
//! remote branch. Transfer goes through the [`RemoteTransport`] trait;
//! [`HttpTransport`] speaks the HTTP protocol and [`mock::MockTransport`]
//! records calls for tests.

pub mod batch;
pub mod error;
pub mod http;
pub mod mock;
pub mod negotiation;
pub mod push;
pub mod transport;
pub mod types;

pub use batch::BatchUploader;
pub use error::{SyncError, SyncResult};
pub use http::HttpTransport;
pub use negotiation::{missing_commits, reachable_objects, Reachable};
pub use push::PushEngine;
pub use transport::RemoteTransport;
pub use types::{
    BatchStats, MissingObjectPolicy, PushReport, RefUpdate, SyncConfig, DEFAULT_BATCH_THRESHOLD,
};
