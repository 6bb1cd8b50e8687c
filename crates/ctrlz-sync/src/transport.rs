use ctrlz_types::ObjectId;

use crate::error::SyncResult;

/// Transport interface for a remote object store.
///
/// All calls block until the remote answers. Any non-success answer is an
/// error; there are no retries.
pub trait RemoteTransport {
    /// Current head of `branch` on the remote, or `None` if it has none.
    fn fetch_ref(&self, branch: &str) -> SyncResult<Option<ObjectId>>;

    /// Send one batch of concatenated framed objects.
    fn upload_batch(&self, batch: &[u8]) -> SyncResult<()>;

    /// Point `branch` on the remote at `head`.
    fn update_ref(&self, branch: &str, head: &ObjectId) -> SyncResult<()>;
}
