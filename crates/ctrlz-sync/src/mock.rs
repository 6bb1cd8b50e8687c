//! In-memory remote for deterministic testing.
//!
//! [`MockTransport`] records every batch and ref update it receives and can
//! be told to fail a given call. Clones share state, so a test can hand one
//! clone to the code under test and inspect another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ctrlz_types::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;

/// Which call should fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    FetchRef,
    UploadBatch,
    UpdateRef,
}

/// A call the mock received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockOperation {
    FetchRef(String),
    UploadBatch(usize),
    UpdateRef(String, ObjectId),
}

#[derive(Debug, Default)]
struct MockInner {
    refs: HashMap<String, ObjectId>,
    batches: Vec<Vec<u8>>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Recording [`RemoteTransport`].
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        self.inner.lock().expect("lock poisoned")
    }

    /// Preset the remote head of `branch`.
    pub fn set_ref(&self, branch: &str, head: ObjectId) {
        self.lock().refs.insert(branch.to_string(), head);
    }

    pub fn remote_ref(&self, branch: &str) -> Option<ObjectId> {
        self.lock().refs.get(branch).copied()
    }

    /// Make the given call return an HTTP 500 error.
    pub fn fail_on(&self, call: FailOn) {
        self.lock().fail_on = Some(call);
    }

    pub fn batches(&self) -> Vec<Vec<u8>> {
        self.lock().batches.clone()
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Ids of every object received, in upload order.
    pub fn uploaded_ids(&self) -> Vec<ObjectId> {
        self.lock()
            .batches
            .iter()
            .flat_map(|batch| split_framed(batch))
            .map(ObjectId::from_bytes)
            .collect()
    }

    fn check(&self, call: FailOn, endpoint: &str) -> SyncResult<()> {
        if self.lock().fail_on == Some(call) {
            return Err(SyncError::RemoteStatus {
                endpoint: endpoint.to_string(),
                status: 500,
                body: "injected failure".into(),
            });
        }
        Ok(())
    }
}

impl RemoteTransport for MockTransport {
    fn fetch_ref(&self, branch: &str) -> SyncResult<Option<ObjectId>> {
        self.lock()
            .operations
            .push(MockOperation::FetchRef(branch.to_string()));
        self.check(FailOn::FetchRef, "refs")?;
        Ok(self.remote_ref(branch))
    }

    fn upload_batch(&self, batch: &[u8]) -> SyncResult<()> {
        self.lock()
            .operations
            .push(MockOperation::UploadBatch(batch.len()));
        self.check(FailOn::UploadBatch, "upload-batch")?;
        self.lock().batches.push(batch.to_vec());
        Ok(())
    }

    fn update_ref(&self, branch: &str, head: &ObjectId) -> SyncResult<()> {
        self.lock()
            .operations
            .push(MockOperation::UpdateRef(branch.to_string(), *head));
        self.check(FailOn::UpdateRef, "update-ref")?;
        self.set_ref(branch, *head);
        Ok(())
    }
}

/// Split a batch back into its framed objects. Stops at the first
/// malformed header.
fn split_framed(mut batch: &[u8]) -> Vec<&[u8]> {
    let mut objects = Vec::new();
    while let Some(nul) = batch.iter().position(|&b| b == 0) {
        let len = std::str::from_utf8(&batch[..nul])
            .ok()
            .and_then(|header| header.split_once(' '))
            .and_then(|(_, len)| len.parse::<usize>().ok());
        let Some(len) = len else { break };
        let end = nul + 1 + len;
        if end > batch.len() {
            break;
        }
        objects.push(&batch[..end]);
        batch = &batch[end..];
    }
    objects
}
