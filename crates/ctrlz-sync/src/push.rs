//! The push engine.
//!
//! A push runs once, in order: ask the remote for its head, list the local
//! commits it lacks, expand them into objects, upload the objects in
//! batches, and finally move the remote ref. The ref moves only after every
//! batch was accepted, and it is updated even when nothing was uploaded.

use ctrlz_store::ObjectStore;
use ctrlz_types::ObjectId;
use tracing::{info, warn};

use crate::batch::BatchUploader;
use crate::error::{SyncError, SyncResult};
use crate::negotiation::{missing_commits, reachable_objects};
use crate::transport::RemoteTransport;
use crate::types::{MissingObjectPolicy, PushReport, SyncConfig};

/// Pushes local history to a [`RemoteTransport`].
pub struct PushEngine<'a> {
    store: &'a dyn ObjectStore,
    transport: &'a dyn RemoteTransport,
    config: SyncConfig,
}

impl<'a> PushEngine<'a> {
    pub fn new(store: &'a dyn ObjectStore, transport: &'a dyn RemoteTransport) -> Self {
        Self::with_config(store, transport, SyncConfig::default())
    }

    pub fn with_config(
        store: &'a dyn ObjectStore,
        transport: &'a dyn RemoteTransport,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Make the remote branch match `local_head`.
    pub fn push(&self, local_head: ObjectId) -> SyncResult<PushReport> {
        let branch = self.config.branch.as_str();
        let remote_head = self.transport.fetch_ref(branch)?;
        let commits = missing_commits(self.store, local_head, remote_head)?;
        let reach = reachable_objects(self.store, &commits)?;

        let mut skipped = reach.missing;
        if !skipped.is_empty() {
            match self.config.missing_objects {
                MissingObjectPolicy::Abort => return Err(SyncError::MissingObjects(skipped)),
                MissingObjectPolicy::Skip => {
                    for id in &skipped {
                        warn!(object = %id, "object missing locally, not pushed");
                    }
                }
            }
        }

        let mut uploader = BatchUploader::new(self.transport, self.config.batch_threshold);
        for id in &reach.objects {
            match self.store.read_framed(id)? {
                Some(framed) => uploader.push(&framed)?,
                None if self.config.missing_objects == MissingObjectPolicy::Skip => {
                    warn!(object = %id, "object vanished during push, not pushed");
                    skipped.push(*id);
                }
                None => return Err(SyncError::MissingObjects(vec![*id])),
            }
        }
        let stats = uploader.finish()?;

        self.transport.update_ref(branch, &local_head)?;
        info!(
            branch,
            head = %local_head.short_hex(),
            commits = commits.len(),
            objects = stats.objects,
            batches = stats.batches,
            "push complete"
        );

        Ok(PushReport {
            remote_head,
            new_head: Some(local_head),
            commits,
            objects_sent: stats.objects,
            batches: stats.batches,
            bytes_sent: stats.bytes,
            skipped,
        })
    }
}
