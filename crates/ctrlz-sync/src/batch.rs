//! Size-bounded batching of framed objects.

use bytes::BytesMut;
use tracing::debug;

use crate::error::SyncResult;
use crate::transport::RemoteTransport;
use crate::types::BatchStats;

/// Accumulates framed objects and uploads them in batches.
///
/// Before an object is appended, a non-empty buffer that would grow past
/// the threshold is flushed first. An object larger than the threshold is
/// therefore sent on its own rather than split.
pub struct BatchUploader<'a> {
    transport: &'a dyn RemoteTransport,
    threshold: usize,
    buffer: BytesMut,
    stats: BatchStats,
}

impl<'a> BatchUploader<'a> {
    pub fn new(transport: &'a dyn RemoteTransport, threshold: usize) -> Self {
        Self {
            transport,
            threshold,
            buffer: BytesMut::new(),
            stats: BatchStats::default(),
        }
    }

    /// Queue one framed object, flushing first if it would not fit.
    pub fn push(&mut self, framed: &[u8]) -> SyncResult<()> {
        if !self.buffer.is_empty() && self.buffer.len() + framed.len() > self.threshold {
            self.flush()?;
        }
        self.buffer.extend_from_slice(framed);
        self.stats.objects += 1;
        Ok(())
    }

    /// Bytes waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Upload whatever is buffered. Does nothing when the buffer is empty.
    pub fn flush(&mut self) -> SyncResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = self.buffer.split().freeze();
        self.transport.upload_batch(&batch)?;
        self.stats.batches += 1;
        self.stats.bytes += batch.len() as u64;
        debug!(batch = self.stats.batches, bytes = batch.len(), "uploaded batch");
        Ok(())
    }

    /// Flush the remainder and return the totals.
    pub fn finish(mut self) -> SyncResult<BatchStats> {
        self.flush()?;
        Ok(self.stats)
    }
}
