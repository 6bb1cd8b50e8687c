use ctrlz_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same framed bytes always
///   produce the same ID.
/// - Writes are idempotent. A second write of an existing ID is detected by
///   an existence check and skipped without re-reading the stored data.
/// - The store never interprets payloads; codecs live in [`crate::object`].
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Frame, hash and store a payload of the given kind.
    fn put(&self, kind: ObjectKind, payload: Vec<u8>) -> StoreResult<ObjectId> {
        self.write(&StoredObject::new(kind, payload))
    }

    /// Read an object, failing with [`StoreError::NotFound`] if it is absent.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read an object in its decompressed framed form.
    fn read_framed(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read(id)?.map(|obj| obj.to_framed()))
    }
}
