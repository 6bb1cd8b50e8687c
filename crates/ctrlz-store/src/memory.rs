use std::collections::HashMap;
use std::sync::RwLock;

use ctrlz_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock`. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Remove one object. Only tests use this, to simulate lost object files.
    pub fn remove(&self, id: &ObjectId) -> bool {
        self.objects.write().expect("lock poisoned").remove(id).is_some()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::*;

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let blob_id = store.write(&make_blob(b"hello")).unwrap();
        let tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "hello.txt", blob_id)]);
        let id = store.write(&tree.to_stored_object().unwrap()).unwrap();

        let read_back = store.get(&id).unwrap();
        assert_eq!(read_back.kind, ObjectKind::Tree);
        let decoded = Tree::from_stored_object(&read_back).unwrap();
        assert_eq!(decoded.get("hello.txt").unwrap().object_id, blob_id);
    }

    #[test]
    fn same_content_produces_same_id() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"identical content")).unwrap();
        let id2 = store.write(&make_blob(b"identical content")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_payload_different_kind_differs() {
        let store = InMemoryObjectStore::new();
        let blob = store.put(ObjectKind::Blob, b"same".to_vec()).unwrap();
        let commit = store.put(ObjectKind::Commit, b"same".to_vec()).unwrap();
        assert_ne!(blob, commit);
    }

    #[test]
    fn get_missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn exists_tracks_writes_and_removals() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"present")).unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(store.remove(&id));
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn read_framed_includes_header() {
        let store = InMemoryObjectStore::new();
        let id = store.put(ObjectKind::Blob, b"abc".to_vec()).unwrap();
        assert_eq!(store.read_framed(&id).unwrap().unwrap(), b"blob 3\0abc");
    }

    #[test]
    fn all_ids_is_sorted() {
        let store = InMemoryObjectStore::new();
        for content in [b"aaa", b"bbb", b"ccc"] {
            store.write(&make_blob(content)).unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}
