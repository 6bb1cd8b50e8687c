//! On-disk loose object store.
//!
//! Each object lives in its own file at `objects/<2 hex>/<38 hex>`, holding
//! the zlib-compressed framed bytes (`"<kind> <len>\0" + payload`).

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ctrlz_types::ObjectId;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Sharded, zlib-compressed object store rooted at an `objects/` directory.
#[derive(Clone, Debug)]
pub struct LooseObjectStore {
    root: PathBuf,
}

impl LooseObjectStore {
    /// Open a store rooted at `objects_dir`. The directory is created lazily
    /// by the first write.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: objects_dir.into(),
        }
    }

    /// The `objects/` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(id.shard()).join(id.rest())
    }

    /// Every object id present on disk, sorted.
    pub fn iter_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        if !self.root.exists() {
            return Ok(ids);
        }
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let prefix = shard.file_name().to_string_lossy().into_owned();
            for file in fs::read_dir(shard.path())? {
                let file = file?;
                let name = file.file_name().to_string_lossy().into_owned();
                // Leftover temp files and foreign files do not parse as ids.
                if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{name}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_compressed(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let path = self.object_path(id);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut framed = Vec::new();
        ZlibDecoder::new(file)
            .read_to_end(&mut framed)
            .map_err(|e| StoreError::corrupt(*id, format!("zlib: {e}")))?;
        Ok(Some(framed))
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        match self.read_compressed(id)? {
            Some(framed) => StoredObject::from_framed(*id, &framed).map(Some),
            None => Ok(None),
        }
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let framed = object.to_framed();
        let id = ObjectId::from_bytes(&framed);
        let path = self.object_path(&id);
        if path.exists() {
            debug!(id = %id.short_hex(), "object already stored");
            return Ok(id);
        }

        let shard_dir = self.root.join(id.shard());
        fs::create_dir_all(&shard_dir)?;

        // Compress into a temp file in the shard, then rename into place so a
        // reader never observes a half-written object.
        let tmp = tempfile::NamedTempFile::new_in(&shard_dir)?;
        let mut encoder = ZlibEncoder::new(tmp, Compression::default());
        encoder.write_all(&framed)?;
        let tmp = encoder.finish()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn read_framed(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        self.read_compressed(id)
    }
}
