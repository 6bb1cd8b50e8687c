//! File-backed reference store.
//!
//! [`FsRefStore`] keeps `HEAD` and every `refs/...` file directly under the
//! repository metadata directory, each as a single line of text.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ctrlz_types::ObjectId;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Head;

/// Ref store rooted at the repository metadata directory.
#[derive(Clone, Debug)]
pub struct FsRefStore {
    meta_dir: PathBuf,
}

impl FsRefStore {
    pub fn new(meta_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta_dir: meta_dir.into(),
        }
    }

    fn head_path(&self) -> PathBuf {
        self.meta_dir.join("HEAD")
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        validate_ref_name(name)?;
        Ok(name
            .split('/')
            .fold(self.meta_dir.clone(), |path, part| path.join(part)))
    }
}

/// Replace `path` with `contents` through a temp file in the same directory.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>> {
        let Some(contents) = read_optional(&self.ref_path(name)?)? else {
            return Ok(None);
        };
        let line = contents.trim();
        if line.is_empty() {
            return Ok(None);
        }
        ObjectId::from_hex(line).map(Some).map_err(|_| RefError::Corrupt {
            name: name.to_string(),
            content: line.to_string(),
        })
    }

    fn write_ref(&self, name: &str, target: &ObjectId) -> Result<()> {
        let path = self.ref_path(name)?;
        write_atomic(&path, &format!("{target}\n"))?;
        debug!(name, target = %target.short_hex(), "updated ref");
        Ok(())
    }

    fn head(&self) -> Result<Option<Head>> {
        let Some(contents) = read_optional(&self.head_path())? else {
            return Ok(None);
        };
        Head::parse(&contents).map(Some).ok_or_else(|| RefError::Corrupt {
            name: "HEAD".into(),
            content: contents.trim().to_string(),
        })
    }

    fn set_head(&self, head: &Head) -> Result<()> {
        if let Head::Symbolic(target) = head {
            validate_ref_name(target)?;
        }
        write_atomic(&self.head_path(), &head.to_file_contents())
    }
}
