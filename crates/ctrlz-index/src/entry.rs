//! Staged entries and their one-line text form.

use std::fmt;

use ctrlz_store::EntryMode;
use ctrlz_types::ObjectId;

use crate::error::{IndexError, IndexResult};

/// A path staged for the next commit.
///
/// The path is relative to the working directory root and uses `/` as the
/// separator. A directory entry stages a whole subtree at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub mode: EntryMode,
    pub path: String,
    pub object_id: ObjectId,
}

impl IndexEntry {
    pub fn new(mode: EntryMode, path: impl Into<String>, object_id: ObjectId) -> IndexResult<Self> {
        let path = path.into();
        validate_path(&path)?;
        Ok(Self {
            mode,
            path,
            object_id,
        })
    }

    /// Path components, outermost first.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    /// Parse `"<mode> <path> <hex>"`. The path may contain spaces: the mode
    /// is the first field and the hash the last.
    pub fn parse_line(line: &str, line_no: usize) -> IndexResult<Self> {
        let malformed = || IndexError::Malformed {
            line_no,
            line: line.to_string(),
        };
        let (mode, rest) = line.split_once(' ').ok_or_else(malformed)?;
        let (path, hex) = rest.rsplit_once(' ').ok_or_else(malformed)?;
        let mode = EntryMode::parse(mode).ok_or_else(malformed)?;
        let object_id = ObjectId::from_hex(hex).map_err(|_| malformed())?;
        Self::new(mode, path, object_id).map_err(|_| malformed())
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.mode, self.path, self.object_id)
    }
}

/// Reject paths that could not round-trip through a tree.
fn validate_path(path: &str) -> IndexResult<()> {
    let bad = path.is_empty()
        || path.contains(['\n', '\r', '\0', '\\'])
        || path
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..");
    if bad {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(())
}
