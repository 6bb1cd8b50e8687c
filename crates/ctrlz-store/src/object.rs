use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use ctrlz_types::{ObjectId, OBJECT_ID_LEN};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Raw content (file contents).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// Snapshot record linking a tree to its parent commit.
    Commit,
}

impl ObjectKind {
    /// The name written into the framing header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a framing header kind name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// payload; it only frames it as `"<kind> <len>\0" + payload`, and the
/// object's identity is the SHA-1 of that framed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The encoded payload of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// The framing header, including the trailing NUL.
    pub fn header(&self) -> String {
        format!("{} {}\0", self.kind, self.data.len())
    }

    /// The framed representation that is hashed, compressed and transferred.
    pub fn to_framed(&self) -> Vec<u8> {
        let header = self.header();
        let mut framed = Vec::with_capacity(header.len() + self.data.len());
        framed.extend_from_slice(header.as_bytes());
        framed.extend_from_slice(&self.data);
        framed
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectId::from_bytes(&self.to_framed())
    }

    /// Split a framed byte sequence back into kind and payload.
    ///
    /// `id` is only used to label errors.
    pub fn from_framed(id: ObjectId, framed: &[u8]) -> StoreResult<Self> {
        let nul = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StoreError::corrupt(id, "missing header terminator"))?;
        let header = std::str::from_utf8(&framed[..nul])
            .map_err(|_| StoreError::corrupt(id, "header is not UTF-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| StoreError::corrupt(id, "header missing length"))?;
        let kind = ObjectKind::parse(kind)
            .ok_or_else(|| StoreError::corrupt(id, format!("unknown object kind {kind:?}")))?;
        let len: usize = len
            .parse()
            .map_err(|_| StoreError::corrupt(id, format!("invalid length {len:?}")))?;

        let payload = &framed[nul + 1..];
        if payload.len() != len {
            return Err(StoreError::corrupt(
                id,
                format!("declared length {len}, found {}", payload.len()),
            ));
        }
        Ok(Self::new(kind, payload.to_vec()))
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::corrupt(
                self.compute_id(),
                format!("expected {kind}, got {}", self.kind),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (`100644`).
    Regular,
    /// Subtree / directory (`40000`).
    Directory,
}

impl EntryMode {
    /// The literal mode string stored in trees and in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Directory => "40000",
        }
    }

    /// Parse a literal mode string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "100644" => Some(Self::Regular),
            "40000" => Some(Self::Directory),
            _ => None,
        }
    }

    /// The kind of object an entry with this mode points at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Regular => ObjectKind::Blob,
            Self::Directory => ObjectKind::Tree,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode (regular file or directory).
    pub mode: EntryMode,
    /// Entry name: a single path component.
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

/// True when `name` is a single path component: non-empty, not `.` or `..`,
/// and free of `/` and NUL.
pub(crate) fn is_valid_entry_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Directory listing object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Entries in ascending name order.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name for deterministic hashing.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Encode into a `StoredObject`.
    ///
    /// Each entry is `mode + " " + name + "\0" + 20 raw digest bytes`.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let mut data = Vec::new();
        for entry in &self.entries {
            if !is_valid_entry_name(&entry.name) {
                return Err(StoreError::InvalidEntryName(entry.name.clone()));
            }
            data.extend_from_slice(entry.mode.as_str().as_bytes());
            data.push(b' ');
            data.extend_from_slice(entry.name.as_bytes());
            data.push(0);
            data.extend_from_slice(entry.object_id.as_bytes());
        }
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let corrupt = |reason: String| StoreError::corrupt(obj.compute_id(), reason);

        let mut entries = Vec::new();
        let mut rest = obj.data.as_slice();
        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| corrupt(format!("entry {} has no mode delimiter", entries.len())))?;
            let mode = std::str::from_utf8(&rest[..space])
                .ok()
                .and_then(EntryMode::parse)
                .ok_or_else(|| corrupt(format!("entry {} has an unknown mode", entries.len())))?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| corrupt(format!("entry {} has no name terminator", entries.len())))?;
            let name = String::from_utf8(rest[..nul].to_vec())
                .map_err(|_| corrupt(format!("entry {} name is not UTF-8", entries.len())))?;
            if !is_valid_entry_name(&name) {
                return Err(corrupt(format!("entry name {name:?} is not a single path component")));
            }
            rest = &rest[nul + 1..];

            if rest.len() < OBJECT_ID_LEN {
                return Err(corrupt(format!(
                    "entry {name:?} digest truncated to {} bytes",
                    rest.len()
                )));
            }
            let object_id = ObjectId::from_slice(&rest[..OBJECT_ID_LEN])
                .map_err(|e| corrupt(e.to_string()))?;
            rest = &rest[OBJECT_ID_LEN..];

            entries.push(TreeEntry {
                mode,
                name,
                object_id,
            });
        }
        Ok(Self { entries })
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Author or committer identity: `Name <email>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Check that the signature survives the `Name <email>` header line.
    ///
    /// Line breaks and angle brackets in either part, or surrounding
    /// whitespace in the name, would make the commit undecodable or
    /// change it on reread.
    pub fn validate(&self) -> StoreResult<()> {
        let bad = |s: &str| s.contains(['\n', '\r', '<', '>']);
        if bad(&self.name) || bad(&self.email) || self.name.trim() != self.name {
            return Err(StoreError::InvalidSignature(self.to_string()));
        }
        Ok(())
    }

    /// Parse `Name <email>`.
    pub fn parse(s: &str) -> Option<Self> {
        let open = s.rfind('<')?;
        let email = s[open + 1..].strip_suffix('>')?;
        Some(Self::new(s[..open].trim_end(), email))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A commit: a tree snapshot, an optional parent and metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
}

impl Commit {
    /// Encode into a `StoredObject`.
    pub fn to_stored_object(&self) -> StoredObject {
        let mut text = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            text.push_str(&format!("parent {parent}\n"));
        }
        text.push_str(&format!("author {}\n", self.author));
        text.push_str(&format!("committer {}\n", self.committer));
        text.push_str(&format!(
            "timestamp {} {}\n",
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        ));
        text.push('\n');
        text.push_str(&self.message);
        StoredObject::new(ObjectKind::Commit, text.into_bytes())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        let id = obj.compute_id();
        let corrupt = |reason: &str| StoreError::corrupt(id, reason);

        let text =
            std::str::from_utf8(&obj.data).map_err(|_| corrupt("commit is not UTF-8"))?;
        let (headers, message) = text.split_once("\n\n").unwrap_or((text, ""));

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;
        let mut timestamp = None;
        for line in headers.lines() {
            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(ObjectId::from_hex(hex).map_err(|_| corrupt("invalid tree hash"))?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parent =
                    Some(ObjectId::from_hex(hex).map_err(|_| corrupt("invalid parent hash"))?);
            } else if let Some(sig) = line.strip_prefix("author ") {
                author = Some(Signature::parse(sig).ok_or_else(|| corrupt("invalid author"))?);
            } else if let Some(sig) = line.strip_prefix("committer ") {
                committer =
                    Some(Signature::parse(sig).ok_or_else(|| corrupt("invalid committer"))?);
            } else if let Some(ts) = line.strip_prefix("timestamp ") {
                timestamp = Some(parse_timestamp(ts).ok_or_else(|| corrupt("invalid timestamp"))?);
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| corrupt("missing tree line"))?,
            parent,
            author: author.ok_or_else(|| corrupt("missing author line"))?,
            committer: committer.ok_or_else(|| corrupt("missing committer line"))?,
            timestamp: timestamp.ok_or_else(|| corrupt("missing timestamp line"))?,
            message: message.to_string(),
        })
    }
}

/// Parse `<unix-seconds> <+hhmm>`.
fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let (secs, tz) = s.split_once(' ')?;
    let secs: i64 = secs.parse().ok()?;
    if tz.len() != 5 || !tz.is_ascii() {
        return None;
    }
    let sign = match &tz[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let hours: i32 = tz[1..3].parse().ok()?;
    let minutes: i32 = tz[3..5].parse().ok()?;
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    offset.timestamp_opt(secs, 0).single()
}
