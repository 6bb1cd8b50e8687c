//! Core reference types.

use ctrlz_types::ObjectId;

/// The single branch this tool manages.
pub const DEFAULT_BRANCH: &str = "main";

/// The canonical ref name of a branch (e.g. `refs/heads/main`).
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

/// The state of HEAD: either symbolic (pointing to a ref) or detached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// HEAD names a ref, e.g. `refs/heads/main`.
    Symbolic(String),
    /// HEAD points directly at a commit. Only seen in hand-edited HEAD files.
    Detached(ObjectId),
}

impl Head {
    /// The text written to the HEAD file.
    pub fn to_file_contents(&self) -> String {
        match self {
            Head::Symbolic(target) => format!("ref: {target}\n"),
            Head::Detached(id) => format!("{id}\n"),
        }
    }

    /// Parse the contents of a HEAD file.
    pub fn parse(contents: &str) -> Option<Self> {
        let line = contents.trim();
        if let Some(target) = line.strip_prefix("ref: ") {
            return Some(Head::Symbolic(target.trim().to_string()));
        }
        ObjectId::from_hex(line).ok().map(Head::Detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_head_roundtrip() {
        let head = Head::Symbolic(branch_ref(DEFAULT_BRANCH));
        assert_eq!(head.to_file_contents(), "ref: refs/heads/main\n");
        assert_eq!(Head::parse(&head.to_file_contents()), Some(head));
    }

    #[test]
    fn detached_head_roundtrip() {
        let head = Head::Detached(ObjectId::from_bytes(b"commit"));
        assert_eq!(Head::parse(&head.to_file_contents()), Some(head));
    }

    #[test]
    fn garbage_head_does_not_parse() {
        assert_eq!(Head::parse("what is this"), None);
    }
}
