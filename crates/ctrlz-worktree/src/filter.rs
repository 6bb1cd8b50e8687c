//! Ignore rules: which working-directory paths are left out of snapshots.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::error::WorktreeResult;

/// Name of the ignore file read from the working directory root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Predicate deciding whether a path is excluded from snapshots.
///
/// `path` is relative to the working directory root.
pub trait PathFilter {
    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool;
}

/// Accepts every path.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIgnore;

impl PathFilter for NoIgnore {
    fn is_ignored(&self, _path: &Path, _is_dir: bool) -> bool {
        false
    }
}

/// Glob rules loaded from the root ignore file.
///
/// One pattern per line; blank lines and lines starting with `#` are
/// skipped. Matching follows gitignore semantics, so a pattern that matches
/// a directory excludes everything below it.
#[derive(Clone, Debug)]
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Load `<root>/.gitignore`. A missing file yields rules that ignore
    /// nothing.
    pub fn load(root: &Path) -> WorktreeResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let file = root.join(IGNORE_FILE);
        if file.is_file() {
            if let Some(err) = builder.add(&file) {
                return Err(err.into());
            }
        }
        let matcher = builder.build()?;
        debug!(rules = matcher.num_ignores(), "loaded ignore rules");
        Ok(Self { matcher })
    }

    /// Build rules from literal pattern lines, rooted at `root`.
    pub fn from_lines<'l>(
        root: &Path,
        lines: impl IntoIterator<Item = &'l str>,
    ) -> WorktreeResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for line in lines {
            builder.add_line(None, line)?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }
}

impl PathFilter for IgnoreRules {
    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}
