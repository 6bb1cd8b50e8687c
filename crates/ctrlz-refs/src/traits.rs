//! The [`RefStore`] trait defining the reference storage interface.

use ctrlz_types::ObjectId;

use crate::error::{RefError, Result};
use crate::types::Head;

/// Storage backend for named references.
///
/// The namespace follows git's layout: `refs/heads/*` for branches, plus the
/// `HEAD` pointer which normally names a branch.
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist yet.
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>>;

    /// Write (create or overwrite) a ref.
    fn write_ref(&self, name: &str, target: &ObjectId) -> Result<()>;

    /// Read the current HEAD state.
    ///
    /// Returns `Ok(None)` if HEAD has not been set.
    fn head(&self) -> Result<Option<Head>>;

    /// Overwrite HEAD.
    fn set_head(&self, head: &Head) -> Result<()>;

    /// Resolve HEAD to a commit id. `Ok(None)` means the branch HEAD names
    /// has no commits yet.
    fn resolve_head(&self) -> Result<Option<ObjectId>> {
        match self.head()? {
            Some(Head::Symbolic(target)) => self.read_ref(&target),
            Some(Head::Detached(id)) => Ok(Some(id)),
            None => Err(RefError::NotFound {
                name: "HEAD".into(),
            }),
        }
    }

    /// Move whatever HEAD points at to `target`: the named ref when HEAD is
    /// symbolic, HEAD itself when detached.
    fn advance_head(&self, target: &ObjectId) -> Result<()> {
        match self.head()? {
            Some(Head::Symbolic(name)) => self.write_ref(&name, target),
            Some(Head::Detached(_)) => self.set_head(&Head::Detached(*target)),
            None => Err(RefError::NotFound {
                name: "HEAD".into(),
            }),
        }
    }
}
