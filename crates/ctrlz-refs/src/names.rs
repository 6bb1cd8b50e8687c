//! Ref name validation following git-style conventions.
//!
//! Refs are files under the metadata directory, so a name must never be
//! able to escape it. A valid name:
//! - starts with `refs/`
//! - has no empty components and no component starting with `.`
//! - contains no whitespace, control characters, `~ ^ : ? * [ \`, `..` or `@{`
//! - does not end with `.lock`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Validate a canonical ref name such as `refs/heads/main`.
///
/// # Examples
///
/// ```
/// use ctrlz_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("refs/heads/../../HEAD").is_err());
/// assert!(validate_ref_name("main").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(RefError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    let Some(rest) = name.strip_prefix("refs/") else {
        return invalid("must start with 'refs/'");
    };
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return invalid(&format!("contains forbidden character {ch:?}"));
    }
    if name.contains("..") || name.contains("@{") {
        return invalid("must not contain '..' or '@{'");
    }
    if name.ends_with(".lock") {
        return invalid("must not end with '.lock'");
    }
    if rest.split('/').any(|c| c.is_empty() || c.starts_with('.')) {
        return invalid("components must be non-empty and not start with '.'");
    }
    Ok(())
}
