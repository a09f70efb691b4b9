//! Entry-name validation.
//!
//! Archive entry names are untrusted input. Before anything is written to
//! disk the name is normalized and checked so that it can only ever resolve
//! to a location inside the extraction root.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validates an archive entry name, returning the normalized relative path.
///
/// Rejected with [`UnsafePath`](crate::error::ErrorKind::UnsafePath):
/// - absolute names (`/etc/passwd`) and Windows drive prefixes,
/// - any `..` that would climb above the extraction root,
/// - names containing NUL bytes,
/// - names that normalize to nothing (`./`, empty).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use verifile_archive::validate_entry_path;
/// assert!(validate_entry_path("docs/readme.txt").is_ok());
/// assert!(validate_entry_path("docs/../readme.txt").is_ok());
/// assert!(validate_entry_path("../outside.txt").is_err());
/// assert!(validate_entry_path("/etc/passwd").is_err());
/// assert_eq!(
///     validate_entry_path("a/./b//c.txt").unwrap(),
///     Path::new("a/b/c.txt")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::UnsafePath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) => exn::bail!(ErrorKind::UnsafePath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::UnsafePath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::UnsafePath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
