//! Archive detection and extraction for scan targets.
//!
//! A scan target may be handed over as a single archive instead of a
//! directory. This crate recognises supported archive formats through the
//! [`Archive`] enum, providing:
//!
//! - **Format detection** from file extensions ([`Archive::from_path`]) or
//!   magic bytes ([`Archive::from_magic_bytes`])
//! - **Extraction** into a caller-owned directory ([`Archive::extract`]),
//!   rejecting any entry whose name would escape that directory
//!
//! Only standard zip is supported. Password-protected and split archives are
//! rejected as unsupported.

mod construct;
pub mod error;
mod ops;
mod path;
mod util;

pub use crate::path::validate as validate_entry_path;

/// A supported archive format.
///
/// Defaults to [`None`](Self::None) (not an archive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Archive {
    /// Not an archive
    #[default]
    None,
    /// Zip archive (.zip)
    Zip,
}
