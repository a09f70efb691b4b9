use crate::Archive;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

/// Local file header; the first bytes of any non-empty zip.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// End of central directory; the first bytes of an empty zip.
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

impl FromStr for Archive {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Archive::None),
            "zip" => Ok(Archive::Zip),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
impl From<&[u8]> for Archive {
    fn from(value: &[u8]) -> Self {
        Archive::from_magic_bytes(value)
    }
}
impl Archive {
    /// Detect an archive format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "zip" => Archive::Zip,
                _ => Archive::None,
            })
            .unwrap_or(Archive::None)
    }

    /// Detect an archive format from magic bytes.
    ///
    /// Returns `None` variant if no magic bytes match or if the input
    /// is too short to detect any format.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return Archive::Zip;
        }
        Archive::None
    }
}
