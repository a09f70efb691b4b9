use crate::Archive;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Archive {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Archive {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Archive {
    /// Returns the file extension for this archive format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Archive::None => "",
            Archive::Zip => ".zip",
        }
    }

    /// Returns the short name for configuration (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Archive::None => "none",
            Archive::Zip => "zip",
        }
    }

    /// Returns `true` if this is an actual archive format.
    #[inline]
    #[must_use]
    pub fn is_archive(&self) -> bool {
        !matches!(self, Archive::None)
    }

    /// Verify that `bytes` start with the expected magic bytes for this format.
    ///
    /// Useful for cross-checking a format detected from a file extension
    /// against actual file contents.
    #[must_use]
    pub fn check_magic_bytes(&self, bytes: &[u8]) -> bool {
        Self::from_magic_bytes(bytes) == *self
    }
}

#[cfg(test)]
mod tests {
    use crate::Archive;
    use rstest::rstest;

    #[rstest]
    #[case(Archive::None, "")]
    #[case(Archive::Zip, ".zip")]
    fn test_extension(#[case] format: Archive, #[case] expected: &str) {
        assert_eq!(format.extension(), expected);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for format in [Archive::None, Archive::Zip] {
            assert_eq!(format.to_string().parse::<Archive>().unwrap(), format);
        }
    }

    #[rstest]
    #[case(Archive::Zip, b"PK\x03\x04", true)]
    #[case(Archive::Zip, b"plain text", false)]
    #[case(Archive::None, b"plain text", true)]
    #[case(Archive::None, b"PK\x03\x04", false)]
    fn test_check_magic_bytes(#[case] format: Archive, #[case] bytes: &[u8], #[case] expected: bool) {
        assert_eq!(format.check_magic_bytes(bytes), expected);
    }
}
