//! Response codes.
//!
//! The closed set of numeric verdicts a scan, a step or an invalid file can
//! carry. Values are part of the external interface and must not change.

use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ResponseCode {
    #[default]
    Ok = 0,
    Generic = 1,
    Fatal = 2,
    AvTriggered = 3,
    Multiple = 4,
    Extension = 101,
    Signature = 102,
    Size = 103,
    Checksum = 104,
    VirusTotal = 105,
    FileNotFound = 106,
    FilenameInvalid = 107,
    ScanPathInvalid = 108,
    Corrupted = 109,
    Locked = 110,
}

impl ResponseCode {
    pub const ALL: [ResponseCode; 15] = [
        ResponseCode::Ok,
        ResponseCode::Generic,
        ResponseCode::Fatal,
        ResponseCode::AvTriggered,
        ResponseCode::Multiple,
        ResponseCode::Extension,
        ResponseCode::Signature,
        ResponseCode::Size,
        ResponseCode::Checksum,
        ResponseCode::VirusTotal,
        ResponseCode::FileNotFound,
        ResponseCode::FilenameInvalid,
        ResponseCode::ScanPathInvalid,
        ResponseCode::Corrupted,
        ResponseCode::Locked,
    ];

    #[inline]
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }

    /// Short lowercase name, used next to the numeric value in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::Ok => "ok",
            ResponseCode::Generic => "generic",
            ResponseCode::Fatal => "fatal",
            ResponseCode::AvTriggered => "av-triggered",
            ResponseCode::Multiple => "multiple",
            ResponseCode::Extension => "extension",
            ResponseCode::Signature => "signature",
            ResponseCode::Size => "size",
            ResponseCode::Checksum => "checksum",
            ResponseCode::VirusTotal => "virustotal",
            ResponseCode::FileNotFound => "file-not-found",
            ResponseCode::FilenameInvalid => "filename-invalid",
            ResponseCode::ScanPathInvalid => "scan-path-invalid",
            ResponseCode::Corrupted => "corrupted",
            ResponseCode::Locked => "locked",
        }
    }

    /// Ordering used when deciding whether a newly reported scan-wide code
    /// may replace the current one. Per-file classes share one rank.
    #[must_use]
    pub fn severity(&self) -> u8 {
        match self {
            ResponseCode::Ok => 0,
            ResponseCode::Multiple => 2,
            ResponseCode::Fatal => 3,
            _ => 1,
        }
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_u16())
    }
}

impl From<ResponseCode> for u16 {
    fn from(code: ResponseCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for ResponseCode {
    type Error = Error;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match ResponseCode::ALL.iter().find(|code| code.as_u16() == value) {
            Some(code) => Ok(*code),
            None => exn::bail!(ErrorKind::UnknownCode(value)),
        }
    }
}
