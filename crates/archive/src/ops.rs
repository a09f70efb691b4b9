//! Archive Operations

use crate::Archive;
use crate::error::{Error, ErrorKind, Result};
use crate::path::validate as validate_entry;
use exn::ResultExt;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;
use zip::ZipArchive;
use zip::result::ZipError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

impl Archive {
    /// Extract every entry of `archive` underneath `destination`.
    ///
    /// Nested directories are created as needed. Returns the paths of the
    /// written files in archive order (duplicate entry names are written
    /// once, last entry wins on disk). The destination must already exist
    /// and is owned by the caller, including its removal when extraction
    /// fails halfway.
    ///
    /// Entries are never written as symlinks; a symlink entry becomes a
    /// regular file containing its link target.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use verifile_archive::Archive;
    ///
    /// # fn example() -> verifile_archive::error::Result<()> {
    /// let destination = std::env::temp_dir().join("extracted");
    /// std::fs::create_dir_all(&destination).unwrap();
    /// let files = Archive::Zip.extract("bundle.zip", &destination)?;
    /// println!("extracted {} files", files.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract(&self, archive: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        match self {
            Archive::None => exn::bail!(ErrorKind::UnsupportedFormat(self.to_string())),
            Archive::Zip => extract_zip(archive.as_ref(), destination.as_ref()),
        }
    }
}

#[instrument(skip_all, fields(archive = %archive.display(), destination = %destination.display(), entries = tracing::field::Empty))]
fn extract_zip(archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive).map_err(|e| map_io_error(e, archive))?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(raise_zip)?;
    tracing::Span::current().record("entries", zip.len());

    let mut written = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(raise_zip)?;
        let relative = validate_entry(entry.name())?;
        let target = destination.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).or_raise(|| ErrorKind::Io)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        }
        let mut output = File::create(&target).or_raise(|| ErrorKind::Io)?;
        copy_entry(&mut entry, &mut output)?;
        tracing::trace!(entry = %relative.display(), "Extracted archive entry");
        if !written.contains(&target) {
            written.push(target);
        }
    }
    tracing::debug!(files = written.len(), "Archive extracted");
    Ok(written)
}

/// Copy in chunks so that decode failures (bad deflate stream, checksum
/// mismatch) are told apart from failures writing to disk.
fn copy_entry(entry: &mut impl Read, output: &mut impl Write) -> Result<u64> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let read = entry.read(&mut buffer).or_raise(|| ErrorKind::InvalidData)?;
        if read == 0 {
            break;
        }
        output.write_all(&buffer[..read]).or_raise(|| ErrorKind::Io)?;
        total += read as u64;
    }
    output.flush().or_raise(|| ErrorKind::Io)?;
    Ok(total)
}

fn map_io_error(e: std::io::Error, path: &Path) -> Error {
    let kind = match e.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ErrorKind::Locked(path.to_path_buf()),
        _ => ErrorKind::Io,
    };
    exn::Exn::from(e).raise(kind)
}

fn raise_zip(e: ZipError) -> Error {
    let kind = match &e {
        ZipError::UnsupportedArchive(reason) => ErrorKind::Unsupported(reason.to_string()),
        _ => ErrorKind::InvalidData,
    };
    exn::Exn::from(e).raise(kind)
}
