//! Scan target resolution.
//!
//! Turns a user-supplied target (directory, single file or archive) into the
//! flat, ordered list of files every step inspects. Archive targets are
//! extracted into a freshly created, randomly named temporary directory that
//! the [`InputSet`] owns until [`InputSet::cleanup`] (or drop) removes it.

mod walk;

use crate::error::{Error, ErrorKind, Result};
use crate::session::ScanSession;
use crate::input::walk::Walker;
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::instrument;
use verifile_archive::Archive;
use verifile_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};

/// Prefix of temporary extraction directories; the remainder is random.
pub const TEMP_DIR_PREFIX: &str = "verifile-";

/// What kind of target an [`InputSet`] was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Directory,
    Archive(Archive),
    File,
}

/// The resolved files of one scan.
///
/// Paths are absolute and unique, in discovery order. When the target was an
/// archive, the extraction directory lives exactly as long as this value or
/// until [`cleanup`](Self::cleanup), whichever comes first.
#[derive(Debug)]
pub struct InputSet {
    target: PathBuf,
    kind: InputKind,
    files: Vec<PathBuf>,
    temp: Option<TempDir>,
}
impl InputSet {
    /// Resolve `target` with default options: symlinks followed, archives
    /// extracted under the system temp directory.
    pub fn resolve(target: impl AsRef<Path>) -> Result<Self> {
        Self::resolve_with(target.as_ref(), true, None)
    }

    /// Resolve the target configured on a [`ScanSession`].
    pub fn resolve_session(session: &ScanSession) -> Result<Self> {
        match session.target() {
            Some(target) => Self::resolve_with(target, session.follow_symlinks(), session.temp_dir()),
            None => {
                tracing::error!("Scan path is not set");
                exn::bail!(ErrorKind::ScanPathInvalid(PathBuf::new()))
            },
        }
    }

    #[instrument(skip_all, fields(target = %target.display()))]
    fn resolve_with(target: &Path, follow_symlinks: bool, temp_root: Option<&Path>) -> Result<Self> {
        if target.as_os_str().is_empty() {
            tracing::error!("Scan path is not set");
            exn::bail!(ErrorKind::ScanPathInvalid(PathBuf::new()));
        }
        let metadata = fs::metadata(target).or_raise(|| ErrorKind::ScanPathInvalid(target.to_path_buf()))?;
        // Detected from the name the caller gave, before symlinks are resolved.
        let archive = Archive::from_path(target);
        let target = fs::canonicalize(target).or_raise(|| ErrorKind::ScanPathInvalid(target.to_path_buf()))?;
        tracing::debug!("Scan path seems to be valid");

        if metadata.is_dir() {
            tracing::info!("Discovered a directory; files inside will be added recursively");
            let files = Walker::new(follow_symlinks).walk(&target)?;
            return Ok(Self {
                target,
                kind: InputKind::Directory,
                files,
                temp: None,
            });
        }

        if archive.is_archive() {
            tracing::info!(format = %archive, "Discovered an archive; contents will be extracted and added recursively");
            let temp = create_temp_dir(temp_root)?;
            tracing::debug!(path = %temp.path().display(), "Created temporary directory");
            // On any error below `temp` is dropped, which removes the
            // partially extracted tree.
            archive.extract(&target, temp.path()).map_err(|e| raise_archive(e, &target, temp.path()))?;
            let files = Walker::new(follow_symlinks).walk(temp.path())?;
            return Ok(Self {
                target,
                kind: InputKind::Archive(archive),
                files,
                temp: Some(temp),
            });
        }

        Ok(Self {
            files: vec![target.clone()],
            target,
            kind: InputKind::File,
            temp: None,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The extraction directory, while one exists.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp.as_ref().map(TempDir::path)
    }

    /// Clear the file list and delete the extraction directory, if any.
    ///
    /// Safe to call repeatedly; the directory is removed at most once.
    pub fn cleanup(&mut self) -> Result<()> {
        self.files.clear();
        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            tracing::info!(path = %path.display(), "Deleting temporary directory");
            temp.close().or_raise(|| ErrorKind::Cleanup(path))?;
        }
        Ok(())
    }
}

fn create_temp_dir(root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_DIR_PREFIX);
    match root {
        Some(root) => builder.tempdir_in(root).or_raise(|| ErrorKind::TempDir(root.to_path_buf())),
        None => builder.tempdir().or_raise(|| ErrorKind::TempDir(std::env::temp_dir())),
    }
}

/// Translate an extraction failure into the resolution error reported to
/// the caller, keeping the archive error as a child in the error tree.
fn raise_archive(err: ArchiveError, target: &Path, temp: &Path) -> Error {
    let kind = match &*err {
        ArchiveErrorKind::NotFound(_) => ErrorKind::FileNotFound(target.to_path_buf()),
        ArchiveErrorKind::Locked(_) => ErrorKind::Locked(target.to_path_buf()),
        ArchiveErrorKind::Io => ErrorKind::TempDir(temp.to_path_buf()),
        ArchiveErrorKind::InvalidData
        | ArchiveErrorKind::Unsupported(_)
        | ArchiveErrorKind::UnsafePath(_)
        | ArchiveErrorKind::UnsupportedFormat(_) => ErrorKind::Corrupted(target.to_path_buf()),
    };
    err.raise(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ResponseCode;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn dir_entries(path: &Path) -> usize {
        fs::read_dir(path).unwrap().count()
    }

    #[test]
    fn test_directory_target() {
        let temp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        fs::write(root.join("good.txt"), b"fine").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/bad.exe"), b"MZ").unwrap();

        let input = InputSet::resolve(&root).unwrap();
        assert_eq!(input.kind(), InputKind::Directory);
        assert_eq!(input.files(), &[root.join("good.txt"), root.join("sub/bad.exe")]);
        assert!(input.temp_dir().is_none());
    }

    #[test]
    fn test_single_file_target() {
        let temp = tempfile::tempdir().unwrap();
        let file = fs::canonicalize(temp.path()).unwrap().join("report.pdf");
        fs::write(&file, b"%PDF").unwrap();

        let input = InputSet::resolve(&file).unwrap();
        assert_eq!(input.kind(), InputKind::File);
        assert_eq!(input.files(), &[file]);
        assert!(input.temp_dir().is_none());
    }

    #[test]
    fn test_archive_target_creates_and_removes_temp_dir() {
        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let archive = temp.path().join("upload.zip");
        write_zip(&archive, &[("a.exe", b"MZ"), ("docs/b.txt", b"text")]);
        let session = ScanSession::new(&archive).with_temp_dir(&scratch);

        let mut input = InputSet::resolve_session(&session).unwrap();
        assert_eq!(input.kind(), InputKind::Archive(Archive::Zip));
        assert_eq!(dir_entries(&scratch), 1);
        let extracted = input.temp_dir().unwrap().to_path_buf();
        assert!(extracted.starts_with(&scratch));
        assert!(
            extracted
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TEMP_DIR_PREFIX))
        );
        assert_eq!(input.files(), &[extracted.join("a.exe"), extracted.join("docs/b.txt")]);

        input.cleanup().unwrap();
        assert!(!extracted.exists());
        assert!(input.files().is_empty());
        assert_eq!(dir_entries(&scratch), 0);
        // Second cleanup is a no-op.
        input.cleanup().unwrap();
    }

    #[test]
    fn test_drop_removes_temp_dir() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("upload.zip");
        write_zip(&archive, &[("a.exe", b"MZ")]);

        let input = InputSet::resolve(&archive).unwrap();
        let extracted = input.temp_dir().unwrap().to_path_buf();
        assert!(extracted.is_dir());
        drop(input);
        assert!(!extracted.exists());
    }

    #[test]
    fn test_corrupt_archive_leaves_no_temp_dir() {
        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"not a zip at all").unwrap();
        let session = ScanSession::new(&archive).with_temp_dir(&scratch);

        let err = InputSet::resolve_session(&session).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Corrupted(_)));
        assert_eq!(err.code(), ResponseCode::Corrupted);
        assert_eq!(dir_entries(&scratch), 0);
    }

    #[test]
    fn test_unsafe_archive_is_corrupted() {
        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("ok.txt", b"fine"), ("../../escape.txt", b"nope")]);
        let session = ScanSession::new(&archive).with_temp_dir(&scratch);

        let err = InputSet::resolve_session(&session).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Corrupted(_)));
        assert_eq!(dir_entries(&scratch), 0);
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_archive_detected_by_given_name() {
        let temp = tempfile::tempdir().unwrap();
        let blob = temp.path().join("blob");
        write_zip(&blob, &[("inner.exe", b"MZ")]);
        let link = temp.path().join("upload.zip");
        std::os::unix::fs::symlink(&blob, &link).unwrap();

        let input = InputSet::resolve(&link).unwrap();
        assert_eq!(input.kind(), InputKind::Archive(Archive::Zip));
        let extracted = input.temp_dir().unwrap().to_path_buf();
        assert_eq!(input.files(), &[extracted.join("inner.exe")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_temp_root() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let archive = temp.path().join("upload.zip");
        write_zip(&archive, &[("a.exe", b"MZ")]);
        fs::set_permissions(&scratch, fs::Permissions::from_mode(0o555)).unwrap();
        // Permission bits do not restrict privileged users.
        let enforced = File::create(scratch.join("write-check")).is_err();
        let _ = fs::remove_file(scratch.join("write-check"));

        let session = ScanSession::new(&archive).with_temp_dir(&scratch);
        let resolved = InputSet::resolve_session(&session);
        fs::set_permissions(&scratch, fs::Permissions::from_mode(0o755)).unwrap();
        if enforced {
            let err = resolved.unwrap_err();
            assert_eq!(*err, ErrorKind::TempDir(scratch.clone()));
            assert_eq!(err.code(), ResponseCode::Generic);
            assert_eq!(dir_entries(&scratch), 0);
        }
    }

    #[rstest]
    #[case(ArchiveErrorKind::NotFound(PathBuf::from("/srv/upload.zip")), ErrorKind::FileNotFound(PathBuf::from("/srv/upload.zip")))]
    #[case(ArchiveErrorKind::Locked(PathBuf::from("/srv/upload.zip")), ErrorKind::Locked(PathBuf::from("/srv/upload.zip")))]
    #[case(ArchiveErrorKind::Io, ErrorKind::TempDir(PathBuf::from("/tmp/verifile-abc")))]
    #[case(ArchiveErrorKind::InvalidData, ErrorKind::Corrupted(PathBuf::from("/srv/upload.zip")))]
    #[case(ArchiveErrorKind::UnsafePath(PathBuf::from("../x")), ErrorKind::Corrupted(PathBuf::from("/srv/upload.zip")))]
    fn test_archive_errors_translate(#[case] archive_kind: ArchiveErrorKind, #[case] expected: ErrorKind) {
        let err = raise_archive(exn::Exn::from(archive_kind), Path::new("/srv/upload.zip"), Path::new("/tmp/verifile-abc"));
        assert_eq!(*err, expected);
    }

    #[test]
    fn test_missing_target() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        let err = InputSet::resolve(&missing).unwrap_err();
        assert_eq!(*err, ErrorKind::ScanPathInvalid(missing));
    }

    #[test]
    fn test_unset_target() {
        let err = InputSet::resolve("").unwrap_err();
        assert_eq!(err.code(), ResponseCode::ScanPathInvalid);

        let session = ScanSession::from(&verifile_config::Config::default());
        let err = InputSet::resolve_session(&session).unwrap_err();
        assert_eq!(*err, ErrorKind::ScanPathInvalid(PathBuf::new()));
    }
}
