use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashSet;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Depth-first directory walk.
///
/// Within a directory, entries are taken in file-name order; all regular
/// files of a directory are listed before any of its subdirectories are
/// entered. Symlinked directories are only entered when following symlinks,
/// and every directory is entered at most once (by canonical path), which
/// breaks symlink cycles.
pub(crate) struct Walker {
    follow_symlinks: bool,
    visited: HashSet<PathBuf>,
}
impl Walker {
    pub(crate) fn new(follow_symlinks: bool) -> Self {
        Self {
            follow_symlinks,
            visited: HashSet::new(),
        }
    }

    /// Lists every regular file beneath `root`.
    ///
    /// The root itself must be readable. Unreadable directories further
    /// down are skipped with a warning.
    pub(crate) fn walk(mut self, root: &Path) -> Result<Vec<PathBuf>> {
        let canonical = fs::canonicalize(root).or_raise(|| ErrorKind::ScanPathInvalid(root.to_path_buf()))?;
        self.visited.insert(canonical);
        let entries = read_sorted(root).or_raise(|| ErrorKind::ScanPathInvalid(root.to_path_buf()))?;
        let mut files = Vec::new();
        self.visit(entries, &mut files);
        tracing::debug!(root = %root.display(), files = files.len(), "Directory walk complete");
        Ok(files)
    }

    fn descend(&mut self, dir: &Path, files: &mut Vec<PathBuf>) {
        match read_sorted(dir) {
            Ok(entries) => self.visit(entries, files),
            Err(e) => tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory"),
        }
    }

    fn visit(&mut self, entries: Vec<DirEntry>, files: &mut Vec<PathBuf>) {
        let mut directories = Vec::new();
        for entry in entries {
            match self.process_entry(&entry) {
                WalkEntry::File(path) => files.push(path),
                WalkEntry::Descend(path) => directories.push(path),
                WalkEntry::Skip => {},
            }
        }
        for directory in directories {
            self.descend(&directory, files);
        }
    }

    fn process_entry(&mut self, entry: &DirEntry) -> WalkEntry {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            return WalkEntry::Skip;
        };
        let file_type = if file_type.is_symlink() {
            if !self.follow_symlinks {
                tracing::trace!(path = %path.display(), "Not following symlink");
                return WalkEntry::Skip;
            }
            match fs::metadata(&path) {
                Ok(metadata) => metadata.file_type(),
                // Note: silently drop what is most likely a broken symlink.
                Err(_) => return WalkEntry::Skip,
            }
        } else {
            file_type
        };
        if file_type.is_dir() {
            return match fs::canonicalize(&path) {
                Ok(canonical) => match self.visited.insert(canonical) {
                    true => WalkEntry::Descend(path),
                    false => {
                        tracing::debug!(path = %path.display(), "Directory already visited; not descending again");
                        WalkEntry::Skip
                    },
                },
                Err(_) => WalkEntry::Skip,
            };
        }
        if file_type.is_file() {
            return WalkEntry::File(path);
        }
        // Sockets, FIFOs, device nodes.
        WalkEntry::Skip
    }
}

fn read_sorted(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(DirEntry::file_name);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_files_before_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("b.txt"));
        touch(&root.join("a/inner.txt"));
        touch(&root.join("a/deeper/leaf.txt"));
        touch(&root.join("c.exe"));
        touch(&root.join("z/last.txt"));

        let files = Walker::new(true).walk(root).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("b.txt"),
                root.join("c.exe"),
                root.join("a/inner.txt"),
                root.join("a/deeper/leaf.txt"),
                root.join("z/last.txt"),
            ]
        );
    }

    #[test]
    fn test_empty_directories() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("empty/nested")).unwrap();
        assert!(Walker::new(true).walk(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        let err = Walker::new(true).walk(&missing).unwrap_err();
        assert_eq!(*err, ErrorKind::ScanPathInvalid(missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("a.txt"));
        touch(&root.join("locked/hidden.txt"));
        touch(&root.join("open/visible.txt"));
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not restrict privileged users.
        let enforced = fs::read_dir(&locked).is_err();

        let files = Walker::new(true).walk(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let files = files.unwrap();
        if enforced {
            assert_eq!(files, vec![root.join("a.txt"), root.join("open/visible.txt")]);
        } else {
            assert!(files.contains(&root.join("open/visible.txt")));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        touch(&root.join("a/file.txt"));
        std::os::unix::fs::symlink(&root, root.join("a/loop")).unwrap();

        let files = Walker::new(true).walk(&root).unwrap();
        assert_eq!(files, vec![root.join("a/file.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_followed_only_when_enabled() {
        let temp = tempfile::tempdir().unwrap();
        let outside = temp.path().join("outside");
        touch(&outside.join("linked.txt"));
        let root = temp.path().join("root");
        touch(&root.join("own.txt"));
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("broken")).unwrap();

        let followed = Walker::new(true).walk(&root).unwrap();
        assert_eq!(followed, vec![root.join("own.txt"), root.join("link/linked.txt")]);

        let not_followed = Walker::new(false).walk(&root).unwrap();
        assert_eq!(not_followed, vec![root.join("own.txt")]);
    }
}
