//! Per-scan settings and the read-only view handed to steps.

use std::path::{Path, PathBuf};
use verifile_config::{Config, Verbosity};

/// Settings for one scan invocation.
///
/// Constructed per scan and passed by reference, so independent scans in
/// one process never share mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSession {
    target: Option<PathBuf>,
    verbosity: Verbosity,
    format_specific: bool,
    follow_symlinks: bool,
    temp_dir: Option<PathBuf>,
}
impl ScanSession {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: Some(target.into()),
            verbosity: Verbosity::default(),
            format_specific: false,
            follow_symlinks: true,
            temp_dir: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_format_specific(mut self, enabled: bool) -> Self {
        self.format_specific = enabled;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Extract archive targets underneath `root` instead of the system
    /// temp directory.
    pub fn with_temp_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(root.into());
        self
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn format_specific(&self) -> bool {
        self.format_specific
    }

    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}
impl From<&Config> for ScanSession {
    fn from(config: &Config) -> Self {
        Self {
            target: config.target.clone(),
            verbosity: config.output,
            format_specific: config.format_specific,
            follow_symlinks: config.follow_symlinks,
            temp_dir: config.temp_dir.clone(),
        }
    }
}

/// What a step sees while it runs: the resolved files and the session.
///
/// The file list is borrowed immutably; steps cannot add, remove or reorder
/// scan inputs.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    files: &'a [PathBuf],
    session: &'a ScanSession,
}
impl<'a> ScanContext<'a> {
    pub fn new(files: &'a [PathBuf], session: &'a ScanSession) -> Self {
        Self { files, session }
    }

    pub fn files(&self) -> &'a [PathBuf] {
        self.files
    }

    pub fn session(&self) -> &'a ScanSession {
        self.session
    }
}
