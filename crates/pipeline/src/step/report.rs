use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Per-run bookkeeping of a step. Reset by setup and cleanup.
///
/// The vectors keep report order; the sets answer membership. A path moved
/// from valid to invalid stays in `valid` until [`finish`](Self::finish)
/// compacts it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct StepState {
    pub(crate) valid: Vec<PathBuf>,
    pub(crate) invalid: Vec<PathBuf>,
    valid_set: HashSet<PathBuf>,
    invalid_set: HashSet<PathBuf>,
    pub(crate) errors: usize,
    pub(crate) aborted: bool,
    pub(crate) fatal: bool,
    pub(crate) reason: Option<String>,
}
impl StepState {
    /// Drop paths that were later reported invalid from `valid`.
    pub(crate) fn finish(&mut self) {
        if self.valid.len() != self.valid_set.len() {
            let valid_set = &self.valid_set;
            self.valid.retain(|f| valid_set.contains(f));
        }
    }
}

/// Handle through which step implementations record verdicts.
///
/// A path is in at most one outcome set. Within one run an invalid verdict
/// sticks: reporting a path valid after it was reported invalid is ignored,
/// while reporting it invalid after valid moves it.
pub struct Report<'a> {
    step: &'a str,
    state: &'a mut StepState,
}
impl<'a> Report<'a> {
    pub(crate) fn new(step: &'a str, state: &'a mut StepState) -> Self {
        Self { step, state }
    }

    /// Name of the step this report belongs to.
    pub fn step(&self) -> &str {
        self.step
    }

    /// Mark `file` as having passed this step.
    pub fn valid(&mut self, file: impl AsRef<Path>, message: impl AsRef<str>) {
        let file = file.as_ref();
        tracing::debug!(step = self.step, path = %file.display(), message = message.as_ref(), "File valid");
        if self.state.invalid_set.contains(file) {
            tracing::debug!(step = self.step, path = %file.display(), "Already reported invalid in this run; ignoring");
            return;
        }
        if self.state.valid_set.insert(file.to_path_buf()) {
            self.state.valid.push(file.to_path_buf());
        }
    }

    /// Mark `file` as having failed this step. Counts towards the step's
    /// failure total on every call.
    pub fn invalid(&mut self, file: impl AsRef<Path>, message: impl AsRef<str>) {
        let file = file.as_ref();
        tracing::warn!(step = self.step, path = %file.display(), message = message.as_ref(), "File invalid");
        self.state.errors += 1;
        self.state.valid_set.remove(file);
        if self.state.invalid_set.insert(file.to_path_buf()) {
            self.state.invalid.push(file.to_path_buf());
        }
    }

    /// Record a failure that is not tied to any single file.
    pub fn failure(&mut self, message: impl AsRef<str>) {
        tracing::warn!(step = self.step, message = message.as_ref(), "Step failure");
        self.state.errors += 1;
    }

    /// Stop processing further files in this step. Later steps still run.
    pub fn abort(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(step = self.step, reason = %reason, "Step aborted");
        self.state.aborted = true;
        self.state.reason.get_or_insert(reason);
    }

    /// Stop this step and every step after it.
    pub fn fatal(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(step = self.step, reason = %reason, "Fatal error; halting pipeline");
        self.state.aborted = true;
        self.state.fatal = true;
        self.state.reason = Some(reason);
    }

    /// Whether the step should stop looking at further files.
    pub fn is_halted(&self) -> bool {
        self.state.aborted || self.state.fatal
    }

    pub fn errors(&self) -> usize {
        self.state.errors
    }
}
