//! Verification steps.
//!
//! A [`Step`] is one independently enable-able check in the pipeline. Its
//! behaviour comes in one of two shapes:
//!
//! - **Generic**: a [`Verify`] implementation sees the whole file list and
//!   decides itself which files to report on.
//! - **Filtered**: a [`FilteredStep`] hands only files with a relevant
//!   extension to a [`CheckFile`] implementation, one file at a time.
//!
//! Either way the step owns the per-run bookkeeping (valid and invalid
//! files, failure count, abort/fatal flags) and walks through the same
//! lifecycle every scan:
//!
//! ```text
//! Idle -> setup() -> Ready -> run() -> Finished -> summary() -> Summarized
//!   ^                                                               |
//!   +------------------------- cleanup() (from any phase) ----------+
//! ```

mod filtered;
mod report;

pub use self::filtered::{CheckFile, FilteredStep};
pub use self::report::Report;

use crate::code::ResponseCode;
use crate::error::{ErrorKind, Result};
use crate::session::ScanContext;
use crate::step::report::StepState;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Whole-list verification logic of a generic step.
///
/// Implementations should stop iterating once [`Report::is_halted`] returns
/// `true`. Closures of the shape `FnMut(&ScanContext, &mut Report)`
/// implement this trait.
pub trait Verify: Send {
    fn verify(&mut self, context: &ScanContext<'_>, report: &mut Report<'_>);

    /// Called when the owning step is set up for a scan.
    fn setup(&mut self) {}

    /// Called when the owning step is cleaned up after a scan.
    fn cleanup(&mut self) {}
}
impl<F> Verify for F
where
    F: FnMut(&ScanContext<'_>, &mut Report<'_>) + Send,
{
    fn verify(&mut self, context: &ScanContext<'_>, report: &mut Report<'_>) {
        self(context, report)
    }
}

enum StepKind {
    Generic(Box<dyn Verify>),
    Filtered(FilteredStep),
}

/// Where a step is in its per-scan lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Ready,
    Running,
    Finished,
    Summarized,
}
impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Finished => "finished",
            Phase::Summarized => "summarized",
        }
    }
}

/// Outcome of one step run, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub step: String,
    /// `Ok` when nothing failed, otherwise the step's error class.
    pub code: ResponseCode,
    pub errors: usize,
    pub aborted: bool,
    pub fatal: bool,
    pub reason: Option<String>,
}
impl Display for StepSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Step {} ended with result code: {}", self.step, self.code)?;
        if self.aborted {
            match &self.reason {
                Some(reason) => write!(f, "\nStep was aborted: {reason}"),
                None => write!(f, "\nStep was aborted"),
            }
        } else if self.errors > 0 {
            write!(f, "\n{} errors encountered", self.errors)
        } else {
            Ok(())
        }
    }
}

/// One verification check in a [`Pipeline`](crate::Pipeline).
///
/// Steps are long-lived: they are configured once and then set up, run,
/// summarized and cleaned up again for every scan.
pub struct Step {
    name: String,
    enabled: bool,
    error_class: ResponseCode,
    format_specific: bool,
    kind: StepKind,
    phase: Phase,
    state: StepState,
}
impl Step {
    /// A generic step driven by a [`Verify`] implementation.
    pub fn new(name: impl Into<String>, verify: impl Verify + 'static) -> Self {
        Self::with_kind(name.into(), StepKind::Generic(Box::new(verify)))
    }

    /// A generic step driven by a closure.
    pub fn from_fn(
        name: impl Into<String>,
        verify: impl FnMut(&ScanContext<'_>, &mut Report<'_>) + Send + 'static,
    ) -> Self {
        Self::new(name, verify)
    }

    /// An extension-filtered step driven by a [`CheckFile`] implementation.
    pub fn filtered(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = impl AsRef<str>>,
        check: impl CheckFile + 'static,
    ) -> Self {
        Self::with_kind(name.into(), StepKind::Filtered(FilteredStep::new(extensions, check)))
    }

    /// An extension-filtered step driven by a closure.
    pub fn filtered_fn(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = impl AsRef<str>>,
        check: impl FnMut(&Path, &mut Report<'_>) + Send + 'static,
    ) -> Self {
        Self::filtered(name, extensions, check)
    }

    fn with_kind(name: String, kind: StepKind) -> Self {
        Self {
            name,
            enabled: true,
            error_class: ResponseCode::Generic,
            format_specific: false,
            kind,
            phase: Phase::Idle,
            state: StepState::default(),
        }
    }

    /// Code reported for this step (and assigned to its invalid files) when
    /// anything fails. Defaults to [`ResponseCode::Generic`].
    pub fn with_error_class(mut self, code: ResponseCode) -> Self {
        self.error_class = code;
        self
    }

    /// Only run this step when the scan enables format-specific validation.
    pub fn with_format_specific(mut self, format_specific: bool) -> Self {
        self.format_specific = format_specific;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_class(&self) -> ResponseCode {
        self.error_class
    }

    pub fn is_format_specific(&self) -> bool {
        self.format_specific
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.kind, StepKind::Filtered(_))
    }

    pub fn enable(&mut self) {
        tracing::debug!(step = %self.name, "Step enabled");
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        tracing::debug!(step = %self.name, "Step disabled");
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reset per-run state and prepare for [`run`](Self::run).
    pub fn setup(&mut self) {
        tracing::debug!(step = %self.name, "Setting up step");
        self.state = StepState::default();
        match &mut self.kind {
            StepKind::Generic(verify) => verify.setup(),
            StepKind::Filtered(filtered) => filtered.setup(),
        }
        self.phase = Phase::Ready;
    }

    /// Classify the files of `context`. Only valid straight after
    /// [`setup`](Self::setup).
    ///
    /// Verdicts, aborts and fatal conditions are recorded on the step, never
    /// returned as errors; the only error is calling this out of order.
    pub fn run(&mut self, context: &ScanContext<'_>) -> Result<()> {
        self.expect_phase("run", &[Phase::Ready])?;
        self.phase = Phase::Running;
        tracing::debug!(step = %self.name, files = context.files().len(), "Running step");
        let mut report = Report::new(&self.name, &mut self.state);
        match &mut self.kind {
            StepKind::Generic(verify) => verify.verify(context, &mut report),
            StepKind::Filtered(filtered) => filtered.run(context, &mut report),
        }
        self.state.finish();
        self.phase = Phase::Finished;
        Ok(())
    }

    /// Result of the last run: `Ok` if nothing failed, otherwise this step's
    /// error class. Abort status annotates the summary without changing the
    /// code.
    pub fn summary(&mut self) -> Result<StepSummary> {
        self.expect_phase("summarize", &[Phase::Finished, Phase::Summarized])?;
        let summary = StepSummary {
            step: self.name.clone(),
            code: match self.state.errors {
                0 => ResponseCode::Ok,
                _ => self.error_class,
            },
            errors: self.state.errors,
            aborted: self.state.aborted,
            fatal: self.state.fatal,
            reason: self.state.reason.clone(),
        };
        tracing::info!(step = %self.name, code = %summary.code, errors = summary.errors, "{summary}");
        self.phase = Phase::Summarized;
        Ok(summary)
    }

    /// Return to [`Phase::Idle`] with all per-run state cleared. Valid from
    /// any phase and idempotent.
    pub fn cleanup(&mut self) {
        tracing::debug!(step = %self.name, "Cleaning up step");
        self.state = StepState::default();
        match &mut self.kind {
            StepKind::Generic(verify) => verify.cleanup(),
            StepKind::Filtered(filtered) => filtered.cleanup(),
        }
        self.phase = Phase::Idle;
    }

    pub fn valid_files(&self) -> &[PathBuf] {
        &self.state.valid
    }

    pub fn invalid_files(&self) -> &[PathBuf] {
        &self.state.invalid
    }

    /// Failures counted during the last run.
    pub fn errors(&self) -> usize {
        self.state.errors
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted
    }

    pub fn is_fatal(&self) -> bool {
        self.state.fatal
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.state.reason.as_deref()
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if !allowed.contains(&self.phase) {
            exn::bail!(ErrorKind::Lifecycle {
                step: self.name.clone(),
                operation,
                phase: self.phase.as_str(),
            });
        }
        Ok(())
    }
}
impl Debug for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("error_class", &self.error_class)
            .field("format_specific", &self.format_specific)
            .field("filtered", &self.is_filtered())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
