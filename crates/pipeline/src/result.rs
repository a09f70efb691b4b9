use crate::code::ResponseCode;
use crate::step::StepSummary;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use verifile_config::Verbosity;

/// The scan-wide aggregate of every executed step's verdicts.
///
/// Per file, the most recent verdict wins: a later step may re-validate a
/// file an earlier step rejected, or reject one it accepted. A path is never
/// both valid and invalid. The scan-wide [`code`](Self::code) instead
/// privileges severity and multiplicity, see [`finalize`](Self::finalize).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    code: ResponseCode,
    valid: BTreeSet<PathBuf>,
    invalid: BTreeMap<PathBuf, ResponseCode>,
    steps_executed: Vec<String>,
    summaries: Vec<StepSummary>,
    failures: Vec<ResponseCode>,
    halted_by: Option<String>,
}
impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` to the executed-steps log.
    pub fn record_step(&mut self, name: impl Into<String>) {
        self.steps_executed.push(name.into());
    }

    pub fn mark_valid(&mut self, paths: impl IntoIterator<Item = impl AsRef<Path>>) {
        for path in paths {
            let path = path.as_ref();
            self.invalid.remove(path);
            self.valid.insert(path.to_path_buf());
        }
    }

    pub fn mark_invalid(&mut self, paths: impl IntoIterator<Item = impl AsRef<Path>>, class: ResponseCode) {
        for path in paths {
            let path = path.as_ref();
            self.valid.remove(path);
            self.invalid.insert(path.to_path_buf(), class);
        }
    }

    /// The current scan-wide code; `Ok` until something sets it.
    pub fn code(&self) -> ResponseCode {
        self.code
    }

    pub fn set_code(&mut self, code: ResponseCode) {
        self.code = code;
    }

    /// Replace the code if `code` is at least as severe as the current one.
    pub fn raise(&mut self, code: ResponseCode) {
        if code.severity() >= self.code.severity() {
            self.code = code;
        }
    }

    /// Keep a step's summary and, if the step failed, remember its code.
    pub fn record_summary(&mut self, summary: StepSummary) {
        if !summary.code.is_ok() {
            self.raise(summary.code);
            if !self.failures.contains(&summary.code) {
                self.failures.push(summary.code);
            }
        }
        self.summaries.push(summary);
    }

    /// Note that `step` stopped the pipeline.
    pub fn halt(&mut self, step: impl Into<String>) {
        self.halted_by = Some(step.into());
    }

    /// Settle the scan-wide code once no more steps will run.
    ///
    /// A fatal halt yields [`ResponseCode::Fatal`]. Otherwise more than one
    /// distinct failing step code yields [`ResponseCode::Multiple`], exactly
    /// one yields that code, and none leaves the code as it is.
    pub fn finalize(&mut self) -> ResponseCode {
        if self.halted_by.is_some() {
            self.set_code(ResponseCode::Fatal);
        } else {
            match self.failures.as_slice() {
                [] => {},
                [single] => self.set_code(*single),
                _ => self.set_code(ResponseCode::Multiple),
            }
        }
        self.code
    }

    pub fn valid_files(&self) -> &BTreeSet<PathBuf> {
        &self.valid
    }

    pub fn invalid_files(&self) -> &BTreeMap<PathBuf, ResponseCode> {
        &self.invalid
    }

    pub fn is_valid(&self, path: impl AsRef<Path>) -> bool {
        self.valid.contains(path.as_ref())
    }

    /// The class assigned by the last step that rejected `path`, if it is
    /// currently invalid.
    pub fn error_class(&self, path: impl AsRef<Path>) -> Option<ResponseCode> {
        self.invalid.get(path.as_ref()).copied()
    }

    pub fn steps_executed(&self) -> &[String] {
        &self.steps_executed
    }

    pub fn summaries(&self) -> &[StepSummary] {
        &self.summaries
    }

    /// Distinct failing step codes, in the order they were first seen.
    pub fn failures(&self) -> &[ResponseCode] {
        &self.failures
    }

    /// Name of the step whose fatal condition stopped the pipeline.
    pub fn halted_by(&self) -> Option<&str> {
        self.halted_by.as_deref()
    }

    /// Human-readable report at the given verbosity.
    pub fn render(&self, verbosity: Verbosity) -> String {
        let mut out = String::new();
        if !verbosity.shows_summary() {
            return out;
        }
        for summary in &self.summaries {
            let _ = writeln!(out, "{summary}");
        }
        if let Some(step) = &self.halted_by {
            let _ = writeln!(out, "Scan halted by step {step}");
        }
        if verbosity.shows_files() {
            let _ = writeln!(out, "Valid files:");
            for path in &self.valid {
                let _ = writeln!(out, "  {}", path.display());
            }
            let _ = writeln!(out, "Invalid files:");
            for (path, code) in &self.invalid {
                let _ = writeln!(out, "  {}: {code} ({})", path.display(), code.as_str());
            }
        }
        let _ = write!(out, "Scan finished with result code: {}", self.code);
        out
    }
}
