use crate::error::Result;
use crate::input::InputSet;
use crate::result::ScanResult;
use crate::session::{ScanContext, ScanSession};
use crate::step::Step;
use std::path::PathBuf;
use tracing::instrument;
use verifile_config::Config;

/// Ordered chain of verification steps.
///
/// Steps always run in the order they were added, one after another. The
/// same pipeline can serve any number of scans; every step is set up before
/// and cleaned up after its run.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}
impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.name() == name)
    }

    pub fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|step| step.name() == name)
    }

    /// Returns `false` if no step is called `name`.
    pub fn enable(&mut self, name: &str) -> bool {
        self.step_mut(name).map(Step::enable).is_some()
    }

    /// Returns `false` if no step is called `name`.
    pub fn disable(&mut self, name: &str) -> bool {
        self.step_mut(name).map(Step::disable).is_some()
    }

    /// Apply the per-step toggles of `config`.
    pub fn configure(&mut self, config: &Config) {
        for (name, step_config) in &config.steps {
            match self.step_mut(name) {
                Some(step) if step_config.enabled => step.enable(),
                Some(step) => step.disable(),
                None => tracing::warn!(step = %name, "Configuration names an unknown step; ignoring"),
            }
        }
    }

    /// Resolve the session's target and run every enabled step over it.
    ///
    /// Resolution failures are returned before any step runs. The input set
    /// is cleaned up on every path once resolution has succeeded.
    #[instrument(skip_all, fields(target = tracing::field::Empty, files = tracing::field::Empty))]
    pub fn scan(&mut self, session: &ScanSession) -> Result<ScanResult> {
        let mut input = InputSet::resolve_session(session)?;
        tracing::Span::current().record("target", tracing::field::display(input.target().display()));
        tracing::Span::current().record("files", input.len());
        let result = self.run(input.files(), session);
        if let Err(e) = input.cleanup() {
            tracing::warn!(error = %e, "Failed to clean up scan input");
        }
        result
    }

    /// Run every enabled step over an already resolved file list.
    pub fn run(&mut self, files: &[PathBuf], session: &ScanSession) -> Result<ScanResult> {
        let context = ScanContext::new(files, session);
        let mut result = ScanResult::new();
        for step in &mut self.steps {
            if !step.is_enabled() {
                tracing::debug!(step = %step.name(), "Step disabled; skipping");
                continue;
            }
            if step.is_format_specific() && !session.format_specific() {
                tracing::debug!(step = %step.name(), "Format-specific validation disabled; skipping");
                continue;
            }
            let outcome = run_step(step, &context, &mut result);
            step.cleanup();
            if outcome? {
                tracing::error!(step = %step.name(), "Halting pipeline; remaining steps will not run");
                break;
            }
        }
        let code = result.finalize();
        tracing::info!(code = %code, steps = result.steps_executed().len(), "Scan finished");
        Ok(result)
    }
}

/// Returns whether the step asked for the pipeline to halt.
fn run_step(step: &mut Step, context: &ScanContext<'_>, result: &mut ScanResult) -> Result<bool> {
    step.setup();
    result.record_step(step.name());
    step.run(context)?;
    let summary = step.summary()?;
    result.mark_valid(step.valid_files());
    result.mark_invalid(step.invalid_files(), step.error_class());
    result.record_summary(summary);
    if step.is_fatal() {
        result.halt(step.name());
        return Ok(true);
    }
    Ok(false)
}
