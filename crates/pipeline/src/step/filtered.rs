use crate::session::ScanContext;
use crate::step::report::Report;
use std::collections::HashSet;
use std::path::Path;

/// Per-file verification logic of an extension-filtered step.
///
/// Implementations call [`Report::valid`]/[`Report::invalid`] themselves.
/// Closures of the shape `FnMut(&Path, &mut Report)` implement this trait.
pub trait CheckFile: Send {
    fn check_file(&mut self, path: &Path, report: &mut Report<'_>);

    /// Called when the owning step is set up for a scan.
    fn setup(&mut self) {}

    /// Called when the owning step is cleaned up after a scan.
    fn cleanup(&mut self) {}
}
impl<F> CheckFile for F
where
    F: FnMut(&Path, &mut Report<'_>) + Send,
{
    fn check_file(&mut self, path: &Path, report: &mut Report<'_>) {
        self(path, report)
    }
}

/// Only hands files whose extension is in the relevant set to its check.
///
/// Files with any other extension get no verdict at all from this step.
/// Extensions are stored lowercase with a leading dot (`.exe`); the empty
/// string matches files without an extension.
pub struct FilteredStep {
    extensions: HashSet<String>,
    check: Box<dyn CheckFile>,
}
impl FilteredStep {
    pub fn new(extensions: impl IntoIterator<Item = impl AsRef<str>>, check: impl CheckFile + 'static) -> Self {
        Self {
            extensions: extensions.into_iter().map(|ext| normalize(ext.as_ref())).collect(),
            check: Box::new(check),
        }
    }

    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    /// Whether `path` carries one of the relevant extensions.
    pub fn is_relevant(&self, path: &Path) -> bool {
        self.extensions.contains(&extension_of(path))
    }

    pub(crate) fn setup(&mut self) {
        self.check.setup();
    }

    pub(crate) fn cleanup(&mut self) {
        self.check.cleanup();
    }

    pub(crate) fn run(&mut self, context: &ScanContext<'_>, report: &mut Report<'_>) {
        for file in context.files() {
            if report.is_halted() {
                tracing::debug!(step = report.step(), "Step halted; remaining files not checked");
                break;
            }
            if !self.is_relevant(file) {
                tracing::trace!(step = report.step(), path = %file.display(), "Extension not relevant; skipping");
                continue;
            }
            tracing::debug!(step = report.step(), path = %file.display(), "Verifying integrity");
            self.check.check_file(file, report);
        }
    }
}

fn normalize(extension: &str) -> String {
    let extension = extension.trim().to_lowercase();
    match extension.is_empty() || extension.starts_with('.') {
        true => extension,
        false => format!(".{extension}"),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}
