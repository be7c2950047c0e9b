use std::path::PathBuf;

use xdt_transform::DiagnosticsSink;

/// Outcome of one `apply` run.
#[derive(Debug)]
pub struct ApplyResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub diagnostics: DiagnosticsSink,
    /// Set when the engine reported the transformation as failed.
    pub failure: Option<String>,
}

impl ApplyResult {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}
