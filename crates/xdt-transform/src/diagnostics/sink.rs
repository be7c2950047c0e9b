//! A logger that records every call instead of emitting it.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, trace, warn};
use xdt_engine::{CapturedError, LogEvent, MessageCategory, MessageVerbosity, TransformLogger};

use super::entry::{DiagnosticsEntry, TimestampFormat};
use super::format::FormatError;

/// Collects log events as [`DiagnosticsEntry`] values, in call order.
///
/// The `has_*` flags are set by the first entry of the matching category and
/// never cleared. Messages and sections set no flag, and exceptions only set
/// `has_exception`.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSink {
    entries: Vec<DiagnosticsEntry>,
    has_error: bool,
    has_exception: bool,
    has_warning: bool,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn has_exception(&self) -> bool {
        self.has_exception
    }

    pub fn has_warning(&self) -> bool {
        self.has_warning
    }

    pub fn entries(&self) -> &[DiagnosticsEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiagnosticsEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in `category`.
    pub fn count(&self, category: MessageCategory) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.category() == Some(category))
            .count()
    }

    pub fn into_entries(self) -> Vec<DiagnosticsEntry> {
        self.entries
    }

    /// Renders every entry, stopping at the first template that fails to format.
    pub fn render_all(&self, format: &TimestampFormat) -> Result<Vec<String>, FormatError> {
        self.entries.iter().map(|entry| entry.render(format)).collect()
    }

    /// Records `event` with an explicit capture time.
    pub fn log_at(&mut self, event: LogEvent, timestamp: NaiveDateTime) {
        match event.category {
            MessageCategory::Error => self.has_error = true,
            MessageCategory::Exception => self.has_exception = true,
            MessageCategory::Warning => self.has_warning = true,
            MessageCategory::Message | MessageCategory::Section => {}
        }
        let entry = DiagnosticsEntry::from_event(event, timestamp);
        trace_entry(&entry);
        self.entries.push(entry);
    }
}

impl TransformLogger for DiagnosticsSink {
    fn log(&mut self, event: LogEvent) {
        self.log_at(event, Local::now().naive_local());
    }
}

impl<'a> IntoIterator for &'a DiagnosticsSink {
    type Item = &'a DiagnosticsEntry;
    type IntoIter = std::slice::Iter<'a, DiagnosticsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn trace_entry(entry: &DiagnosticsEntry) {
    let message = entry.message_display();
    let file = entry.file().unwrap_or_default();
    let line = entry.line_number();
    match (entry.category(), entry.verbosity()) {
        (Some(MessageCategory::Error), _) => {
            error!(target: "xdt_transform::diagnostics", file, line, "{message}");
        }
        (Some(MessageCategory::Exception), _) => {
            let detail = entry.error().map(CapturedError::detail).unwrap_or_default();
            error!(target: "xdt_transform::diagnostics", file, line, error = %detail, "exception");
        }
        (Some(MessageCategory::Warning), _) => {
            warn!(target: "xdt_transform::diagnostics", file, line, "{message}");
        }
        (_, Some(MessageVerbosity::Verbose)) => {
            trace!(target: "xdt_transform::diagnostics", "{message}");
        }
        _ => {
            debug!(target: "xdt_transform::diagnostics", "{message}");
        }
    }
}
