//! Recording and rendering of transform log events.
//!
//! - [`DiagnosticsSink`] is the default logger: it keeps every event
//! - [`DiagnosticsEntry`] is one recorded event, rendered on demand
//! - [`interpolate`] fills `{0}`-style templates

mod entry;
mod format;
mod sink;

pub use entry::{DiagnosticsEntry, TimestampFormat};
pub use format::{FormatError, interpolate};
pub use sink::DiagnosticsSink;
