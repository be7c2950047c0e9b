//! Logging capability consumed by the transformation engine.
//!
//! Every call shape of the contract reduces to one [`LogEvent`]: a category,
//! optional verbosity, optional location, optional captured error, and a
//! message template with its arguments. Implementors only provide
//! [`TransformLogger::log`]; the convenience methods build the event.
//!
//! Templates use positional placeholders (`"Set {0} on {1}"`) and are never
//! formatted by the engine. Formatting is left to whoever renders the event.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// What kind of logging call produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageCategory {
    Message,
    Warning,
    Error,
    /// An error captured as an error value. Disjoint from `Error`.
    Exception,
    /// Start or end of a logical group of events.
    Section,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Message => "Message",
            MessageCategory::Warning => "Warning",
            MessageCategory::Error => "Error",
            MessageCategory::Exception => "Exception",
            MessageCategory::Section => "Section",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity marker attached to messages and sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageVerbosity {
    Normal,
    Verbose,
}

impl MessageVerbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageVerbosity::Normal => "Normal",
            MessageVerbosity::Verbose => "Verbose",
        }
    }
}

impl fmt::Display for MessageVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value interpolated into a message template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageArg {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for MessageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageArg::Text(value) => f.write_str(value),
            MessageArg::Integer(value) => write!(f, "{value}"),
            MessageArg::Unsigned(value) => write!(f, "{value}"),
            MessageArg::Float(value) => write!(f, "{value}"),
            MessageArg::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for MessageArg {
    fn from(value: &str) -> Self {
        MessageArg::Text(value.to_string())
    }
}

impl From<String> for MessageArg {
    fn from(value: String) -> Self {
        MessageArg::Text(value)
    }
}

impl From<&String> for MessageArg {
    fn from(value: &String) -> Self {
        MessageArg::Text(value.clone())
    }
}

impl From<i32> for MessageArg {
    fn from(value: i32) -> Self {
        MessageArg::Integer(i64::from(value))
    }
}

impl From<i64> for MessageArg {
    fn from(value: i64) -> Self {
        MessageArg::Integer(value)
    }
}

impl From<u32> for MessageArg {
    fn from(value: u32) -> Self {
        MessageArg::Unsigned(u64::from(value))
    }
}

impl From<usize> for MessageArg {
    fn from(value: usize) -> Self {
        MessageArg::Unsigned(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<f64> for MessageArg {
    fn from(value: f64) -> Self {
        MessageArg::Float(value)
    }
}

impl From<bool> for MessageArg {
    fn from(value: bool) -> Self {
        MessageArg::Bool(value)
    }
}

/// A shared handle to an error value recorded by an exception-logging call.
#[derive(Clone)]
pub struct CapturedError(Arc<dyn Error + Send + Sync + 'static>);

impl CapturedError {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    pub fn from_boxed(error: Box<dyn Error + Send + Sync + 'static>) -> Self {
        Self(Arc::from(error))
    }

    pub fn get(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// The error followed by each of its sources, joined with `": "`.
    pub fn detail(&self) -> String {
        let mut detail = self.0.to_string();
        let mut source = self.0.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

impl fmt::Debug for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapturedError").field(&self.detail()).finish()
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One logging call, with every optional field of the contract.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub category: MessageCategory,
    pub verbosity: Option<MessageVerbosity>,
    pub file: Option<String>,
    pub line_number: Option<u32>,
    pub line_position: Option<u32>,
    pub error: Option<CapturedError>,
    pub message: String,
    pub args: Vec<MessageArg>,
}

impl LogEvent {
    pub fn new(category: MessageCategory, message: impl Into<String>, args: &[MessageArg]) -> Self {
        Self {
            category,
            verbosity: None,
            file: None,
            line_number: None,
            line_position: None,
            error: None,
            message: message.into(),
            args: args.to_vec(),
        }
    }

    /// An exception event carries the error and no message.
    pub fn exception(error: CapturedError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(MessageCategory::Exception, "", &[])
        }
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: MessageVerbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    #[must_use]
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn at(mut self, line_number: u32, line_position: u32) -> Self {
        self.line_number = Some(line_number);
        self.line_position = Some(line_position);
        self
    }
}

/// Receives the engine's log events.
pub trait TransformLogger {
    /// Records one event.
    fn log(&mut self, event: LogEvent);

    fn log_message(&mut self, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Message, message, args));
    }

    fn log_message_with(&mut self, verbosity: MessageVerbosity, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Message, message, args).with_verbosity(verbosity));
    }

    fn log_warning(&mut self, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Warning, message, args));
    }

    fn log_warning_in(&mut self, file: &str, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Warning, message, args).in_file(file));
    }

    fn log_warning_at(
        &mut self,
        file: &str,
        line_number: u32,
        line_position: u32,
        message: &str,
        args: &[MessageArg],
    ) {
        self.log(
            LogEvent::new(MessageCategory::Warning, message, args)
                .in_file(file)
                .at(line_number, line_position),
        );
    }

    fn log_error(&mut self, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Error, message, args));
    }

    fn log_error_in(&mut self, file: &str, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Error, message, args).in_file(file));
    }

    fn log_error_at(
        &mut self,
        file: &str,
        line_number: u32,
        line_position: u32,
        message: &str,
        args: &[MessageArg],
    ) {
        self.log(
            LogEvent::new(MessageCategory::Error, message, args)
                .in_file(file)
                .at(line_number, line_position),
        );
    }

    fn log_exception(&mut self, error: CapturedError) {
        self.log(LogEvent::exception(error));
    }

    fn log_exception_in(&mut self, error: CapturedError, file: &str) {
        self.log(LogEvent::exception(error).in_file(file));
    }

    fn log_exception_at(
        &mut self,
        error: CapturedError,
        file: &str,
        line_number: u32,
        line_position: u32,
    ) {
        self.log(
            LogEvent::exception(error)
                .in_file(file)
                .at(line_number, line_position),
        );
    }

    fn start_section(&mut self, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Section, message, args));
    }

    fn start_section_with(&mut self, verbosity: MessageVerbosity, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Section, message, args).with_verbosity(verbosity));
    }

    fn end_section(&mut self, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Section, message, args));
    }

    fn end_section_with(&mut self, verbosity: MessageVerbosity, message: &str, args: &[MessageArg]) {
        self.log(LogEvent::new(MessageCategory::Section, message, args).with_verbosity(verbosity));
    }
}

impl<L: TransformLogger + ?Sized> TransformLogger for &mut L {
    fn log(&mut self, event: LogEvent) {
        (**self).log(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<LogEvent>);

    impl TransformLogger for Recorder {
        fn log(&mut self, event: LogEvent) {
            self.0.push(event);
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_convenience_methods_fill_event_fields() {
        let mut recorder = Recorder::default();
        recorder.log_warning_at("web.config", 3, 7, "Missing {0}", &["key".into()]);
        let event = &recorder.0[0];
        assert_eq!(event.category, MessageCategory::Warning);
        assert_eq!(event.file.as_deref(), Some("web.config"));
        assert_eq!(event.line_number, Some(3));
        assert_eq!(event.line_position, Some(7));
        assert_eq!(event.message, "Missing {0}");
        assert_eq!(event.args, vec![MessageArg::Text("key".to_string())]);
    }

    #[test]
    fn test_exception_event_has_no_message() {
        let mut recorder = Recorder::default();
        recorder.log_exception(CapturedError::new(std::io::Error::other("boom")));
        let event = &recorder.0[0];
        assert_eq!(event.category, MessageCategory::Exception);
        assert!(event.message.is_empty());
        assert!(event.error.is_some());
    }

    #[test]
    fn test_captured_error_detail_includes_sources() {
        let error = CapturedError::new(Outer(std::io::Error::other("inner")));
        assert_eq!(error.detail(), "outer: inner");
        assert_eq!(error.to_string(), "outer");
    }

    #[test]
    fn test_message_arg_display() {
        assert_eq!(MessageArg::from("a").to_string(), "a");
        assert_eq!(MessageArg::from(-2).to_string(), "-2");
        assert_eq!(MessageArg::from(2.5).to_string(), "2.5");
        assert_eq!(MessageArg::from(true).to_string(), "true");
    }
}
