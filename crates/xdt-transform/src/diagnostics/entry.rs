//! One recorded logging call.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use serde::{Serialize, Serializer};
use xdt_engine::{CapturedError, LogEvent, MessageArg, MessageCategory, MessageVerbosity};

use super::format::{FormatError, interpolate};

/// `strftime` pattern used for the timestamp of a rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat(Cow<'static, str>);

impl TimestampFormat {
    /// Day-first British format, `02/01/2000 03:04:05`.
    pub const EN_GB: TimestampFormat = TimestampFormat(Cow::Borrowed("%d/%m/%Y %H:%M:%S"));

    /// `2000-01-02T03:04:05`.
    pub const ISO_8601: TimestampFormat = TimestampFormat(Cow::Borrowed("%Y-%m-%dT%H:%M:%S"));

    /// Validates a custom `strftime` pattern.
    pub fn custom(pattern: impl Into<String>) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::InvalidTimestampFormat { pattern });
        }
        Ok(Self(Cow::Owned(pattern)))
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self::EN_GB
    }
}

impl FromStr for TimestampFormat {
    type Err = FormatError;

    /// Accepts `en-gb`, `iso8601`, or a `strftime` pattern.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "en-gb" => Ok(Self::EN_GB),
            "iso8601" | "iso-8601" => Ok(Self::ISO_8601),
            _ => Self::custom(value),
        }
    }
}

/// An immutable record of one logging call.
///
/// The message template is stored with its arguments and only formatted
/// when the entry is rendered.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<MessageCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbosity: Option<MessageVerbosity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_position: Option<u32>,
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    error: Option<CapturedError>,
    message: String,
    args: Vec<MessageArg>,
}

impl DiagnosticsEntry {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            category: None,
            verbosity: None,
            file: None,
            line_number: None,
            line_position: None,
            error: None,
            message: String::new(),
            args: Vec::new(),
        }
    }

    /// Captures every field of `event`.
    pub fn from_event(event: LogEvent, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            category: Some(event.category),
            verbosity: event.verbosity,
            file: event.file,
            line_number: event.line_number,
            line_position: event.line_position,
            error: event.error,
            message: event.message,
            args: event.args,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: MessageCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: MessageVerbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, line_number: u32, line_position: u32) -> Self {
        self.line_number = Some(line_number);
        self.line_position = Some(line_position);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: CapturedError) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>, args: Vec<MessageArg>) -> Self {
        self.message = message.into();
        self.args = args;
        self
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn category(&self) -> Option<MessageCategory> {
        self.category
    }

    pub fn verbosity(&self) -> Option<MessageVerbosity> {
        self.verbosity
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    pub fn line_position(&self) -> Option<u32> {
        self.line_position
    }

    pub fn error(&self) -> Option<&CapturedError> {
        self.error.as_ref()
    }

    /// The unformatted template.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn args(&self) -> &[MessageArg] {
        &self.args
    }

    /// The template with its arguments substituted.
    pub fn formatted_message(&self) -> Result<String, FormatError> {
        interpolate(&self.message, &self.args)
    }

    /// Formats the message on display, falling back to the raw template.
    pub fn message_display(&self) -> impl fmt::Display + '_ {
        MessageDisplay(self)
    }

    /// Renders the canonical line:
    ///
    /// `[timestamp] [MessageType:..] [MessageVerbosityType:..] [File:..] [LineNumber:..] [LinePosition:..] Exception: .. message`
    ///
    /// Absent fields are omitted along with their trailing space.
    pub fn render(&self, format: &TimestampFormat) -> Result<String, FormatError> {
        let mut line = self.prefix(format);
        line.push_str(&self.formatted_message()?);
        Ok(line)
    }

    fn prefix(&self, format: &TimestampFormat) -> String {
        let mut line = format!("[{}] ", self.timestamp.format(format.pattern()));
        if let Some(category) = self.category {
            line.push_str(&format!("[MessageType:{category}] "));
        }
        if let Some(verbosity) = self.verbosity {
            line.push_str(&format!("[MessageVerbosityType:{verbosity}] "));
        }
        if let Some(file) = &self.file {
            line.push_str(&format!("[File:{file}] "));
        }
        if let Some(line_number) = self.line_number {
            line.push_str(&format!("[LineNumber:{line_number}] "));
        }
        if let Some(line_position) = self.line_position {
            line.push_str(&format!("[LinePosition:{line_position}] "));
        }
        if let Some(error) = &self.error {
            line.push_str(&format!("Exception: {} ", error.detail()));
        }
        line
    }
}

impl fmt::Display for DiagnosticsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.prefix(&TimestampFormat::default()),
            self.message_display()
        )
    }
}

struct MessageDisplay<'a>(&'a DiagnosticsEntry);

impl fmt::Display for MessageDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.formatted_message() {
            Ok(message) => f.write_str(&message),
            Err(_) => f.write_str(&self.0.message),
        }
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&timestamp.format("%Y-%m-%dT%H:%M:%S%.f"))
}

fn serialize_error<S: Serializer>(
    error: &Option<CapturedError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.detail()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_timestamp_only_entry() {
        let entry = DiagnosticsEntry::new(timestamp());
        assert_eq!(entry.to_string(), "[02/01/2000 03:04:05] ");
    }

    #[test]
    fn test_full_entry_rendering() {
        let entry = DiagnosticsEntry::new(timestamp())
            .with_category(MessageCategory::Warning)
            .with_verbosity(MessageVerbosity::Verbose)
            .with_file("File")
            .with_position(30, 40)
            .with_message("Message {0} {1}", vec!["1".into(), 2.into()]);
        assert_eq!(
            entry.to_string(),
            "[02/01/2000 03:04:05] [MessageType:Warning] [MessageVerbosityType:Verbose] [File:File] [LineNumber:30] [LinePosition:40] Message 1 2"
        );
    }

    #[test]
    fn test_exception_segment() {
        let entry = DiagnosticsEntry::new(timestamp())
            .with_category(MessageCategory::Exception)
            .with_error(CapturedError::new(std::io::Error::other("boom")));
        assert_eq!(
            entry.to_string(),
            "[02/01/2000 03:04:05] [MessageType:Exception] Exception: boom "
        );
    }

    #[test]
    fn test_render_with_other_formats() {
        let entry = DiagnosticsEntry::new(timestamp()).with_message("done", Vec::new());
        assert_eq!(
            entry.render(&TimestampFormat::ISO_8601).unwrap(),
            "[2000-01-02T03:04:05] done"
        );
        let custom = TimestampFormat::custom("%H:%M").unwrap();
        assert_eq!(entry.render(&custom).unwrap(), "[03:04] done");
    }

    #[test]
    fn test_render_reports_format_error_and_display_falls_back() {
        let entry = DiagnosticsEntry::new(timestamp()).with_message("value {3}", vec!["a".into()]);
        assert!(entry.render(&TimestampFormat::EN_GB).is_err());
        assert_eq!(entry.to_string(), "[02/01/2000 03:04:05] value {3}");
    }

    #[test]
    fn test_invalid_timestamp_format_is_rejected() {
        assert!(TimestampFormat::custom("%Q").is_err());
        assert_eq!("en-GB".parse::<TimestampFormat>().unwrap(), TimestampFormat::EN_GB);
        assert_eq!(
            "iso8601".parse::<TimestampFormat>().unwrap(),
            TimestampFormat::ISO_8601
        );
    }

    #[test]
    fn test_entry_serializes_to_json() {
        let entry = DiagnosticsEntry::new(timestamp())
            .with_category(MessageCategory::Message)
            .with_message("Message {0}", vec![7.into()]);
        insta::assert_json_snapshot!(entry, @r#"
        {
          "timestamp": "2000-01-02T03:04:05",
          "category": "Message",
          "message": "Message {0}",
          "args": [
            7
          ]
        }
        "#);
    }
}
