//! Integration tests for the diagnostics sink and entry rendering.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::level_filters::LevelFilter;
use xdt_transform::{
    CapturedError, DiagnosticsSink, FormatError, LogEvent, MessageArg, MessageCategory,
    MessageVerbosity, TimestampFormat, TransformLogger,
};

fn args() -> [MessageArg; 2] {
    ["1".into(), 2.into()]
}

fn sample_error() -> CapturedError {
    CapturedError::new(std::io::Error::other("Sample error"))
}

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

/// Every call shape of the logging contract, in order.
fn log_all(sink: &mut DiagnosticsSink) {
    const MESSAGE: &str = "Message {0} {1}";
    sink.log_message(MESSAGE, &args());
    sink.log_message_with(MessageVerbosity::Verbose, MESSAGE, &args());
    sink.log_warning_in("File", MESSAGE, &args());
    sink.log_warning_at("File", 30, 40, MESSAGE, &args());
    sink.log_error(MESSAGE, &args());
    sink.log_error_in("File", MESSAGE, &args());
    sink.log_error_at("File", 30, 40, MESSAGE, &args());
    sink.log_exception(sample_error());
    sink.log_exception_in(sample_error(), "File");
    sink.log_exception_at(sample_error(), "File", 30, 40);
    sink.start_section(MESSAGE, &args());
    sink.start_section_with(MessageVerbosity::Verbose, MESSAGE, &args());
    sink.end_section(MESSAGE, &args());
    sink.end_section_with(MessageVerbosity::Verbose, MESSAGE, &args());
}

#[test]
fn test_every_call_is_recorded_in_order() {
    let mut sink = DiagnosticsSink::new();
    log_all(&mut sink);
    assert_eq!(sink.len(), 14);

    // A literal pattern keeps the lines independent of the capture time.
    let format = TimestampFormat::custom("--").unwrap();
    let lines = sink.render_all(&format).unwrap();
    let expected = [
        "[--] [MessageType:Message] Message 1 2",
        "[--] [MessageType:Message] [MessageVerbosityType:Verbose] Message 1 2",
        "[--] [MessageType:Warning] [File:File] Message 1 2",
        "[--] [MessageType:Warning] [File:File] [LineNumber:30] [LinePosition:40] Message 1 2",
        "[--] [MessageType:Error] Message 1 2",
        "[--] [MessageType:Error] [File:File] Message 1 2",
        "[--] [MessageType:Error] [File:File] [LineNumber:30] [LinePosition:40] Message 1 2",
        "[--] [MessageType:Exception] Exception: Sample error ",
        "[--] [MessageType:Exception] [File:File] Exception: Sample error ",
        "[--] [MessageType:Exception] [File:File] [LineNumber:30] [LinePosition:40] Exception: Sample error ",
        "[--] [MessageType:Section] Message 1 2",
        "[--] [MessageType:Section] [MessageVerbosityType:Verbose] Message 1 2",
        "[--] [MessageType:Section] Message 1 2",
        "[--] [MessageType:Section] [MessageVerbosityType:Verbose] Message 1 2",
    ];
    assert_eq!(lines, expected);
}

#[test]
fn test_flags_flip_at_first_call_of_their_category() {
    let mut sink = DiagnosticsSink::new();
    sink.log_message("a", &[]);
    sink.log_message_with(MessageVerbosity::Verbose, "b", &[]);
    assert!(!sink.has_warning() && !sink.has_error() && !sink.has_exception());

    sink.log_warning_in("File", "c", &[]);
    assert!(sink.has_warning());
    assert!(!sink.has_error() && !sink.has_exception());

    sink.log_error("d", &[]);
    assert!(sink.has_error());
    assert!(!sink.has_exception());

    sink.log_exception(sample_error());
    sink.end_section("e", &[]);
    assert!(sink.has_warning() && sink.has_error() && sink.has_exception());
}

#[test]
fn test_category_counts() {
    let mut sink = DiagnosticsSink::new();
    log_all(&mut sink);
    assert_eq!(sink.count(MessageCategory::Message), 2);
    assert_eq!(sink.count(MessageCategory::Warning), 2);
    assert_eq!(sink.count(MessageCategory::Error), 3);
    assert_eq!(sink.count(MessageCategory::Exception), 3);
    assert_eq!(sink.count(MessageCategory::Section), 4);
}

#[test]
fn test_default_rendering_uses_day_first_timestamp() {
    let mut sink = DiagnosticsSink::new();
    sink.log_at(
        LogEvent::new(MessageCategory::Warning, "Message {0} {1}", &args()).in_file("File"),
        fixed_time(),
    );
    let entry = &sink.entries()[0];
    assert_eq!(
        entry.to_string(),
        "[02/01/2000 03:04:05] [MessageType:Warning] [File:File] Message 1 2"
    );
    assert_eq!(entry.timestamp(), fixed_time());
}

#[test]
fn test_consumed_entries_serialize_to_json() {
    let mut sink = DiagnosticsSink::new();
    sink.log_at(LogEvent::exception(sample_error()).in_file("File"), fixed_time());
    let entries = sink.into_entries();
    insta::assert_json_snapshot!(entries, @r#"
    [
      {
        "timestamp": "2000-01-02T03:04:05",
        "category": "Exception",
        "file": "File",
        "error": "Sample error",
        "message": "",
        "args": []
      }
    ]
    "#);
}

#[test]
fn test_wide_alignment_renders_and_displays() {
    let mut sink = DiagnosticsSink::new();
    sink.log_warning("{0,70000}", &["x".into()]);
    let entry = &sink.entries()[0];

    let rendered = entry.render(&TimestampFormat::custom("--").unwrap()).unwrap();
    assert!(rendered.starts_with("[--] [MessageType:Warning]  "));
    assert!(rendered.ends_with(" x"));
    assert!(entry.to_string().ends_with(" x"));
}

#[test]
fn test_oversized_alignment_falls_back_to_template() {
    let mut sink = DiagnosticsSink::new();
    sink.log_at(
        LogEvent::new(MessageCategory::Warning, "{0,2000000}", &["x".into()]),
        fixed_time(),
    );
    let entry = &sink.entries()[0];
    assert_eq!(
        entry.render(&TimestampFormat::EN_GB),
        Err(FormatError::Malformed { position: 0 })
    );
    assert_eq!(
        entry.to_string(),
        "[02/01/2000 03:04:05] [MessageType:Warning] {0,2000000}"
    );
}

#[test]
fn test_logging_under_enabled_subscriber_never_panics() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_writer(std::io::sink)
        .finish();
    let sink = tracing::subscriber::with_default(subscriber, || {
        let mut sink = DiagnosticsSink::new();
        sink.log_warning("{0,70000}", &["x".into()]);
        sink.log_error("{0,2000000}", &["x".into()]);
        sink.log_message_with(MessageVerbosity::Verbose, "{0} {5}", &["x".into()]);
        sink.start_section("unclosed {", &[]);
        sink
    });
    assert_eq!(sink.len(), 4);
    assert!(sink.has_warning() && sink.has_error());
}

#[test]
fn test_entry_json_fields() {
    let mut sink = DiagnosticsSink::new();
    sink.log_at(
        LogEvent::new(MessageCategory::Error, "Message {0} {1}", &args())
            .in_file("File")
            .at(30, 40),
        fixed_time(),
    );
    let value = serde_json::to_value(&sink.entries()[0]).unwrap();
    assert_eq!(value["category"], "Error");
    assert_eq!(value["line_number"], 30);
    assert_eq!(value["line_position"], 40);
    assert_eq!(value["args"], serde_json::json!(["1", 2]));
    assert!(value.get("verbosity").is_none());
    assert!(value.get("error").is_none());
}
