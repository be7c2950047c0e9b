//! Integration tests for diagnostics reporting and exit codes.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use xdt_cli::report::{diagnostics_table, exit_code, json_lines, summary_table};
use xdt_cli::types::ApplyResult;
use xdt_transform::{
    CapturedError, DiagnosticsSink, LogEvent, MessageCategory, TimestampFormat, TransformLogger,
};

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

fn warning_sink() -> DiagnosticsSink {
    let mut sink = DiagnosticsSink::new();
    sink.log_at(
        LogEvent::new(MessageCategory::Section, "Executing {0}", &["Replace".into()]),
        fixed_time(),
    );
    sink.log_at(
        LogEvent::new(
            MessageCategory::Warning,
            "No element in the source document matches '{0}'",
            &["/configuration/appSettings/add[@key='x']".into()],
        )
        .in_file("web.release.config")
        .at(4, 6),
        fixed_time(),
    );
    sink
}

fn result_with(diagnostics: DiagnosticsSink, failure: Option<&str>) -> ApplyResult {
    ApplyResult {
        source: PathBuf::from("web.config"),
        target: PathBuf::from("out.config"),
        diagnostics,
        failure: failure.map(str::to_string),
    }
}

#[test]
fn test_exit_code_clean_run() {
    let mut sink = DiagnosticsSink::new();
    sink.log_message("fine", &[]);
    let result = result_with(sink, None);
    assert_eq!(exit_code(&result, false), 0);
    assert_eq!(exit_code(&result, true), 0);
}

#[test]
fn test_exit_code_warning_only_fails_when_requested() {
    let result = result_with(warning_sink(), None);
    assert_eq!(exit_code(&result, false), 0);
    assert_eq!(exit_code(&result, true), 1);
}

#[test]
fn test_exit_code_errors_and_failures() {
    let mut sink = DiagnosticsSink::new();
    sink.log_error("bad {0}", &["thing".into()]);
    assert_eq!(exit_code(&result_with(sink, None), false), 1);

    let mut sink = DiagnosticsSink::new();
    sink.log_exception(CapturedError::new(std::io::Error::other("boom")));
    assert_eq!(exit_code(&result_with(sink, None), false), 1);

    let result = result_with(DiagnosticsSink::new(), Some("Failed to transform"));
    assert!(result.failed());
    assert_eq!(exit_code(&result, false), 1);
}

#[test]
fn test_diagnostics_table_lists_entries() {
    let mut table = diagnostics_table(&warning_sink(), &TimestampFormat::ISO_8601);
    table.force_no_tty();
    let rendered = table.to_string();
    assert!(rendered.contains("2000-01-02T03:04:05"));
    assert!(rendered.contains("Executing Replace"));
    assert!(rendered.contains("web.release.config:4:6"));
    assert!(rendered.contains("Warning"));
}

#[test]
fn test_summary_table_counts_categories() {
    let mut table = summary_table(&warning_sink());
    table.force_no_tty();
    let rendered = table.to_string();
    assert!(rendered.contains("Section"));
    assert!(rendered.contains("TOTAL"));
    assert!(rendered.contains('2'));
}

#[test]
fn test_json_lines_carry_rendering() {
    let lines = json_lines(&warning_sink(), &TimestampFormat::EN_GB).unwrap();
    insta::assert_snapshot!(lines.join("\n"), @r#"
    {"timestamp":"2000-01-02T03:04:05","category":"Section","message":"Executing {0}","args":["Replace"],"rendered":"[02/01/2000 03:04:05] [MessageType:Section] Executing Replace"}
    {"timestamp":"2000-01-02T03:04:05","category":"Warning","file":"web.release.config","line_number":4,"line_position":6,"message":"No element in the source document matches '{0}'","args":["/configuration/appSettings/add[@key='x']"],"rendered":"[02/01/2000 03:04:05] [MessageType:Warning] [File:web.release.config] [LineNumber:4] [LinePosition:6] No element in the source document matches '/configuration/appSettings/add[@key='x']'"}
    "#);
}
