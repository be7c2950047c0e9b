use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use xdt_transform::{DiagnosticsEntry, DiagnosticsSink, MessageCategory, TimestampFormat};

use crate::types::ApplyResult;

const CATEGORIES: [MessageCategory; 5] = [
    MessageCategory::Message,
    MessageCategory::Section,
    MessageCategory::Warning,
    MessageCategory::Error,
    MessageCategory::Exception,
];

pub fn print_summary(result: &ApplyResult) {
    println!("Source: {}", result.source.display());
    println!("Target: {}", result.target.display());
    match &result.failure {
        Some(reason) => println!("Status: failed ({reason})"),
        None => println!("Status: applied"),
    }
    println!("{}", summary_table(&result.diagnostics));
}

/// One row per category with the number of recorded entries.
pub fn summary_table(sink: &DiagnosticsSink) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Entries")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for category in CATEGORIES {
        table.add_row(vec![
            Cell::new(category.as_str()),
            count_cell(sink.count(category), category_color(category)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(sink.len()).add_attribute(Attribute::Bold),
    ]);
    table
}

/// Every recorded entry in capture order.
pub fn diagnostics_table(sink: &DiagnosticsSink, format: &TimestampFormat) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Time"),
        header_cell("Category"),
        header_cell("Location"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for entry in sink {
        table.add_row(vec![
            dim_cell(entry.timestamp().format(format.pattern())),
            category_cell(entry.category()),
            location_cell(entry),
            Cell::new(message_text(entry)),
        ]);
    }
    table
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    entry: &'a DiagnosticsEntry,
    rendered: String,
}

/// One JSON object per entry, carrying the canonical rendering alongside
/// the structured fields.
pub fn json_lines(
    sink: &DiagnosticsSink,
    format: &TimestampFormat,
) -> serde_json::Result<Vec<String>> {
    sink.iter()
        .map(|entry| {
            let rendered = entry
                .render(format)
                .unwrap_or_else(|_| entry.to_string());
            serde_json::to_string(&JsonLine { entry, rendered })
        })
        .collect()
}

/// Process exit code for an `apply` run.
pub fn exit_code(result: &ApplyResult, fail_on_warning: bool) -> i32 {
    let sink = &result.diagnostics;
    let failed = result.failed()
        || sink.has_error()
        || sink.has_exception()
        || (fail_on_warning && sink.has_warning());
    i32::from(failed)
}

fn message_text(entry: &DiagnosticsEntry) -> String {
    match entry.error() {
        Some(error) if entry.message().is_empty() => error.detail(),
        _ => entry.message_display().to_string(),
    }
}

fn location(entry: &DiagnosticsEntry) -> Option<String> {
    let file = entry.file()?;
    Some(match (entry.line_number(), entry.line_position()) {
        (Some(line), Some(column)) => format!("{file}:{line}:{column}"),
        (Some(line), None) => format!("{file}:{line}"),
        _ => file.to_string(),
    })
}

fn location_cell(entry: &DiagnosticsEntry) -> Cell {
    match location(entry) {
        Some(text) => Cell::new(text),
        None => dim_cell("-"),
    }
}

fn category_cell(category: Option<MessageCategory>) -> Cell {
    match category {
        Some(category) => {
            let cell = Cell::new(category.as_str()).fg(category_color(category));
            if matches!(
                category,
                MessageCategory::Error | MessageCategory::Exception
            ) {
                cell.add_attribute(Attribute::Bold)
            } else {
                cell
            }
        }
        None => dim_cell("-"),
    }
}

fn category_color(category: MessageCategory) -> Color {
    match category {
        MessageCategory::Message => Color::White,
        MessageCategory::Section => Color::Blue,
        MessageCategory::Warning => Color::Yellow,
        MessageCategory::Error | MessageCategory::Exception => Color::Red,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(60);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdt_transform::{LogEvent, MessageArg};

    #[test]
    fn test_location_formats() {
        let mut sink = DiagnosticsSink::new();
        let args: [MessageArg; 0] = [];
        sink.log_at(
            LogEvent::new(MessageCategory::Warning, "w", &args)
                .in_file("t.config")
                .at(4, 7),
            Default::default(),
        );
        sink.log_at(
            LogEvent::new(MessageCategory::Error, "e", &args).in_file("t.config"),
            Default::default(),
        );
        sink.log_at(
            LogEvent::new(MessageCategory::Message, "m", &args),
            Default::default(),
        );
        let locations: Vec<_> = sink.iter().map(location).collect();
        assert_eq!(
            locations,
            vec![
                Some("t.config:4:7".to_string()),
                Some("t.config".to_string()),
                None
            ]
        );
    }
}
