use std::path::{Path, PathBuf};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use mtx_model::{MESSAGE_FIELD, PairEntry, Translation, ValidationOutcome, ValidationResult};

use mtx_cli::batch::{BatchReport, EntryOutcome};

pub fn print_pairs(entries: &[PairEntry], root: &Path) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("MT"),
        header_cell("Variant"),
        header_cell("MX type"),
        header_cell("Mapping file"),
        header_cell("XSD"),
    ]);
    apply_table_style(&mut table);
    for entry in entries {
        let mapping = match &entry.mapping_file {
            Some(file) if root.join(file).is_file() => Cell::new(file),
            Some(file) => Cell::new(format!("{file} (missing)")).fg(Color::Red),
            None => dim_cell("pass-through"),
        };
        table.add_row(vec![
            Cell::new(&entry.mt_code).add_attribute(Attribute::Bold),
            optional_cell(entry.variant.as_deref()),
            optional_cell(entry.mx_type.as_deref()),
            mapping,
            optional_cell(entry.xsd_dir.as_deref()),
        ]);
    }
    println!("{table}");
}

pub fn print_prevalidation(result: &ValidationResult) {
    let verdict = if result.valid { "valid" } else { "invalid" };
    println!("{}: {verdict} ({} errors)", result.mt_type, result.errors.len());
    if result.errors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("#"),
        header_cell("Code"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for error in &result.errors {
        let field = if error.field == MESSAGE_FIELD {
            dim_cell("message")
        } else {
            Cell::new(&error.field).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            field,
            error.occurrence.map_or_else(|| dim_cell("-"), Cell::new),
            optional_cell(error.code.as_deref()).fg(Color::Red),
            Cell::new(&error.message),
        ]);
    }
    println!("{table}");
}

/// Schema findings go to stderr so stdout stays the XML document.
pub fn print_validation(translation: &Translation) {
    let ValidationOutcome { ok, errors } = translation.validation();
    if errors.is_empty() {
        return;
    }
    let label = if *ok { "Schema validation notes:" } else { "Schema validation errors:" };
    eprintln!("{label}");
    for error in errors {
        eprintln!("- {error}");
    }
}

pub fn print_batch(report: &BatchReport, output_dir: &Path, written: &[PathBuf]) {
    println!("Batch: {}", report.source);
    println!("Output: {} ({} files)", output_dir.display(), written.len());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Status"),
        header_cell("Result"),
        header_cell("Schema"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for entry in &report.results {
        let row = match &entry.outcome {
            EntryOutcome::Ok { result } => {
                let schema = if result.validation().ok {
                    Cell::new("ok").fg(Color::Green)
                } else {
                    count_cell(result.validation().errors.len(), Color::Red)
                };
                vec![
                    Cell::new(entry.index),
                    Cell::new("ok").fg(Color::Green),
                    Cell::new(result.mx_type().unwrap_or("pass-through")),
                    schema,
                    dim_cell(entry.file_name()),
                ]
            }
            EntryOutcome::Error { error } => vec![
                Cell::new(entry.index),
                Cell::new("error").fg(Color::Red),
                Cell::new(error.status_code).fg(Color::Red),
                dim_cell("-"),
                Cell::new(error_detail(&error.detail)),
            ],
        };
        table.add_row(row);
    }
    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(report.summary.total).add_attribute(Attribute::Bold),
        count_cell(report.summary.succeeded, Color::Green).add_attribute(Attribute::Bold),
        count_cell(report.summary.failed, Color::Red).add_attribute(Attribute::Bold),
        dim_cell(&report.processed_at),
    ]);
    println!("{table}");
}

fn error_detail(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(text) => text.clone(),
        other => other
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("error")
            .to_string(),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
