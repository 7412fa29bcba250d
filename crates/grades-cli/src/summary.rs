use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use grades_model::{Dataset, ModuleCatalog};
use grades_output::ConversionSummary;
use grades_report::ReportArtifacts;
use grades_validate::ValidationOutcome;

pub fn print_conversions(conversions: &[(Dataset, grades_output::Result<ConversionSummary>)]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Records"),
        header_cell("Columns"),
        header_cell("Output"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    let mut total_records = 0usize;
    for (dataset, result) in conversions {
        match result {
            Ok(summary) => {
                total_records += summary.records;
                table.add_row(vec![
                    dataset_cell(*dataset),
                    Cell::new(summary.records),
                    Cell::new(summary.columns),
                    Cell::new(summary.output.display()),
                    ok_cell("✓"),
                ]);
            }
            Err(error) => {
                table.add_row(vec![
                    dataset_cell(*dataset),
                    dim_cell("-"),
                    dim_cell("-"),
                    Cell::new(error).fg(Color::Red),
                    failed_cell(error.kind().label()),
                ]);
            }
        }
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
}

pub fn print_validations(outcomes: &[ValidationOutcome]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Schema"),
        header_cell("File"),
        header_cell("Errors"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for outcome in outcomes {
        let (file, errors, status) = match &outcome.result {
            Ok(result) if result.valid => (
                Cell::new(result.schema.display()),
                dim_cell(0),
                ok_cell("valid"),
            ),
            Ok(result) => (
                Cell::new(result.schema.display()),
                Cell::new(result.error_count())
                    .fg(Color::Red)
                    .add_attribute(Attribute::Bold),
                Cell::new("invalid").fg(Color::Yellow),
            ),
            Err(error) => (
                Cell::new(error).fg(Color::Red),
                dim_cell("-"),
                failed_cell(error.kind().label()),
            ),
        };
        table.add_row(vec![
            dataset_cell(outcome.dataset),
            Cell::new(outcome.kind),
            file,
            errors,
            status,
        ]);
    }
    println!("{table}");
    print_issue_table(outcomes);
}

fn print_issue_table(outcomes: &[ValidationOutcome]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Schema"),
        header_cell("Line"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut count = 0usize;
    for outcome in outcomes {
        let Ok(result) = &outcome.result else {
            continue;
        };
        for issue in &result.issues {
            count += 1;
            table.add_row(vec![
                dataset_cell(outcome.dataset),
                Cell::new(outcome.kind),
                issue.line.map_or_else(|| dim_cell("-"), Cell::new),
                Cell::new(&issue.message),
            ]);
        }
    }
    if count == 0 {
        return;
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

pub fn print_modules(catalog: &ModuleCatalog) {
    if catalog.is_empty() {
        println!("No modules found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell("Module")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (idx, name) in catalog.names().iter().enumerate() {
        table.add_row(vec![Cell::new(idx + 1), Cell::new(name)]);
    }
    println!("{table}");
}

pub fn print_report(artifacts: &ReportArtifacts) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Module"), header_cell("Output")]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(artifacts.module.as_str()).add_attribute(Attribute::Bold),
        Cell::new(artifacts.html.display()),
    ]);
    if let Some(pdf) = &artifacts.pdf {
        table.add_row(vec![dim_cell(""), Cell::new(pdf.display())]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
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
        .set_width(140);
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

fn dataset_cell(dataset: Dataset) -> Cell {
    Cell::new(dataset)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn ok_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Green)
        .add_attribute(Attribute::Bold)
}

fn failed_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Red)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
