use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use pqa_cli::commands::CheckRun;
use pqa_model::{CheckKey, CheckOutcome, IssueRecord};

pub fn print_summary(run: &CheckRun) {
    let envelope = &run.envelope;
    let report = &envelope.report;
    println!("Input: {}", envelope.input);
    println!("SHA256: {}", envelope.input_sha256);
    println!("Report: {}", run.report_path.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Status"),
        header_cell("Issues"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);

    let mut total = 0usize;
    for (key, outcome) in &report.checks {
        let issues = report.issue_count(*key);
        total += issues;
        table.add_row(vec![
            Cell::new(key.as_str()),
            status_cell(outcome),
            count_cell(outcome, issues),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_issue_table(run);
    print_incomplete(run);
}

/// Detail rows for every issue-list record.
fn print_issue_table(run: &CheckRun) {
    let report = &run.envelope.report;
    let records: Vec<(CheckKey, &IssueRecord)> = report
        .checks
        .keys()
        .flat_map(|&key| report.issues(key).iter().map(move |record| (key, record)))
        .collect();
    if records.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Field"),
        header_cell("Count"),
        header_cell("Kinds"),
        header_cell("Examples"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (key, record) in records {
        table.add_row(vec![
            Cell::new(key.as_str()).fg(Color::Blue),
            Cell::new(&record.issue),
            Cell::new(record.count).fg(Color::Yellow),
            kinds_cell(record),
            examples_cell(&record.issue_values),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn print_incomplete(run: &CheckRun) {
    for (key, outcome) in &run.envelope.report.checks {
        match outcome {
            CheckOutcome::Failed { message } => eprintln!("- {key}: failed: {message}"),
            CheckOutcome::TimedOut => eprintln!("- {key}: timed out"),
            _ => {}
        }
    }
}

fn status_cell(outcome: &CheckOutcome) -> Cell {
    let cell = Cell::new(outcome.status());
    match outcome {
        CheckOutcome::Completed { .. } => cell.fg(Color::Green),
        CheckOutcome::Skipped { .. } => cell.fg(Color::DarkGrey),
        CheckOutcome::TimedOut => cell.fg(Color::Yellow),
        CheckOutcome::Failed { .. } => cell.fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn count_cell(outcome: &CheckOutcome, count: usize) -> Cell {
    match outcome {
        CheckOutcome::Completed { .. } if count > 0 => Cell::new(count)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        CheckOutcome::Completed { .. } => dim_cell(count),
        _ => dim_cell("-"),
    }
}

fn kinds_cell(record: &IssueRecord) -> Cell {
    if record.issues.is_empty() {
        return dim_cell("-");
    }
    let kinds: Vec<String> = record
        .breakdown
        .iter()
        .map(|kind| format!("{} ({})", kind.kind, kind.count))
        .collect();
    Cell::new(kinds.join("\n"))
}

fn examples_cell(values: &[String]) -> Cell {
    if values.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(values.join(", "))
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Fixed(32)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
        ]);
    }
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
    Cell::new(value).fg(Color::DarkGrey)
}
