//! Output formatters for join results

use anyhow::Result;
use casejoin_core::{CellValue, ResultTable, RunReport};
use colored::*;

/// Print a run report as a colored table summary
pub fn print_report_human(report: &RunReport) {
    let table = &report.table;

    if table.is_empty() {
        println!("{}", "No matches found; nothing written.".yellow().bold());
        return;
    }

    let columns = table.columns();
    println!("{}", columns.join(" | ").bold().underline());
    for row in &table.rows {
        let cells: Vec<String> = table.row_cells(row).iter().map(|c| c.to_string()).collect();
        println!("{}", cells.join(" | "));
    }
    println!();

    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Rows:".bold(), table.len());
    if let Some(path) = &report.output {
        println!("  {} {}", "Written:".green().bold(), path.display());
    }
    if let Some(err) = &report.persistence_error {
        println!("  {} {}", "Not written:".red().bold(), err);
    }
}

/// Print a run report in JSON format
pub fn print_report_json(report: &RunReport) -> Result<()> {
    let output = serde_json::json!({
        "columns": report.table.columns(),
        "rows": rows_as_objects(&report.table),
        "output": report.output.as_ref().map(|p| p.display().to_string()),
        "persistence_error": report.persistence_error.as_ref().map(|e| e.to_string()),
        "summary": {
            "total": report.table.len(),
            "variant": report.table.variant,
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn rows_as_objects(table: &ResultTable) -> Vec<serde_json::Map<String, serde_json::Value>> {
    let columns = table.columns();
    table
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(table.row_cells(row).iter().map(cell_json))
                .collect()
        })
        .collect()
}

fn cell_json(cell: &CellValue) -> serde_json::Value {
    serde_json::to_value(cell).unwrap_or(serde_json::Value::Null)
}

/// Print lookup values, one per line
pub fn print_values_human(name: &str, values: &[CellValue]) {
    if values.is_empty() {
        println!("{} {}", "No matching rows for".yellow().bold(), name.cyan());
        return;
    }

    println!("{} {}", "Matches for".bold(), name.cyan().bold());
    for value in values {
        println!("  {}", value);
    }
}

/// Print lookup values in JSON format
pub fn print_values_json(name: &str, values: &[CellValue]) -> Result<()> {
    let output = serde_json::json!({
        "name": name,
        "values": values,
        "total": values.len(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
