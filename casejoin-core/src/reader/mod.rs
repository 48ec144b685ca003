//! Excel/ODS file reader using calamine

use crate::error::{JoinError, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::io::{Read, Seek};
use std::path::Path;

pub mod workbook;

pub use workbook::{CellValue, Table};

/// Read a single named sheet from a workbook
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Table> {
    let path = path.as_ref();
    let mut excel = open(path)?;

    if !excel.sheet_names().iter().any(|name| name == sheet_name) {
        tracing::error!(path = %path.display(), sheet = sheet_name, "sheet not found");
        return Err(JoinError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet_name.to_string(),
        });
    }

    let table = read_table(&mut excel, path, sheet_name)?;
    tracing::info!(
        path = %path.display(),
        sheet = sheet_name,
        rows = table.len(),
        columns = ?table.columns,
        "sheet loaded"
    );
    Ok(table)
}

fn open(path: &Path) -> Result<Sheets<std::io::BufReader<std::fs::File>>> {
    open_workbook_auto(path).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "failed to open workbook");
        JoinError::Open {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn read_table<RS: Read + Seek>(
    excel: &mut Sheets<RS>,
    path: &Path,
    sheet_name: &str,
) -> Result<Table> {
    let range = excel
        .worksheet_range(sheet_name)
        .map_err(|source| JoinError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_sheet(sheet_name, &range))
}

fn parse_sheet(name: &str, range: &Range<Data>) -> Table {
    let raw_rows = range
        .rows()
        .map(|row| row.iter().map(parse_cell_value).collect())
        .collect();
    Table::from_rows(name, raw_rows)
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
