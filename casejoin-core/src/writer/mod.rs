//! Writer module for producing the output workbook

mod xlsx_writer;

pub use xlsx_writer::{cell_ref, write_xlsx_package};

use crate::assemble::ResultTable;
use crate::reader::Table;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Write tables to an XLSX file, one worksheet each.
///
/// The package is written to a sibling temporary file and renamed into
/// place, so `path` never holds a partial workbook.
pub fn write_xlsx<P: AsRef<Path>>(path: P, sheets: &[&Table]) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => {}
        _ => anyhow::bail!("Unsupported output format: {}", path.display()),
    }

    let tmp_path = temp_path_for(path)?;
    let result = write_to(&tmp_path, sheets).and_then(|()| {
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move output into place: {}", path.display()))
    });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Write a result table as a single-sheet workbook
pub fn write_result<P: AsRef<Path>>(path: P, result: &ResultTable, sheet_name: &str) -> Result<()> {
    let table = result.to_table(sheet_name);
    write_xlsx(path, &[&table])
}

fn write_to(path: &Path, sheets: &[&Table]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = write_xlsx_package(BufWriter::new(file), sheets)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush file: {}", path.display()))?
        .sync_all()?;
    Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Output path has no file name: {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CellValue, read_sheet};

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path_for(Path::new("out/result.xlsx")).unwrap();
        assert_eq!(tmp, PathBuf::from("out/.result.xlsx.tmp"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");

        let mut table = Table::new("Sheet1", vec!["Name".to_string(), "Command".to_string()]);
        table.push_row(vec![CellValue::from("LCD Voltage Test"), CellValue::from("CMD1")]);
        table.push_row(vec![CellValue::from("LCD Timing Test"), CellValue::Number(12.0)]);

        write_xlsx(&path, &[&table]).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join(".result.xlsx.tmp").exists());

        let loaded = read_sheet(&path, "Sheet1").unwrap();
        assert_eq!(loaded.columns, table.columns);
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("result.xlsx");
        let table = Table::new("Sheet1", vec!["A".to_string()]);

        assert!(write_xlsx(&path, &[&table]).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new("Sheet1", vec!["A".to_string()]);
        assert!(write_xlsx(dir.path().join("out.csv"), &[&table]).is_err());
    }
}
