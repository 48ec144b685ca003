//! Workbook data structures

use crate::error::{JoinError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// A worksheet viewed as a header row plus data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    /// Data rows, each padded to `columns.len()`
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from raw sheet rows, using the first row as the header
    pub fn from_rows(name: impl Into<String>, raw_rows: Vec<Vec<CellValue>>) -> Self {
        let mut iter = raw_rows.into_iter();
        let Some(header) = iter.next() else {
            return Self::new(name, Vec::new());
        };

        let columns = header_names(&header);
        let width = columns.len();
        let rows = iter
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Append a row, padding or truncating it to the table width
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Index of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of the given column, or a schema error naming this table
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| JoinError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Cell at (row, col); out-of-range positions read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    /// All cells of one column, in row order
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derive column names from a header row.
///
/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
/// A generated name that clashes with an existing one is suffixed again, so
/// `["a", "a", "a.1"]` becomes `["a", "a.1", "a.1.1"]`.
fn header_names(header: &[CellValue]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, cell) in header.iter().enumerate() {
        let mut name = cell
            .as_match_text()
            .map(|s| s.into_owned())
            .unwrap_or_else(|| format!("Unnamed: {}", index));

        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
        names.push(name);
    }

    names
}

/// Cell value types
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Get the text if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form used when matching against this cell.
    ///
    /// Empty and error cells have no string form and never match.
    pub fn as_match_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        use std::borrow::Cow;
        match self {
            CellValue::Text(s) => Some(Cow::Borrowed(s)),
            CellValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            CellValue::Boolean(true) => Some(Cow::Borrowed("TRUE")),
            CellValue::Boolean(false) => Some(Cow::Borrowed("FALSE")),
            CellValue::Empty | CellValue::Error(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<Option<String>> for CellValue {
    fn from(s: Option<String>) -> Self {
        s.map(CellValue::Text).unwrap_or(CellValue::Empty)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Error(e) => write!(f, "{}", e),
            other => write!(f, "{}", other.as_match_text().unwrap_or_default()),
        }
    }
}

/// Whole numbers print without a fractional part (`7`, not `7.0`)
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_from_rows_uses_first_row_as_header() {
        let table = Table::from_rows(
            "Steps",
            vec![
                vec![text("Name"), text("Command")],
                vec![text("LCD Voltage Test"), text("CMD1")],
                vec![text("LCD Timing Test")],
            ],
        );

        assert_eq!(table.columns, vec!["Name", "Command"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), &CellValue::Empty);
        assert_eq!(table.cell(0, 1), &text("CMD1"));
        assert_eq!(table.cell(9, 9), &CellValue::Empty);
    }

    #[test]
    fn test_header_names_blank_and_duplicates() {
        let table = Table::from_rows(
            "T",
            vec![vec![text("Name"), CellValue::Empty, text("Name"), text("Name")]],
        );
        assert_eq!(table.columns, vec!["Name", "Unnamed: 1", "Name.1", "Name.2"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_header_suffix_skips_existing_names() {
        let table = Table::from_rows("T", vec![vec![text("a"), text("a"), text("a.1")]]);
        assert_eq!(table.columns, vec!["a", "a.1", "a.1.1"]);
        assert_eq!(table.require_column("a.1").unwrap(), 1);

        let table = Table::from_rows(
            "T",
            vec![vec![text("a.1"), text("a"), text("a"), text("a")]],
        );
        assert_eq!(table.columns, vec!["a.1", "a", "a.1.1", "a.2"]);
    }

    #[test]
    fn test_require_column() {
        let table = Table::new("Steps", vec!["Name".to_string()]);
        assert_eq!(table.require_column("Name").unwrap(), 0);

        let err = table.require_column("Command").unwrap_err();
        assert!(matches!(err, JoinError::MissingColumn { .. }));
    }

    #[test]
    fn test_match_text_forms() {
        assert_eq!(CellValue::Number(7.0).as_match_text().unwrap(), "7");
        assert_eq!(CellValue::Number(2.5).as_match_text().unwrap(), "2.5");
        assert_eq!(CellValue::Boolean(true).as_match_text().unwrap(), "TRUE");
        assert!(CellValue::Empty.as_match_text().is_none());
        assert!(CellValue::Error("#N/A".into()).as_match_text().is_none());
        assert_eq!(CellValue::Error("#N/A".into()).to_string(), "#N/A");
    }
}
