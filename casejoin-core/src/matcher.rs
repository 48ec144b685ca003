//! Reference table lookup by case-insensitive literal substring

use crate::error::Result;
use crate::reader::{CellValue, Table};
use regex::{Regex, RegexBuilder};

/// Matches extracted names against the identifier column of a reference table.
///
/// The schema (identifier and value columns) is validated once, on
/// construction; lookups themselves never fail.
#[derive(Debug)]
pub struct ReferenceMatcher<'a> {
    table: &'a Table,
    id_col: usize,
    value_col: usize,
}

impl<'a> ReferenceMatcher<'a> {
    /// Bind a matcher to `table`, failing with a schema error when either column is absent
    pub fn new(table: &'a Table, id_column: &str, value_column: &str) -> Result<Self> {
        let id_col = table.require_column(id_column).inspect_err(|e| {
            tracing::error!(error = %e, "reference table schema check failed");
        })?;
        let value_col = table.require_column(value_column).inspect_err(|e| {
            tracing::error!(error = %e, "reference table schema check failed");
        })?;

        Ok(Self {
            table,
            id_col,
            value_col,
        })
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn id_col(&self) -> usize {
        self.id_col
    }

    pub fn value_col(&self) -> usize {
        self.value_col
    }

    /// Indices of rows whose identifier cell contains `name`, in table order.
    ///
    /// Empty when nothing matches. Empty and error cells never match.
    pub fn find(&self, name: &str) -> Vec<usize> {
        let pattern = LiteralPattern::new(name);

        let rows: Vec<usize> = self
            .table
            .column_values(self.id_col)
            .enumerate()
            .filter(|(_, cell)| {
                cell.as_match_text()
                    .is_some_and(|text| pattern.is_match(&text))
            })
            .map(|(row, _)| row)
            .collect();

        if rows.is_empty() {
            tracing::info!(name, "no matching rows found");
        } else {
            tracing::info!(name, matches = rows.len(), "matched reference rows");
        }
        rows
    }

    /// Matching rows as cell slices, in table order
    pub fn match_rows(&self, name: &str) -> Vec<&'a [CellValue]> {
        let table = self.table;
        self.find(name)
            .into_iter()
            .map(|row| table.rows[row].as_slice())
            .collect()
    }

    /// Value-column cells of every matching row, in table order
    pub fn lookup_values(&self, name: &str) -> Vec<CellValue> {
        self.find(name)
            .into_iter()
            .map(|row| self.table.cell(row, self.value_col).clone())
            .collect()
    }
}

/// Case-insensitive literal substring test.
///
/// The name is escaped so pattern metacharacters match themselves.
enum LiteralPattern {
    Regex(Regex),
    Lowercase(String),
}

impl LiteralPattern {
    fn new(name: &str) -> Self {
        match RegexBuilder::new(&regex::escape(name))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => LiteralPattern::Regex(re),
            Err(e) => {
                // Only reachable for names that exceed the regex size limit
                tracing::warn!(name, error = %e, "falling back to lowercase containment");
                LiteralPattern::Lowercase(name.to_lowercase())
            }
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            LiteralPattern::Regex(re) => re.is_match(haystack),
            LiteralPattern::Lowercase(needle) => haystack.to_lowercase().contains(needle.as_str()),
        }
    }
}
