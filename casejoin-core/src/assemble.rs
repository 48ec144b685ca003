//! Result assembly: match every extracted name and concatenate the groups

use crate::extract::ExtractedItem;
use crate::matcher::ReferenceMatcher;
use crate::reader::{CellValue, Table};
use rayon::prelude::*;
use serde::Serialize;

pub const EXTRACTED_NUMBER_COLUMN: &str = "Extracted_Number";
pub const CHECKER_COLUMN: &str = "Checker";

/// Which output shape the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineVariant {
    /// `[id, value, Extracted_Number]`
    #[default]
    Plain,
    /// `[id, value, Extracted_Number, Checker]`
    WithChecker,
}

impl PipelineVariant {
    pub fn from_include_step(include_step: bool) -> Self {
        if include_step {
            PipelineVariant::WithChecker
        } else {
            PipelineVariant::Plain
        }
    }

    pub fn includes_step(self) -> bool {
        self == PipelineVariant::WithChecker
    }
}

/// A reference row projected to the id and value columns and annotated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRow {
    pub id: CellValue,
    pub value: CellValue,
    pub extracted_number: Option<String>,
    /// Always `None` for [`PipelineVariant::Plain`]
    pub checker: Option<String>,
}

/// Ordered concatenation of matched row groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub id_column: String,
    pub value_column: String,
    pub variant: PipelineVariant,
    pub rows: Vec<MatchedRow>,
}

impl ResultTable {
    pub fn new(
        id_column: impl Into<String>,
        value_column: impl Into<String>,
        variant: PipelineVariant,
    ) -> Self {
        Self {
            id_column: id_column.into(),
            value_column: value_column.into(),
            variant,
            rows: Vec::new(),
        }
    }

    /// Output column names, in order
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            self.id_column.clone(),
            self.value_column.clone(),
            EXTRACTED_NUMBER_COLUMN.to_string(),
        ];
        if self.variant.includes_step() {
            columns.push(CHECKER_COLUMN.to_string());
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row cells in column order
    pub fn row_cells(&self, row: &MatchedRow) -> Vec<CellValue> {
        let mut cells = vec![
            row.id.clone(),
            row.value.clone(),
            CellValue::from(row.extracted_number.clone()),
        ];
        if self.variant.includes_step() {
            cells.push(CellValue::from(row.checker.clone()));
        }
        cells
    }

    /// Convert to a plain table ready for writing
    pub fn to_table(&self, sheet_name: &str) -> Table {
        let mut table = Table::new(sheet_name, self.columns());
        for row in &self.rows {
            table.push_row(self.row_cells(row));
        }
        table
    }
}

/// Match each item's name and build the concatenated result.
///
/// Items without a usable name are skipped. Groups follow item order and rows
/// within a group follow reference-table order, whether or not `parallel` is set.
/// An empty result is returned as an empty table.
pub fn assemble(
    matcher: &ReferenceMatcher<'_>,
    items: &[ExtractedItem],
    variant: PipelineVariant,
    parallel: bool,
) -> ResultTable {
    let table = matcher.table();
    let mut result = ResultTable::new(
        table.columns[matcher.id_col()].clone(),
        table.columns[matcher.value_col()].clone(),
        variant,
    );

    let match_item = |item: &ExtractedItem| -> Vec<MatchedRow> {
        let Some(name) = item.match_name() else {
            return Vec::new();
        };
        tracing::info!(name, "matching string");

        let checker = if variant.includes_step() {
            item.step.clone()
        } else {
            None
        };

        matcher
            .find(name)
            .into_iter()
            .map(|row| MatchedRow {
                id: table.cell(row, matcher.id_col()).clone(),
                value: table.cell(row, matcher.value_col()).clone(),
                extracted_number: item.record.number.clone(),
                checker: checker.clone(),
            })
            .collect()
    };

    let groups: Vec<Vec<MatchedRow>> = if parallel {
        items.par_iter().map(match_item).collect()
    } else {
        items.iter().map(match_item).collect()
    };

    result.rows = groups.into_iter().flatten().collect();

    if result.is_empty() {
        tracing::info!("no matches found in the reference table");
    } else {
        tracing::info!(rows = result.len(), "assembled result table");
    }

    result
}
