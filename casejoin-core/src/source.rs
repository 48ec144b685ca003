//! Identifier source: pulls raw identifiers (and steps) out of a loaded sheet

use crate::error::Result;
use crate::reader::{CellValue, Table};

/// Raw identifier cells and, optionally, the step cell of each row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierBatch {
    pub identifiers: Vec<CellValue>,
    pub steps: Option<Vec<CellValue>>,
}

impl IdentifierBatch {
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Collect the goal column (and step column, if given) of `table`.
///
/// Rows with an empty cell in any requested column are dropped. A missing
/// column is a schema error.
pub fn load_identifiers(
    table: &Table,
    goal_column: &str,
    step_column: Option<&str>,
) -> Result<IdentifierBatch> {
    let goal_col = table.require_column(goal_column).inspect_err(|e| {
        tracing::error!(error = %e, "identifier sheet schema check failed");
    })?;
    let step_col = step_column
        .map(|name| table.require_column(name))
        .transpose()
        .inspect_err(|e| {
            tracing::error!(error = %e, "identifier sheet schema check failed");
        })?;

    let mut identifiers = Vec::new();
    let mut steps = step_col.map(|_| Vec::new());
    let mut dropped = 0usize;

    for row in 0..table.len() {
        let goal = table.cell(row, goal_col);
        let step = step_col.map(|col| table.cell(row, col));

        if goal.is_empty() || step.is_some_and(CellValue::is_empty) {
            dropped += 1;
            continue;
        }

        identifiers.push(goal.clone());
        if let (Some(steps), Some(step)) = (steps.as_mut(), step) {
            steps.push(step.clone());
        }
    }

    if dropped > 0 {
        tracing::info!(dropped, "dropped rows with empty identifier cells");
    }
    tracing::info!(
        count = identifiers.len(),
        identifiers = ?identifiers,
        "found test identifiers"
    );

    Ok(IdentifierBatch { identifiers, steps })
}
