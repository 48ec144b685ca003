//! Error taxonomy for the join pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a phase of the pipeline.
///
/// Per-element problems (a non-text identifier, an identifier without a
/// name) and empty results are not represented here: they are logged and
/// surface as empty collections.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Identifier and step sequences disagree in length
    #[error(
        "length mismatch: {identifiers} identifiers but {steps} steps; both sequences must have the same length"
    )]
    InputShape { identifiers: usize, steps: usize },

    /// A required column is absent from a loaded table
    #[error("column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    /// A required sheet is absent from a workbook
    #[error("sheet '{sheet}' not found in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    /// The workbook could not be opened or decoded
    #[error("failed to open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Writing the output artifact failed
    #[error("failed to write {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
}

impl JoinError {
    /// Whether this is a schema problem (missing sheet or column)
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            JoinError::MissingColumn { .. } | JoinError::SheetNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, JoinError>;
