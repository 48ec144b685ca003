//! casejoin-core: extract test-case identifiers and join them against a reference sheet
//!
//! Identifiers such as `"LCD_CXL_123: Voltage check"` are parsed into a
//! number and a name; each name is matched (case-insensitive literal
//! substring) against the identifier column of a reference sheet, and the
//! matched rows are concatenated into a result table annotated with the
//! extracted number and, optionally, a carried step value.
//!
//! The library only emits `tracing` events; installing a subscriber is up
//! to the caller.

pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod identifier;
pub mod matcher;
pub mod reader;
pub mod source;
pub mod writer;

use std::path::{Path, PathBuf};

pub use assemble::{MatchedRow, PipelineVariant, ResultTable, assemble};
pub use config::JoinConfig;
pub use error::{JoinError, Result};
pub use extract::{ExtractedItem, extract_identifiers};
pub use identifier::{ExtractedRecord, parse_identifier};
pub use matcher::ReferenceMatcher;
pub use reader::{CellValue, Table};
pub use source::{IdentifierBatch, load_identifiers};

/// Outcome of a file-to-file run
#[derive(Debug)]
pub struct RunReport {
    /// The computed result; empty means no identifier matched
    pub table: ResultTable,
    /// Where the result was written, if it was
    pub output: Option<PathBuf>,
    /// Write failure, if any; `table` is still valid
    pub persistence_error: Option<JoinError>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Main pipeline interface
pub struct CaseJoiner {
    config: JoinConfig,
}

impl CaseJoiner {
    /// Create a joiner with default configuration
    pub fn new() -> Self {
        Self::with_config(JoinConfig::default())
    }

    /// Create a joiner with custom configuration
    pub fn with_config(config: JoinConfig) -> Self {
        Self { config }
    }

    /// Join an identifier batch against an in-memory reference table.
    ///
    /// The presence of `batch.steps` selects the `Checker` variant. A batch
    /// with no usable name yields an empty table without touching `reference`.
    pub fn join_tables(&self, reference: &Table, batch: &IdentifierBatch) -> Result<ResultTable> {
        let items = extract_identifiers(&batch.identifiers, batch.steps.as_deref())?;
        let variant = PipelineVariant::from_include_step(batch.steps.is_some());

        if items.iter().all(|item| item.match_name().is_none()) {
            tracing::info!("no usable identifiers; nothing to match");
            return Ok(self.empty_result(variant));
        }

        let matcher = ReferenceMatcher::new(
            reference,
            &self.config.reference.id_column,
            &self.config.reference.value_column,
        )?;

        Ok(assemble(&matcher, &items, variant, self.config.parallel))
    }

    fn empty_result(&self, variant: PipelineVariant) -> ResultTable {
        ResultTable::new(
            &self.config.reference.id_column,
            &self.config.reference.value_column,
            variant,
        )
    }

    /// Load both sheets, join them and persist a non-empty result.
    ///
    /// An empty result is not written. A write failure is reported in
    /// [`RunReport::persistence_error`] rather than as an error.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        reference_path: P,
        identifiers_path: Q,
    ) -> Result<RunReport> {
        let identifier_sheet =
            reader::read_sheet(identifiers_path, &self.config.identifiers.sheet)?;
        let batch = load_identifiers(
            &identifier_sheet,
            &self.config.identifiers.goal_column,
            self.config.identifiers.step_column.as_deref(),
        )?;

        let table = if batch.is_empty() {
            self.empty_result(PipelineVariant::from_include_step(batch.steps.is_some()))
        } else {
            let reference = reader::read_sheet(reference_path, &self.config.reference.sheet)?;
            self.join_tables(&reference, &batch)?
        };

        if table.is_empty() {
            tracing::info!("empty result; skipping output");
            return Ok(RunReport {
                table,
                output: None,
                persistence_error: None,
            });
        }

        let path = &self.config.output.path;
        match writer::write_result(path, &table, &self.config.output.sheet) {
            Ok(()) => {
                tracing::info!(path = %path.display(), rows = table.len(), "results saved");
                Ok(RunReport {
                    table,
                    output: Some(path.clone()),
                    persistence_error: None,
                })
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %format!("{:#}", e), "error saving results");
                Ok(RunReport {
                    table,
                    output: None,
                    persistence_error: Some(JoinError::Persistence {
                        path: path.clone(),
                        message: format!("{:#}", e),
                    }),
                })
            }
        }
    }

    /// Value-column entries of every reference row matching `name`
    pub fn find<P: AsRef<Path>>(&self, reference_path: P, name: &str) -> Result<Vec<CellValue>> {
        let reference = reader::read_sheet(reference_path, &self.config.reference.sheet)?;
        let matcher = ReferenceMatcher::new(
            &reference,
            &self.config.reference.id_column,
            &self.config.reference.value_column,
        )?;
        tracing::info!(name, "string to match");
        Ok(matcher.lookup_values(name))
    }
}

impl Default for CaseJoiner {
    fn default() -> Self {
        Self::new()
    }
}
