//! Batch extraction of identifier records

use crate::error::{JoinError, Result};
use crate::identifier::{ExtractedRecord, parse_identifier};
use crate::reader::CellValue;
use serde::Serialize;

/// One parsed identifier plus the step value carried alongside it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedItem {
    pub record: ExtractedRecord,
    /// Step text, present only when steps were supplied
    pub step: Option<String>,
}

impl ExtractedItem {
    pub fn match_name(&self) -> Option<&str> {
        self.record.match_name()
    }
}

/// Parse identifiers element-wise, optionally pairing each with a step.
///
/// Order is preserved. Elements that are not text cells (in either sequence
/// of a pair) are skipped with a warning. Records without a name are kept
/// here and left for the assembler to drop.
///
/// Fails with [`JoinError::InputShape`] before parsing anything when the two
/// sequences differ in length.
pub fn extract_identifiers(
    identifiers: &[CellValue],
    steps: Option<&[CellValue]>,
) -> Result<Vec<ExtractedItem>> {
    if let Some(steps) = steps {
        if steps.len() != identifiers.len() {
            tracing::error!(
                identifiers = identifiers.len(),
                steps = steps.len(),
                "identifier and step sequences must have the same length"
            );
            return Err(JoinError::InputShape {
                identifiers: identifiers.len(),
                steps: steps.len(),
            });
        }
    }

    if identifiers.is_empty() {
        tracing::info!("no test identifiers provided");
        return Ok(Vec::new());
    }

    let mut items = Vec::with_capacity(identifiers.len());

    for (index, raw) in identifiers.iter().enumerate() {
        let step = steps.map(|s| &s[index]);

        let Some(text) = raw.as_text() else {
            tracing::warn!(index, identifier = ?raw, "skipping non-text identifier");
            continue;
        };

        let step = match step {
            Some(cell) => match cell.as_text() {
                Some(step_text) => Some(step_text.to_string()),
                None => {
                    tracing::warn!(index, identifier = text, step = ?cell, "skipping pair with non-text step");
                    continue;
                }
            },
            None => None,
        };

        let record = parse_identifier(Some(text));
        tracing::info!(
            index,
            identifier = text,
            number = ?record.number,
            name = ?record.name,
            step = ?step,
            "parsed identifier"
        );
        if record.match_name().is_none() {
            tracing::info!(index, identifier = text, "identifier has no usable name");
        }

        items.push(ExtractedItem { record, step });
    }

    if !items.iter().any(|item| item.match_name().is_some()) {
        tracing::info!("no valid names extracted from test identifiers");
    }

    Ok(items)
}
