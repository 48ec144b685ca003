//! Configuration for sheet names, column names and output

use crate::assemble::{CHECKER_COLUMN, EXTRACTED_NUMBER_COLUMN};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main join configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub identifiers: IdentifierConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Match identifiers on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
}

impl JoinConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: JoinConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject blank names, duplicate output columns and an output path without a file name
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("reference.sheet", self.reference.sheet.as_str()),
            ("reference.id_column", self.reference.id_column.as_str()),
            ("reference.value_column", self.reference.value_column.as_str()),
            ("identifiers.sheet", self.identifiers.sheet.as_str()),
            ("identifiers.goal_column", self.identifiers.goal_column.as_str()),
            ("output.sheet", self.output.sheet.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("Configuration error: '{}' must not be empty", key);
            }
        }

        if let Some(step) = &self.identifiers.step_column {
            if step.trim().is_empty() {
                anyhow::bail!(
                    "Configuration error: 'identifiers.step_column' must not be empty when set"
                );
            }
        }

        let mut output_columns = vec![
            self.reference.id_column.as_str(),
            self.reference.value_column.as_str(),
            EXTRACTED_NUMBER_COLUMN,
        ];
        if self.identifiers.step_column.is_some() {
            output_columns.push(CHECKER_COLUMN);
        }
        for (i, column) in output_columns.iter().enumerate() {
            if output_columns[..i].contains(column) {
                anyhow::bail!(
                    "Configuration error: output column '{}' would appear twice",
                    column
                );
            }
        }

        if self.output.path.file_name().is_none() {
            anyhow::bail!(
                "Configuration error: output path '{}' has no file name",
                self.output.path.display()
            );
        }

        Ok(())
    }
}

/// Reference (lookup) sheet settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub sheet: String,
    pub id_column: String,
    pub value_column: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            sheet: "Steps".to_string(),
            id_column: "Name".to_string(),
            value_column: "Command".to_string(),
        }
    }
}

/// Identifier sheet settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub sheet: String,
    pub goal_column: String,
    /// Presence selects the `Checker` output variant
    pub step_column: Option<String>,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            sheet: "TestLines".to_string(),
            goal_column: "GoalName".to_string(),
            step_column: None,
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub sheet: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output_result.xlsx"),
            sheet: "Sheet1".to_string(),
        }
    }
}
