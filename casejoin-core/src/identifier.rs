//! Test-case identifier parsing
//!
//! An identifier such as `"LCD_CXL_123: Voltage check"` carries a numeric
//! code after the `LCD_CXL_` marker and a descriptive name after the first
//! colon. Either part may be missing.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Literal marker that precedes the numeric code
pub const NUMBER_MARKER: &str = "LCD_CXL_";

/// Structured parts extracted from one raw identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    /// Digit run following the first `LCD_CXL_`, kept as text to preserve leading zeros
    pub number: Option<String>,
    /// Text after the first colon, trimmed
    pub name: Option<String>,
}

impl ExtractedRecord {
    /// Name usable for matching; `None` when absent or blank
    pub fn match_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

fn number_regex() -> &'static Regex {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_RE.get_or_init(|| Regex::new(&format!(r"{}(\d+)", regex::escape(NUMBER_MARKER))).unwrap())
}

/// Parse one raw identifier.
///
/// `None` and empty input yield an empty record. Never fails.
pub fn parse_identifier(raw: Option<&str>) -> ExtractedRecord {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return ExtractedRecord::default();
    };

    let number = number_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let name = raw
        .split_once(':')
        .map(|(_, rest)| rest.trim().to_string());

    ExtractedRecord { number, name }
}
