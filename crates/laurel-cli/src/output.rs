// crates/laurel-cli/src/output.rs
//
// Output formatting utilities for the Laurel CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        token: String,
        balance: u64,
    }

    #[test]
    fn test_table_has_headers() {
        let out = format_table(&[Row {
            token: "7".to_string(),
            balance: 3,
        }]);
        assert!(out.contains("token"));
        assert!(out.contains("balance"));
    }

    #[test]
    fn test_json_is_pretty() {
        let out = format_json(&Row {
            token: "7".to_string(),
            balance: 3,
        });
        assert!(out.contains("\n"));
        assert!(out.contains("\"balance\": 3"));
    }
}
