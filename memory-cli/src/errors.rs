//! Enhanced error handling module for memory-cli
//!
//! Provides helpful error messages with context and suggestions for common issues.

use anyhow::Result;
use colored::Colorize;

/// Trait for adding helpful context and suggestions to errors
#[allow(dead_code)]
pub trait EnhancedError<T> {
    /// Add context with helpful suggestions
    fn context_with_help(self, msg: &str, help: &[&str]) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> EnhancedError<T> for Result<T, E> {
    fn context_with_help(self, msg: &str, help: &[&str]) -> Result<T> {
        self.map_err(|e| {
            let mut error_msg = format!("{}\n\n{}", msg.red().bold(), e);

            if !help.is_empty() {
                error_msg.push_str(&format!("\n\n{}", "Possible solutions:".yellow().bold()));
                for (i, h) in help.iter().enumerate() {
                    error_msg.push_str(&format!("\n  {}. {}", i + 1, h));
                }
            }

            anyhow::anyhow!(error_msg)
        })
    }
}

/// Common error messages and help text
#[allow(dead_code)]
pub mod helpers {
    /// Session has no turns/facts to recall
    #[allow(dead_code)]
    pub const EMPTY_RECALL_HELP: &[&str] = &[
        "Check that the session id is correct",
        "Ingest at least one turn before querying: 'memory-cli ingest'",
        "Check backend health: 'memory-cli health'",
    ];

    /// Backend connection error help
    #[allow(dead_code)]
    pub const STORAGE_CONNECTION_HELP: &[&str] = &[
        "Verify the --redb-path / --turso-url values point at a reachable backend",
        "Check network connectivity if using a remote Turso database",
        "Try the local redb-only default (no flags) first",
        "Run 'memory-cli health' for a per-tier breakdown",
    ];

    /// Invalid input error help
    #[allow(dead_code)]
    pub const INVALID_INPUT_HELP: &[&str] = &[
        "Check input format and data types",
        "Verify JSON syntax if providing an embedding vector",
        "Use --help to see valid options",
    ];

    /// Engine status unavailable error help
    #[allow(dead_code)]
    pub const ENGINE_STATUS_HELP: &[&str] = &[
        "Engines only report nonzero activity after 'ingest' has run at least once",
        "Check backend health: 'memory-cli health'",
    ];

    /// Format enhanced error message
    #[allow(dead_code)]
    pub fn format_error_message(error: &str, context: &str, help: &[&str]) -> String {
        use colored::Colorize;

        let mut msg = format!("{}\n\n{}", context.red().bold(), error);

        if !help.is_empty() {
            msg.push_str(&format!("\n\n{}", "Possible solutions:".yellow().bold()));
            for (i, h) in help.iter().enumerate() {
                msg.push_str(&format!("\n  {}. {}", i + 1, h));
            }
        }

        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhanced_error_contains_help() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let enhanced = result.context_with_help("Operation failed", &["Solution 1", "Solution 2"]);

        assert!(enhanced.is_err());
        let error_str = enhanced.unwrap_err().to_string();
        assert!(error_str.contains("Possible solutions:"));
        assert!(error_str.contains("Solution 1"));
        assert!(error_str.contains("Solution 2"));
    }

    #[test]
    fn test_enhanced_error_without_help() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let enhanced = result.context_with_help("Operation failed", &[]);

        assert!(enhanced.is_err());
        let error_str = enhanced.unwrap_err().to_string();
        assert!(error_str.contains("Operation failed"));
        assert!(!error_str.contains("Possible solutions:"));
    }

    #[test]
    fn test_format_error_message() {
        let formatted = helpers::format_error_message(
            "Test error",
            "Operation failed",
            &["Solution 1", "Solution 2"],
        );

        assert!(formatted.contains("Operation failed"));
        assert!(formatted.contains("Test error"));
        assert!(formatted.contains("Possible solutions:"));
        assert!(formatted.contains("1. Solution 1"));
        assert!(formatted.contains("2. Solution 2"));
    }
}
