//! Compile-time diagnostics.
//!
//! The parser records diagnostics instead of printing: the driver decides
//! where they go. Formatting follows the fixed shapes
//! `[Line N] Error at '<lexeme>': <msg>`, `[Line N] Error at end: <msg>`,
//! and, for lexical errors that are their own message, `[Line N] Error: <msg>`.

use std::fmt;

use thiserror::Error;

/// Where a diagnostic points within the token stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a concrete lexeme.
    Lexeme(String),
    /// At end of input.
    Eof,
    /// No location clause (lexical errors).
    Plain,
}

/// A single compile error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub location: ErrorLocation,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            ErrorLocation::Lexeme(lexeme) => {
                write!(f, "[Line {}] Error at '{}': {}", self.line, lexeme, self.message)
            },
            ErrorLocation::Eof => {
                write!(f, "[Line {}] Error at end: {}", self.line, self.message)
            },
            ErrorLocation::Plain => write!(f, "[Line {}] Error: {}", self.line, self.message),
        }
    }
}

/// Failure of a whole compilation: one or more recorded diagnostics.
#[derive(Debug, Error)]
#[error("compilation failed with {} error(s)", .diagnostics.len())]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexeme_form() {
        let diag = Diagnostic {
            line: 3,
            location: ErrorLocation::Lexeme(";".to_string()),
            message: "Expected expression.".to_string(),
        };
        assert_eq!(diag.to_string(), "[Line 3] Error at ';': Expected expression.");
    }

    #[test]
    fn test_eof_form() {
        let diag = Diagnostic {
            line: 1,
            location: ErrorLocation::Eof,
            message: "Expected ';' after value.".to_string(),
        };
        assert_eq!(diag.to_string(), "[Line 1] Error at end: Expected ';' after value.");
    }

    #[test]
    fn test_plain_form() {
        let diag = Diagnostic {
            line: 2,
            location: ErrorLocation::Plain,
            message: "Unterminated string.".to_string(),
        };
        assert_eq!(diag.to_string(), "[Line 2] Error: Unterminated string.");
    }
}
