//! Error types for sg-sql

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of a parser failure, used to pick a hint for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    /// The parser expected a different token ("Expected: ..., found: ...")
    Syntax,
    /// Tokenizer failure, unexpected token or a construct the grammar does not support
    Unsupported,
    /// Anything else (recursion limit, internal parser errors)
    Other,
}

impl ParseFailureKind {
    /// Classify a raw parser message.
    pub(crate) fn classify(message: &str, from_tokenizer: bool) -> Self {
        let lower = message.to_lowercase();
        if from_tokenizer
            || lower.contains("unexpected")
            || lower.contains("unsupported")
            || lower.contains("not supported")
        {
            ParseFailureKind::Unsupported
        } else if lower.contains("expected") {
            ParseFailureKind::Syntax
        } else {
            ParseFailureKind::Other
        }
    }

    /// Human-readable guidance for this failure category.
    pub fn hint(&self, dialect: &str) -> String {
        match self {
            ParseFailureKind::Syntax => format!(
                "Please check your SQL syntax and ensure it is valid for the {dialect} dialect."
            ),
            ParseFailureKind::Unsupported => {
                "This may be due to unsupported SQL features or incorrect syntax.".to_string()
            }
            ParseFailureKind::Other => format!(
                "Please ensure your SQL is valid and uses standard {dialect} syntax."
            ),
        }
    }
}

impl std::fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailureKind::Syntax => write!(f, "SQL syntax error"),
            ParseFailureKind::Unsupported => write!(f, "SQL parsing error"),
            ParseFailureKind::Other => write!(f, "Failed to parse SQL query"),
        }
    }
}

/// SQL parsing and analysis errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlError {
    /// SQL could not be parsed with the resolved dialect (S001)
    #[error("[S001] {kind} ({dialect}) at line {line}, column {column}: {message}. {hint}")]
    Syntax {
        dialect: String,
        kind: ParseFailureKind,
        message: String,
        hint: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL (S002)
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// Column references could not be extracted under the fail-closed policy (S003)
    #[error("[S003] Column references cannot be validated: {0}")]
    ColumnExtraction(String),

    /// Dialect name not recognised by strict resolution (S004)
    #[error("[S004] Unknown SQL dialect: {0}")]
    UnknownDialect(String),
}

impl SqlError {
    /// Whether this error came from the parser (as opposed to a validation step).
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, SqlError::Syntax { .. } | SqlError::EmptySql)
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
