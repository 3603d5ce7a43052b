//! Error types for the NL reader.
//!
//! This module provides a unified error type [`NlError`] that covers every
//! failure the reader can report: malformed tokens, values that violate a
//! cross-field constraint, and failures to load an input file.

use thiserror::Error;

/// Result type alias using [`NlError`].
pub type Result<T> = std::result::Result<T, NlError>;

/// Unified error type for all NL reader operations.
#[derive(Error, Debug)]
pub enum NlError {
    // ============ Positional Errors ============
    /// A token does not match the grammar expected at this position
    #[error("{source_name}:{line}:{column}: {message}")]
    Syntax {
        source_name: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A well-formed value violates a cross-field constraint
    #[error("{source_name}:{line}:{column}: {message}")]
    Semantic {
        source_name: String,
        line: usize,
        column: usize,
        message: String,
    },

    // ============ I/O Errors ============
    /// Error reading an NL file
    #[error("Failed to read NL file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl NlError {
    /// Create a syntax error
    pub fn syntax(
        source_name: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            source_name: source_name.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a semantic error
    pub fn semantic(
        source_name: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Semantic {
            source_name: source_name.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Returns the bare message without the position prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Syntax { message, .. } | Self::Semantic { message, .. } => message.clone(),
            Self::FileRead { source, .. } => source.to_string(),
        }
    }

    /// 1-based line of a positional error.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } | Self::Semantic { line, .. } => Some(*line),
            Self::FileRead { .. } => None,
        }
    }

    /// 1-based column of a positional error.
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Syntax { column, .. } | Self::Semantic { column, .. } => Some(*column),
            Self::FileRead { .. } => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_display() {
        let err = NlError::syntax("(input)", 11, 2, "expected nonnegative integer");
        assert_eq!(err.to_string(), "(input):11:2: expected nonnegative integer");
        assert!(err.is_syntax());

        let err = NlError::semantic("model.nl", 1, 2, "too many options");
        assert_eq!(err.to_string(), "model.nl:1:2: too many options");
        assert!(err.is_semantic());
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.column(), Some(2));
        assert_eq!(err.message(), "too many options");
    }

    #[test]
    fn test_file_read_display() {
        let err = NlError::FileRead {
            path: "missing.nl".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to read NL file 'missing.nl': not found");
        assert_eq!(err.line(), None);
    }
}
