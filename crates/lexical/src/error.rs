//! Error types for the lexical crate

use tarn_core::{LinePragma, TarnError};

/// Lexical error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexicalError {
    /// No registered lexeme matched at a position
    #[error("{pragma} : No lexeme matched")]
    NoLexemeMatched { pragma: LinePragma },

    /// A branch was used after `dispose`
    #[error("Branch has been disposed")]
    Disposed,

    /// Two branches of different sources were combined
    #[error("Branches do not share the same root")]
    DifferentRoot,
}

impl From<LexicalError> for TarnError {
    fn from(err: LexicalError) -> Self {
        TarnError::Lexical(err.to_string())
    }
}

/// Result type for lexical operations
pub type Result<T> = std::result::Result<T, LexicalError>;
