//! Error types for the runtime crate

use tarn_core::{LinePragma, TarnError};

/// Script runtime error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// Error tagged with the innermost failing node
    #[error("{pragma} : {inner}")]
    At {
        pragma: LinePragma,
        inner: Box<ScriptError>,
    },

    /// Name not declared in any enclosing scope
    #[error("'{0}' is not defined")]
    Undefined(String),

    /// Name hoisted but not yet declared
    #[error("'{0}' is used before its declaration")]
    Unassigned(String),

    #[error("'{0}' is already declared in this scope")]
    AlreadyDeclared(String),

    /// Function and class bindings cannot be reassigned
    #[error("'{0}' cannot be assigned")]
    ConstantBinding(String),

    #[error("Label '{0}' is already declared")]
    DuplicateLabel(String),

    #[error("Label '{0}' not found")]
    LabelNotFound(String),

    #[error("'break' outside of a loop or switch")]
    MisplacedBreak,

    #[error("'continue' outside of a loop")]
    MisplacedContinue,

    #[error("'return' outside of a function")]
    MisplacedReturn,

    /// Wrong number of arguments
    #[error("'{name}' expects {expected} argument(s) but got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Operator '{op}' is not supported for {operands}")]
    OperatorNotSupported { op: String, operands: String },

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Member '{0}' not found")]
    MemberNotFound(String),

    #[error("Indexer not found on {0}")]
    IndexerNotFound(String),

    /// Read of a property that only has a setter
    #[error("Property '{0}' is write-only")]
    WriteOnly(String),

    /// Write of a property that only has a getter
    #[error("Property '{0}' is read-only")]
    ReadOnly(String),

    #[error("Invalid use of 'super': {0}")]
    InvalidSuper(String),

    #[error("'this' is not available here")]
    InvalidThis,

    #[error("Null reference: cannot access '{0}' of null")]
    NullReference(String),

    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("Cannot destructure {source_len} value(s) into {pattern_len} target(s)")]
    DestructuringMismatch {
        pattern_len: usize,
        source_len: usize,
    },

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("{0} is not a class")]
    NotAClass(String),

    #[error("Class '{class}' already declares '{member}'")]
    DuplicateMember { class: String, member: String },

    #[error("Class '{0}' declares more than one indexer on the same side")]
    DuplicateIndexer(String),

    #[error("Type error: {0}")]
    TypeMismatch(String),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: f64, len: usize },

    #[error("Maximum call depth of {0} exceeded")]
    StackOverflow(usize),

    /// Failure raised by host code
    #[error("{0}")]
    Native(String),

    /// Host requested cancellation
    #[error("Script cancelled")]
    Cancelled,
}

impl ScriptError {
    /// Tag the error with `pragma` unless it already carries a location
    pub fn at(self, pragma: LinePragma) -> Self {
        match self {
            ScriptError::At { .. } | ScriptError::Cancelled => self,
            other => ScriptError::At {
                pragma,
                inner: Box::new(other),
            },
        }
    }

    /// Location of the failing node, if tagged
    pub fn pragma(&self) -> Option<LinePragma> {
        match self {
            ScriptError::At { pragma, .. } => Some(*pragma),
            _ => None,
        }
    }

    /// The error without its location
    pub fn root_cause(&self) -> &ScriptError {
        match self {
            ScriptError::At { inner, .. } => inner.root_cause(),
            other => other,
        }
    }
}

impl From<ScriptError> for TarnError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Cancelled => TarnError::Cancelled,
            other => TarnError::Script(other.to_string()),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_message() {
        let err = ScriptError::Undefined("x".into()).at(LinePragma::new(3, 7));
        assert_eq!(err.to_string(), "<3,7> : 'x' is not defined");
    }

    #[test]
    fn test_innermost_location_wins() {
        let err = ScriptError::MemberNotFound("v".into())
            .at(LinePragma::new(2, 5))
            .at(LinePragma::new(1, 1));
        assert_eq!(err.pragma(), Some(LinePragma::new(2, 5)));
        assert_eq!(err.root_cause(), &ScriptError::MemberNotFound("v".into()));
    }

    #[test]
    fn test_cancellation_is_never_located() {
        let err = ScriptError::Cancelled.at(LinePragma::new(4, 2));
        assert_eq!(err, ScriptError::Cancelled);
        assert!(matches!(TarnError::from(err), TarnError::Cancelled));
    }
}
