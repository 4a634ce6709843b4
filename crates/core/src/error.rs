//! Core error types for Tarn

#[derive(thiserror::Error, Debug)]
pub enum TarnError {
    #[error("Lexical error: {0}")]
    Lexical(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TarnError>;
