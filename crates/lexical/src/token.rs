//! Lexemes and the tokens they produce

use crate::rule::LexicalRule;
use std::fmt;
use std::sync::Arc;
use tarn_core::LinePragma;

/// A named lexical rule.
///
/// Skippable lexemes (whitespace, comments) are matched but never emitted.
#[derive(Debug, Clone)]
pub struct Lexeme {
    identifier: String,
    rule: LexicalRule,
    skippable: bool,
}

impl Lexeme {
    pub fn new(identifier: impl Into<String>, rule: LexicalRule, skippable: bool) -> Self {
        Self {
            identifier: identifier.into(),
            rule,
            skippable,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn rule(&self) -> &LexicalRule {
        &self.rule
    }

    pub fn is_skippable(&self) -> bool {
        self.skippable
    }
}

/// An immutable (lexeme, text, position) triple
#[derive(Clone)]
pub struct Token {
    lexeme: Arc<Lexeme>,
    text: String,
    pragma: LinePragma,
}

impl Token {
    pub(crate) fn new(lexeme: Arc<Lexeme>, text: String, pragma: LinePragma) -> Self {
        Self { lexeme, text, pragma }
    }

    pub fn lexeme(&self) -> &Lexeme {
        &self.lexeme
    }

    /// Identifier of the lexeme that produced this token
    pub fn kind(&self) -> &str {
        self.lexeme.identifier()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of the first character of the token
    pub fn pragma(&self) -> LinePragma {
        self.pragma
    }

    /// Position just after the last character of the token
    pub fn end(&self) -> LinePragma {
        self.text.chars().fold(self.pragma, LinePragma::advance)
    }

    /// Whether this token was produced by the lexeme named `kind`
    pub fn is(&self, kind: &str) -> bool {
        self.kind() == kind
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.text == other.text && self.pragma == other.pragma
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) at {}", self.kind(), self.text, self.pragma)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
