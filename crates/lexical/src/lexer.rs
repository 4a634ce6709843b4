//! Longest-match lexer
//!
//! Every registered lexeme is tried on its own fork of the reader. The
//! candidate that consumed the most characters wins; on equal length the
//! earliest registered lexeme wins. Skippable winners are consumed and the
//! search restarts.

use crate::branch::{BranchedReader, UnitSource};
use crate::error::{LexicalError, Result};
use crate::reader::Reader;
use crate::rule::LexicalRule;
use crate::token::{Lexeme, Token};
use std::sync::Arc;
use tarn_core::LinePragma;

/// Registry of lexemes shared by every lexer it builds
#[derive(Debug, Clone, Default)]
pub struct LexerBuilder {
    lexemes: Vec<Arc<Lexeme>>,
}

impl LexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an emitted lexeme
    pub fn lexeme(&mut self, identifier: impl Into<String>, rule: LexicalRule) -> &mut Self {
        self.lexemes.push(Arc::new(Lexeme::new(identifier, rule, false)));
        self
    }

    /// Register a lexeme that is matched but never emitted
    pub fn skippable(&mut self, identifier: impl Into<String>, rule: LexicalRule) -> &mut Self {
        self.lexemes.push(Arc::new(Lexeme::new(identifier, rule, true)));
        self
    }

    pub fn lexemes(&self) -> &[Arc<Lexeme>] {
        &self.lexemes
    }

    /// Create a lexer over `source`
    pub fn build(&self, source: &str) -> Lexer {
        Lexer {
            reader: BranchedReader::from_reader(Reader::new(source)),
            lexemes: self.lexemes.iter().cloned().collect(),
            lookahead: None,
        }
    }
}

/// Token stream with one token of lookahead
#[derive(Debug)]
pub struct Lexer {
    reader: BranchedReader,
    lexemes: Arc<[Arc<Lexeme>]>,
    lookahead: Option<Token>,
}

impl Lexer {
    /// Next token without consuming it
    pub fn peek(&mut self) -> Result<Option<Token>> {
        if self.lookahead.is_none() {
            self.lookahead = self.match_next()?;
        }
        Ok(self.lookahead.clone())
    }

    /// Consume the next token; `None` at end of input
    pub fn read(&mut self) -> Result<Option<Token>> {
        match self.lookahead.take() {
            Some(token) => Ok(Some(token)),
            None => self.match_next(),
        }
    }

    /// Drain every remaining token
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.read()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Position of the next unread character
    pub fn pragma(&self) -> LinePragma {
        self.reader.pragma()
    }

    fn match_next(&mut self) -> Result<Option<Token>> {
        let lexemes = Arc::clone(&self.lexemes);

        loop {
            if self.reader.peek()?.is_none() {
                return Ok(None);
            }

            let start = self.reader.position();
            let pragma = self.reader.pragma();
            let mut best: Option<(BranchedReader, &Arc<Lexeme>)> = None;

            for lexeme in lexemes.iter() {
                let mut branch = self.reader.new_branch()?;
                if !lexeme.rule().matches(&mut branch)? || branch.position() <= start {
                    continue;
                }

                let longer = best
                    .as_ref()
                    .map_or(true, |(current, _)| branch.position() > current.position());
                if longer {
                    best = Some((branch, lexeme));
                }
            }

            let Some((mut winner, lexeme)) = best else {
                tracing::debug!(%pragma, "no lexeme matched");
                return Err(LexicalError::NoLexemeMatched { pragma });
            };

            let text = self.reader.merge(&winner)?.unwrap_or_default();
            winner.dispose()?;

            if lexeme.is_skippable() {
                tracing::trace!(lexeme = lexeme.identifier(), %pragma, "skipped");
                continue;
            }

            tracing::trace!(lexeme = lexeme.identifier(), text = %text, %pragma, "token");
            return Ok(Some(Token::new(Arc::clone(lexeme), text, pragma)));
        }
    }
}

impl UnitSource for Lexer {
    type Unit = Token;

    fn pull(&mut self) -> Result<Option<Token>> {
        self.read()
    }

    fn step(unit: &Token, _at: LinePragma) -> LinePragma {
        unit.end()
    }
}
