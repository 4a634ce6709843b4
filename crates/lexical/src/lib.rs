//! # Tarn Lexical Analysis
//!
//! Backtracking lexer over raw text.
//!
//! ## Features
//! - Character reader with line/column tracking
//! - Branching cursors that share one read buffer
//! - Combinator algebra for lexical rules
//! - Longest-match lexer with skippable lexemes
//! - Token-level branching for speculative parsing
//!
//! ## Threading
//!
//! Branch groups are `Rc` based and mutated in place. A reader, a lexer and
//! all of their branches must stay on one thread.

pub mod error;
pub mod reader;
pub mod branch;
pub mod rule;
pub mod token;
pub mod lexer;
pub mod grammar;

pub use error::{LexicalError, Result};
pub use reader::Reader;
pub use branch::{Branch, BranchedLexer, BranchedReader, UnitSource};
pub use rule::{CharPredicate, LexicalRule};
pub use token::{Lexeme, Token};
pub use lexer::{Lexer, LexerBuilder};
