//! Source position types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based (line, column) location in the source text.
///
/// Every token, AST node and located error carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinePragma {
    pub line: u32,
    pub column: u32,
}

impl LinePragma {
    /// Sentinel for "past the end of input"
    pub const EOF: LinePragma = LinePragma {
        line: u32::MAX,
        column: u32::MAX,
    };

    /// Position of the first character of a source
    pub const START: LinePragma = LinePragma { line: 1, column: 1 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_eof(&self) -> bool {
        *self == Self::EOF
    }

    /// Position after reading `ch` at this position
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self {
                line: self.line.saturating_add(1),
                column: 1,
            }
        } else {
            Self {
                line: self.line,
                column: self.column.saturating_add(1),
            }
        }
    }
}

impl Default for LinePragma {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for LinePragma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "<EOF>")
        } else {
            write!(f, "<{},{}>", self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines() {
        let pos = LinePragma::START.advance('a').advance('b');
        assert_eq!(pos, LinePragma::new(1, 3));

        let pos = pos.advance('\n');
        assert_eq!(pos, LinePragma::new(2, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(LinePragma::new(3, 14).to_string(), "<3,14>");
        assert_eq!(LinePragma::EOF.to_string(), "<EOF>");
    }

    #[test]
    fn test_eof_sorts_last() {
        assert!(LinePragma::new(1000, 1) < LinePragma::EOF);
    }
}
