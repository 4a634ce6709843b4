//! Raw character cursor over a source string.

use tarn_core::LinePragma;

/// Reads characters one at a time, tracking position, line and column.
#[derive(Debug, Clone)]
pub struct Reader {
    chars: Vec<char>,
    position: usize,
    pragma: LinePragma,
}

impl Reader {
    /// Create a reader positioned at the first character
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            pragma: LinePragma::START,
        }
    }

    /// Next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Consume the next character
    pub fn read(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.pragma = self.pragma.advance(ch);
        Some(ch)
    }

    /// Number of characters consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Line/column of the next character
    pub fn pragma(&self) -> LinePragma {
        self.pragma
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_peek() {
        let mut reader = Reader::new("ab");

        assert_eq!(reader.peek(), Some('a'));
        assert_eq!(reader.read(), Some('a'));
        assert_eq!(reader.read(), Some('b'));
        assert_eq!(reader.read(), None);
        assert!(reader.is_at_end());
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_line_tracking() {
        let mut reader = Reader::new("a\nbc");
        reader.read();
        reader.read();
        assert_eq!(reader.pragma(), LinePragma::new(2, 1));
        reader.read();
        assert_eq!(reader.pragma(), LinePragma::new(2, 2));
    }
}
