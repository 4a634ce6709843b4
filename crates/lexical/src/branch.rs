//! Branching cursors over a shared unit stream
//!
//! A branch is an independently advanced cursor that belongs to a sharing
//! group. Every unit pulled from the underlying source is pushed onto the
//! pending buffer of every group member, so a sibling that is behind never
//! re-reads the source. Disposing the last member releases the source.
//!
//! The same machinery serves characters (`BranchedReader`) and tokens
//! (`BranchedLexer`).

use crate::error::{LexicalError, Result};
use crate::lexer::Lexer;
use crate::reader::Reader;
use crate::token::Token;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use tarn_core::LinePragma;

/// A source of units that branches can share
pub trait UnitSource {
    type Unit: Clone;

    /// Pull the next unit, `None` at end of input
    fn pull(&mut self) -> Result<Option<Self::Unit>>;

    /// Position after consuming `unit` at `at`
    fn step(unit: &Self::Unit, at: LinePragma) -> LinePragma;
}

impl UnitSource for Reader {
    type Unit = char;

    fn pull(&mut self) -> Result<Option<char>> {
        Ok(self.read())
    }

    fn step(unit: &char, at: LinePragma) -> LinePragma {
        at.advance(*unit)
    }
}

/// Character branches over a `Reader`
pub type BranchedReader = Branch<Reader>;

/// Token branches over a `Lexer`
pub type BranchedLexer = Branch<Lexer>;

/// Shared state of one sharing group
struct Group<S: UnitSource> {
    /// Released once the last member is disposed
    source: Option<S>,

    /// Pending units per member id
    buffers: HashMap<usize, VecDeque<S::Unit>>,

    next_id: usize,
}

impl<S: UnitSource> Group<S> {
    /// Make sure member `id` has at least one pending unit if the source has one
    fn fill(&mut self, id: usize) -> Result<()> {
        let pending = self.buffers.get(&id).map_or(0, VecDeque::len);
        if pending > 0 {
            return Ok(());
        }

        let Some(source) = self.source.as_mut() else {
            return Err(LexicalError::Disposed);
        };

        if let Some(unit) = source.pull()? {
            for buffer in self.buffers.values_mut() {
                buffer.push_back(unit.clone());
            }
        }
        Ok(())
    }
}

/// An independently advanced cursor of a sharing group
pub struct Branch<S: UnitSource> {
    group: Rc<RefCell<Group<S>>>,
    id: usize,
    position: usize,
    pragma: LinePragma,
    disposed: bool,
}

impl<S: UnitSource> Branch<S> {
    /// Create the first branch of a new group over `source`
    pub fn new(source: S) -> Self {
        let mut buffers = HashMap::new();
        buffers.insert(0, VecDeque::new());

        Self {
            group: Rc::new(RefCell::new(Group {
                source: Some(source),
                buffers,
                next_id: 1,
            })),
            id: 0,
            position: 0,
            pragma: LinePragma::START,
            disposed: false,
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.disposed {
            Err(LexicalError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Next unit without consuming it
    pub fn peek(&self) -> Result<Option<S::Unit>> {
        self.ensure_alive()?;
        let mut group = self.group.borrow_mut();
        group.fill(self.id)?;
        Ok(group.buffers.get(&self.id).and_then(|b| b.front().cloned()))
    }

    /// Consume one unit
    pub fn read(&mut self) -> Result<Option<S::Unit>> {
        self.ensure_alive()?;
        let unit = {
            let mut group = self.group.borrow_mut();
            group.fill(self.id)?;
            group.buffers.get_mut(&self.id).and_then(VecDeque::pop_front)
        };

        if let Some(unit) = &unit {
            self.position += 1;
            self.pragma = S::step(unit, self.pragma);
        }
        Ok(unit)
    }

    /// Fork an independent cursor at the current position
    pub fn new_branch(&self) -> Result<Self> {
        self.ensure_alive()?;
        let mut group = self.group.borrow_mut();
        let id = group.next_id;
        group.next_id += 1;

        let pending = group.buffers.get(&self.id).cloned().unwrap_or_default();
        group.buffers.insert(id, pending);

        Ok(Self {
            group: Rc::clone(&self.group),
            id,
            position: self.position,
            pragma: self.pragma,
            disposed: false,
        })
    }

    /// Whether both branches read from the same underlying source
    pub fn has_same_root(&self, other: &Self) -> Result<bool> {
        self.ensure_alive()?;
        other.ensure_alive()?;
        Ok(Rc::ptr_eq(&self.group, &other.group))
    }

    /// Units consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Line/column after the units consumed so far
    pub fn pragma(&self) -> LinePragma {
        self.pragma
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Move to `other`'s position.
    ///
    /// Returns the consumed units when moving forward and `None` when
    /// rewinding.
    fn merge_units(&mut self, other: &Self) -> Result<Option<Vec<S::Unit>>> {
        if !self.has_same_root(other)? {
            return Err(LexicalError::DifferentRoot);
        }

        if other.position >= self.position {
            let count = other.position - self.position;
            let mut units = Vec::with_capacity(count);
            for _ in 0..count {
                match self.read()? {
                    Some(unit) => units.push(unit),
                    None => break,
                }
            }
            return Ok(Some(units));
        }

        let mut group = self.group.borrow_mut();
        let pending = group.buffers.get(&other.id).cloned().unwrap_or_default();
        group.buffers.insert(self.id, pending);
        self.position = other.position;
        self.pragma = other.pragma;
        tracing::trace!(branch = self.id, position = self.position, "rewound branch");
        Ok(None)
    }

    /// Leave the group; the source is released with the last member
    pub fn dispose(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.release();
        Ok(())
    }

    fn release(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let mut group = self.group.borrow_mut();
        group.buffers.remove(&self.id);
        if group.buffers.is_empty() && group.source.take().is_some() {
            tracing::trace!("branch group empty, source released");
        }
    }
}

impl BranchedReader {
    /// Start a branch group over `reader`
    pub fn from_reader(reader: Reader) -> Self {
        Self::new(reader)
    }

    /// Move to `other`'s position, returning the skipped text when moving
    /// forward and `None` when rewinding.
    pub fn merge(&mut self, other: &Self) -> Result<Option<String>> {
        Ok(self.merge_units(other)?.map(|chars| chars.into_iter().collect()))
    }
}

impl BranchedLexer {
    /// Start a branch group over `lexer`
    pub fn from_lexer(lexer: Lexer) -> Self {
        Self::new(lexer)
    }

    /// Move to `other`'s position, returning the skipped tokens when moving
    /// forward and `None` when rewinding.
    pub fn merge(&mut self, other: &Self) -> Result<Option<Vec<Token>>> {
        self.merge_units(other)
    }
}

impl<S: UnitSource> Drop for Branch<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S: UnitSource> fmt::Debug for Branch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("pragma", &self.pragma)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    fn reader(source: &str) -> BranchedReader {
        BranchedReader::from_reader(Reader::new(source))
    }

    fn read_n(branch: &mut BranchedReader, n: usize) -> String {
        (0..n).filter_map(|_| branch.read().unwrap()).collect()
    }

    #[test]
    fn test_branch_isolation() {
        let mut primal = reader("abcdef");
        let mut sibling = primal.new_branch().unwrap();

        assert_eq!(read_n(&mut primal, 3), "abc");
        assert_eq!(primal.position(), 3);

        // Sibling has not moved
        assert_eq!(sibling.position(), 0);
        assert_eq!(sibling.peek().unwrap(), Some('a'));
        assert_eq!(read_n(&mut sibling, 2), "ab");
        assert_eq!(primal.peek().unwrap(), Some('d'));
    }

    #[test]
    fn test_merge_forward_returns_consumed_text() {
        let mut primal = reader("hello world");
        let mut ahead = primal.new_branch().unwrap();
        read_n(&mut ahead, 5);

        let text = primal.merge(&ahead).unwrap();
        assert_eq!(text.as_deref(), Some("hello"));
        assert_eq!(primal.position(), 5);
        assert_eq!(primal.peek().unwrap(), Some(' '));
    }

    #[test]
    fn test_merge_backward_rewinds() {
        let mut primal = reader("abcdef");
        let behind = primal.new_branch().unwrap();
        read_n(&mut primal, 4);

        let pulled = primal.group.borrow().source.as_ref().map(Reader::position);
        assert_eq!(pulled, Some(4));

        assert_eq!(primal.merge(&behind).unwrap(), None);
        assert_eq!(primal.position(), 0);
        assert_eq!(primal.pragma(), LinePragma::START);

        // Rewinding replays buffered units without touching the source
        let pulled = primal.group.borrow().source.as_ref().map(Reader::position);
        assert_eq!(pulled, Some(4));
        assert_eq!(read_n(&mut primal, 4), "abcd");
        let pulled = primal.group.borrow().source.as_ref().map(Reader::position);
        assert_eq!(pulled, Some(4));
        assert_eq!(read_n(&mut primal, 2), "ef");
    }

    #[test]
    fn test_merge_tracks_lines() {
        let mut primal = reader("a\nb");
        let mut ahead = primal.new_branch().unwrap();
        read_n(&mut ahead, 2);

        primal.merge(&ahead).unwrap();
        assert_eq!(primal.pragma(), LinePragma::new(2, 1));
    }

    #[test]
    fn test_new_branch_inherits_pending_units() {
        let mut primal = reader("xyz");
        let mut first = primal.new_branch().unwrap();
        read_n(&mut first, 3);

        // primal has "xyz" pending; a fork of primal must see it too
        let mut second = primal.new_branch().unwrap();
        assert_eq!(read_n(&mut second, 3), "xyz");
    }

    #[test]
    fn test_dispose_rejects_further_use() {
        let mut primal = reader("abc");
        let mut branch = primal.new_branch().unwrap();
        branch.dispose().unwrap();

        assert_eq!(branch.read(), Err(LexicalError::Disposed));
        assert_eq!(branch.peek(), Err(LexicalError::Disposed));
        assert_eq!(branch.dispose(), Err(LexicalError::Disposed));
        assert!(branch.has_same_root(&primal).is_err());

        // The rest of the group keeps working
        assert_eq!(primal.read().unwrap(), Some('a'));
    }

    #[test]
    fn test_last_dispose_releases_source() {
        let mut primal = reader("abc");
        let mut branch = primal.new_branch().unwrap();
        primal.dispose().unwrap();

        assert_eq!(read_n(&mut branch, 3), "abc");
        branch.dispose().unwrap();
        assert!(branch.group.borrow().source.is_none());
    }

    #[test]
    fn test_same_root() {
        let primal = reader("abc");
        let branch = primal.new_branch().unwrap();
        let other = reader("abc");

        assert!(primal.has_same_root(&branch).unwrap());
        assert!(!primal.has_same_root(&other).unwrap());
    }

    #[test]
    fn test_merge_different_roots_fails() {
        let mut primal = reader("abc");
        let other = reader("abc");
        assert_eq!(primal.merge(&other), Err(LexicalError::DifferentRoot));
    }

    #[test]
    fn test_branched_lexer_rollback() {
        let lexer = grammar::script_lexer("a + b");
        let mut primal = BranchedLexer::from_lexer(lexer);
        let mut attempt = primal.new_branch().unwrap();

        let first = attempt.read().unwrap().unwrap();
        let second = attempt.read().unwrap().unwrap();
        assert_eq!(first.text(), "a");
        assert_eq!(second.text(), "+");

        // Accept the first token only
        let mut accepted = primal.new_branch().unwrap();
        accepted.read().unwrap();
        let tokens = primal.merge(&accepted).unwrap().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(primal.peek().unwrap().unwrap().text(), "+");

        // Positions are reported after the consumed token
        assert_eq!(primal.pragma(), LinePragma::new(1, 2));
        assert_eq!(attempt.pragma(), LinePragma::new(1, 4));

        // The attempt rewinds to where primal stands
        assert_eq!(attempt.merge(&primal).unwrap(), None);
        assert_eq!(attempt.position(), 1);
    }
}
