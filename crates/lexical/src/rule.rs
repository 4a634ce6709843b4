//! Lexical rule combinators
//!
//! A `LexicalRule` consumes characters from a `BranchedReader` and reports
//! whether it matched. A failed match may leave the branch partially
//! advanced; callers match on a fork and discard it on failure.

use crate::branch::BranchedReader;
use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Character test used by `LexicalRule::Predicate`
#[derive(Clone)]
pub struct CharPredicate(Arc<dyn Fn(char) -> bool + Send + Sync>);

impl CharPredicate {
    pub fn new(test: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(test))
    }

    pub fn test(&self, ch: char) -> bool {
        (self.0)(ch)
    }
}

impl fmt::Debug for CharPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharPredicate(..)")
    }
}

/// Combinator algebra over characters
#[derive(Debug, Clone)]
pub enum LexicalRule {
    /// One character from the set
    CharSet(BTreeSet<char>),

    /// One character not in the set
    NegativeCharSet(BTreeSet<char>),

    /// One character in `from..=to`
    CharRange { from: char, to: char },

    /// One character outside `from..=to`
    NegativeCharRange { from: char, to: char },

    /// Any single character
    AnyChar,

    /// One character accepted by the predicate
    Predicate(CharPredicate),

    /// Always matches, consumes nothing
    Empty,

    /// `first` then `second`
    Concatenate(Box<LexicalRule>, Box<LexicalRule>),

    /// The longer successful match of `first` and `second`
    Alternate(Box<LexicalRule>, Box<LexicalRule>),

    /// `content` repeated greedily between `min` and `max` times
    Repeat {
        content: Box<LexicalRule>,
        min: usize,
        max: Option<usize>,
    },
}

#[derive(Clone, Copy)]
enum Side {
    First,
    Second,
}

impl LexicalRule {
    /// One of the characters of `chars`
    pub fn chars(chars: &str) -> Self {
        LexicalRule::CharSet(chars.chars().collect())
    }

    /// Any character except those of `chars`
    pub fn none_of(chars: &str) -> Self {
        LexicalRule::NegativeCharSet(chars.chars().collect())
    }

    pub fn range(from: char, to: char) -> Self {
        LexicalRule::CharRange { from, to }
    }

    pub fn not_range(from: char, to: char) -> Self {
        LexicalRule::NegativeCharRange { from, to }
    }

    pub fn any() -> Self {
        LexicalRule::AnyChar
    }

    pub fn predicate(test: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        LexicalRule::Predicate(CharPredicate::new(test))
    }

    pub fn empty() -> Self {
        LexicalRule::Empty
    }

    /// The exact character sequence `text`
    pub fn literal(text: &str) -> Self {
        Self::sequence(text.chars().map(|c| LexicalRule::CharSet(BTreeSet::from([c]))))
    }

    /// Concatenation of all `rules`; empty input gives `Empty`
    pub fn sequence(rules: impl IntoIterator<Item = LexicalRule>) -> Self {
        rules
            .into_iter()
            .reduce(|acc, next| acc.then(next))
            .unwrap_or(LexicalRule::Empty)
    }

    /// Alternation of all `rules`; ties go to the earliest alternative
    pub fn alternatives(rules: impl IntoIterator<Item = LexicalRule>) -> Self {
        rules
            .into_iter()
            .reduce(|acc, next| acc.or(next))
            .unwrap_or(LexicalRule::Empty)
    }

    pub fn then(self, next: LexicalRule) -> Self {
        LexicalRule::Concatenate(Box::new(self), Box::new(next))
    }

    pub fn or(self, other: LexicalRule) -> Self {
        LexicalRule::Alternate(Box::new(self), Box::new(other))
    }

    pub fn repeat(self, min: usize, max: Option<usize>) -> Self {
        LexicalRule::Repeat {
            content: Box::new(self),
            min,
            max,
        }
    }

    /// Zero or more times
    pub fn many(self) -> Self {
        self.repeat(0, None)
    }

    /// One or more times
    pub fn at_least_once(self) -> Self {
        self.repeat(1, None)
    }

    /// Zero or one time
    pub fn optional(self) -> Self {
        self.repeat(0, Some(1))
    }

    /// Try to match at the branch's position, advancing it
    pub fn matches(&self, branch: &mut BranchedReader) -> Result<bool> {
        match self {
            LexicalRule::CharSet(set) => Self::consume_if(branch, |c| set.contains(&c)),
            LexicalRule::NegativeCharSet(set) => Self::consume_if(branch, |c| !set.contains(&c)),
            LexicalRule::CharRange { from, to } => {
                Self::consume_if(branch, |c| (*from..=*to).contains(&c))
            }
            LexicalRule::NegativeCharRange { from, to } => {
                Self::consume_if(branch, |c| !(*from..=*to).contains(&c))
            }
            LexicalRule::AnyChar => Self::consume_if(branch, |_| true),
            LexicalRule::Predicate(predicate) => Self::consume_if(branch, |c| predicate.test(c)),
            LexicalRule::Empty => Ok(true),
            LexicalRule::Concatenate(first, second) => {
                Ok(first.matches(branch)? && second.matches(branch)?)
            }
            LexicalRule::Alternate(first, second) => Self::match_alternate(first, second, branch),
            LexicalRule::Repeat { content, min, max } => {
                Self::match_repeat(content, *min, *max, branch)
            }
        }
    }

    fn consume_if(branch: &mut BranchedReader, accept: impl Fn(char) -> bool) -> Result<bool> {
        match branch.peek()? {
            Some(ch) if accept(ch) => {
                branch.read()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn match_alternate(
        first: &LexicalRule,
        second: &LexicalRule,
        branch: &mut BranchedReader,
    ) -> Result<bool> {
        let mut left = branch.new_branch()?;
        let mut right = branch.new_branch()?;
        let left_ok = first.matches(&mut left)?;
        let right_ok = second.matches(&mut right)?;

        let winner = match (left_ok, right_ok) {
            (true, true) if right.position() > left.position() => Some(Side::Second),
            (true, _) => Some(Side::First),
            (false, true) => Some(Side::Second),
            (false, false) => None,
        };

        match winner {
            Some(Side::First) => {
                branch.merge(&left)?;
            }
            Some(Side::Second) => {
                branch.merge(&right)?;
            }
            None => {}
        }

        left.dispose()?;
        right.dispose()?;
        Ok(winner.is_some())
    }

    fn match_repeat(
        content: &LexicalRule,
        min: usize,
        max: Option<usize>,
        branch: &mut BranchedReader,
    ) -> Result<bool> {
        let mut count = 0;

        while max.map_or(true, |max| count < max) {
            let mut attempt = branch.new_branch()?;
            if !content.matches(&mut attempt)? {
                break;
            }

            let advanced = attempt.position() > branch.position();
            branch.merge(&attempt)?;
            count += 1;

            // A zero-width repetition would repeat forever
            if !advanced {
                count = count.max(min);
                break;
            }
        }

        Ok(count >= min)
    }
}
