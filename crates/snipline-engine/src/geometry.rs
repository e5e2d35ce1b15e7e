use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(line, col)` coordinate in the host buffer.
///
/// Both components are zero-based and `col` counts chars, not bytes. The
/// derived ordering compares `line` first, then `col`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Translates by `delta`. A nonzero line delta resets the column to
    /// `delta.col` instead of adding to it.
    #[must_use]
    pub fn translated(self, delta: Position) -> Position {
        if delta.line == 0 {
            Position::new(self.line, self.col + delta.col)
        } else {
            Position::new(self.line + delta.line, delta.col)
        }
    }

    /// Where this position lands when the text ending at `from` is changed
    /// so that it ends at `to`.
    ///
    /// Only meaningful for positions at or after `from`: positions on the
    /// same line keep their distance to the anchor, later lines keep their
    /// column and move by the line difference.
    #[must_use]
    pub fn shifted(self, from: Position, to: Position) -> Position {
        debug_assert!(self >= from, "shifting {self} which precedes anchor {from}");
        if self.line == from.line {
            Position::new(to.line, to.col + (self.col - from.col))
        } else {
            Position::new(self.line + to.line - from.line, self.col)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((line, col): (usize, usize)) -> Self {
        Self::new(line, col)
    }
}

/// The delta covered by `text`: its newline count and the length of its
/// final line segment. Feeding it to [`Position::translated`] yields the end
/// of `text` written at that position.
pub fn text_extent(text: &str) -> Position {
    match text.rfind('\n') {
        Some(idx) => Position::new(
            text.matches('\n').count(),
            text[idx + 1..].chars().count(),
        ),
        None => Position::new(0, text.chars().count()),
    }
}

/// A half-open range `[start, end)` of buffer positions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    /// An empty span sitting at `at`.
    pub fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Number of line breaks the span crosses.
    #[must_use]
    pub fn lines(self) -> usize {
        self.end.line - self.start.line
    }

    /// Inclusive on both ends: an empty span contains its own position.
    #[must_use]
    pub fn touches(self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    #[must_use]
    pub fn strictly_contains(self, pos: Position) -> bool {
        self.start < pos && pos < self.end
    }

    #[must_use]
    pub fn encloses(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
