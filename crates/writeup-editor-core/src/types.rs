//! Cursor and selection types.
//!
//! Positions address a block by index and a character offset inside it.
//! Atomic blocks (images, rules) have length 1: offset 0 is before the
//! block, offset 1 after it.

/// A position in the document.
#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Index of the block.
    pub block: usize,
    /// Character offset (NOT byte offset!) inside the block.
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: Position,
    /// Where cursor is now
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position,
            head: position,
        }
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Blocks touched by the selection, in order.
    pub fn blocks(&self) -> std::ops::RangeInclusive<usize> {
        self.start().block..=self.end().block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_ordered() {
        let selection = Selection::new(Position::new(2, 1), Position::new(0, 4));
        assert_eq!(selection.start(), Position::new(0, 4));
        assert_eq!(selection.end(), Position::new(2, 1));
        assert_eq!(selection.blocks(), 0..=2);
        assert!(!selection.is_collapsed());
    }
}
