//! This module defines [BitVectorIterator],
//! a cursor over the set bits of a [BitVector],
//! and [CodeIterator], which decodes the codes of the selected rows.

use crate::{
    columnar::{bitvector::BitVector, code::Code, column::Column},
    error::Error,
};

/// Position of a [BitVectorIterator]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IteratorState {
    /// [BitVectorIterator::advance] has not been called yet
    Uninitialized,
    /// Points to a set bit
    Positioned(usize),
    /// No set bits remain
    Exhausted,
}

/// Single-pass cursor over the set bits of a [BitVector] in ascending order
#[derive(Debug)]
pub struct BitVectorIterator<'a> {
    bitvector: &'a BitVector,
    state: IteratorState,
}

impl<'a> BitVectorIterator<'a> {
    /// Create a new iterator, which is not yet positioned on any row.
    pub fn new(bitvector: &'a BitVector) -> Self {
        Self {
            bitvector,
            state: IteratorState::Uninitialized,
        }
    }

    /// Move to the next set bit.
    ///
    /// Returns `false` once no set bits remain.
    pub fn advance(&mut self) -> bool {
        let from = match self.state {
            IteratorState::Uninitialized => 0,
            IteratorState::Positioned(row) => row + 1,
            IteratorState::Exhausted => return false,
        };

        self.state = match self.bitvector.next_set_bit(from) {
            Some(row) => IteratorState::Positioned(row),
            None => IteratorState::Exhausted,
        };

        matches!(self.state, IteratorState::Positioned(_))
    }

    /// Row the iterator currently points to.
    pub fn row(&self) -> Option<usize> {
        match self.state {
            IteratorState::Positioned(row) => Some(row),
            _ => None,
        }
    }

    /// Whether all set bits have been visited.
    pub fn is_exhausted(&self) -> bool {
        self.state == IteratorState::Exhausted
    }

    /// Decode the code of the current row from `column`.
    ///
    /// # Errors
    /// Returns [Error::InvalidIteratorState] if the iterator is not positioned on a row
    /// and [Error::IndexOutOfBounds] if the row lies beyond the end of `column`.
    pub fn code(&self, column: &Column) -> Result<Code, Error> {
        match self.state {
            IteratorState::Positioned(row) => column.code(row),
            _ => Err(Error::InvalidIteratorState),
        }
    }

    /// Decode the codes of all remaining rows from `column`.
    pub fn codes(self, column: &'a Column) -> CodeIterator<'a> {
        CodeIterator { rows: self, column }
    }
}

impl Iterator for BitVectorIterator<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.row()
        } else {
            None
        }
    }
}

/// Iterator over the rows of a [BitVector] together with their codes in a [Column]
#[derive(Debug)]
pub struct CodeIterator<'a> {
    rows: BitVectorIterator<'a>,
    column: &'a Column,
}

impl Iterator for CodeIterator<'_> {
    type Item = Result<(usize, Code), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.column.code(row).map(|code| (row, code)))
    }
}
