//! This module defines the trait [BitweavingStorage]
//! and [ColumnStorage], which collects its two implementations.

pub(crate) mod horizontal;
pub(crate) mod vertical;

use enum_dispatch::enum_dispatch;

use crate::{
    columnar::{
        bitvector::BitVector,
        code::{Code, Layout, Word},
    },
    error::Error,
    predicate::{CombineOp, ScanCondition},
};

use self::{horizontal::HorizontalStorage, vertical::VerticalStorage};

/// Counters collected while scanning a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    /// Number of storage words that were read
    pub words_read: usize,
    /// Number of segments whose outcome was decided without reading them
    pub segments_skipped: usize,
}

impl ScanStatistics {
    /// Add the counters of `other` to this object.
    pub fn merge(&mut self, other: ScanStatistics) {
        self.words_read += other.words_read;
        self.segments_skipped += other.segments_skipped;
    }
}

/// Packed storage of the codes of one column
#[enum_dispatch]
pub(crate) trait BitweavingStorage {
    /// Layout implemented by this storage.
    fn layout(&self) -> Layout;

    /// Number of bits per code.
    fn bit_width(&self) -> u8;

    /// Number of stored codes.
    fn num_rows(&self) -> usize;

    /// Packed words in storage order.
    fn words(&self) -> &[Word];

    /// Append codes, which must all fit into the bit width.
    fn append(&mut self, codes: &[Code]);

    /// Decode the code of `row`, which must be smaller than [BitweavingStorage::num_rows].
    fn code(&self, row: usize) -> Code;

    /// Evaluate `condition` for every row and merge the result into `bitvector`.
    ///
    /// Only the bits of rows `0..num_rows` are written.
    fn scan(
        &self,
        condition: ScanCondition,
        bitvector: &mut BitVector,
        op: CombineOp,
    ) -> ScanStatistics;
}

/// Storage in one of the two layouts
#[enum_dispatch(BitweavingStorage)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ColumnStorage {
    /// Case BitWeaving/H
    HorizontalStorage,
    /// Case BitWeaving/V
    VerticalStorage,
}

impl ColumnStorage {
    /// Create empty storage for the given layout.
    pub(crate) fn new(layout: Layout, bit_width: u8) -> Result<Self, Error> {
        layout.check_bit_width(bit_width)?;

        Ok(match layout {
            Layout::Horizontal => HorizontalStorage::new(bit_width).into(),
            Layout::Vertical => VerticalStorage::new(bit_width).into(),
        })
    }

    /// Restore storage from its packed words.
    ///
    /// Returns `None` if the words are not a valid encoding of `num_rows` codes.
    pub(crate) fn from_words(
        layout: Layout,
        bit_width: u8,
        num_rows: usize,
        words: Vec<Word>,
    ) -> Option<Self> {
        layout.check_bit_width(bit_width).ok()?;

        match layout {
            Layout::Horizontal => {
                HorizontalStorage::from_words(bit_width, num_rows, words).map(Self::from)
            }
            Layout::Vertical => {
                VerticalStorage::from_words(bit_width, num_rows, words).map(Self::from)
            }
        }
    }

    /// Number of words required to hold `num_rows` codes,
    /// or `None` if that number does not fit into a `usize`.
    pub(crate) fn expected_words(layout: Layout, bit_width: u8, num_rows: usize) -> Option<usize> {
        match layout {
            Layout::Horizontal => HorizontalStorage::expected_words(bit_width, num_rows),
            Layout::Vertical => VerticalStorage::expected_words(bit_width, num_rows),
        }
    }
}
