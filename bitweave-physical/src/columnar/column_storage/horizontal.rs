//! This module defines [HorizontalStorage],
//! the BitWeaving/H layout.
//!
//! Every code occupies `bit_width + 1` bits of a word,
//! the topmost of which is a delimiter bit that is zero in storage.
//! Rows are grouped into segments of `bit_width + 1` words:
//! row `r` of a segment is stored in word `r % (bit_width + 1)`
//! at slot `r / (bit_width + 1)`.
//! With this arrangement the delimiter bits of the words of a segment,
//! each shifted by its word position, interleave into the match bits
//! of the segment in row order.

use std::mem::size_of;

use crate::{
    columnar::{
        bitvector::BitVector,
        code::{low_bits, max_code, Code, Layout, Word, WORD_BITS},
    },
    management::bytesized::{size_inner_vec_flat, ByteSized},
    predicate::{CombineOp, Comparator, ScanCondition},
};

use super::{BitweavingStorage, ScanStatistics};

/// Masks derived from the bit width of a horizontal column
///
/// These are computed once when the column is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HorizontalMasks {
    /// Number of bits per code
    bit_width: usize,
    /// Number of bits per slot, i.e. code and delimiter
    slot_bits: usize,
    /// Number of codes stored in one word
    codes_per_word: usize,
    /// Number of rows stored in one segment
    rows_per_segment: usize,
    /// Delimiter bit of every slot
    delimiters: Word,
    /// Code bits of every slot
    code_bits: Word,
    /// Lowest bit of every slot
    slot_ones: Word,
}

impl HorizontalMasks {
    /// Compute the masks for codes of `bit_width` bits.
    pub(crate) fn new(bit_width: u8) -> Self {
        let bit_width = usize::from(bit_width);
        debug_assert!(bit_width > 0 && bit_width < WORD_BITS);

        let slot_bits = bit_width + 1;
        let codes_per_word = WORD_BITS / slot_bits;

        let slot_ones =
            (0..codes_per_word).fold(0, |mask: Word, slot| mask | 1 << (slot * slot_bits));
        let delimiters = slot_ones << bit_width;
        let code_bits = slot_ones.wrapping_mul(low_bits(bit_width));

        Self {
            bit_width,
            slot_bits,
            codes_per_word,
            rows_per_segment: slot_bits * codes_per_word,
            delimiters,
            code_bits,
            slot_ones,
        }
    }

    /// Copy `constant` into the code bits of every slot.
    fn broadcast(&self, constant: Code) -> Word {
        constant.wrapping_mul(self.slot_ones)
    }

    /// Return the word index within its segment and the bit offset of a row.
    fn locate(&self, row: usize) -> (usize, usize) {
        let segment = row / self.rows_per_segment;
        let in_segment = row % self.rows_per_segment;

        let word = segment * self.slot_bits + in_segment % self.slot_bits;
        let shift = (in_segment / self.slot_bits) * self.slot_bits;

        (word, shift)
    }

    /// Delimiter bits of the slots whose code is at least the broadcast constant.
    fn greater_equal(&self, data: Word, constant: Word) -> Word {
        // Each slot computes 2^w + code - constant >= 1, so no borrow leaves a slot
        (data | self.delimiters).wrapping_sub(constant) & self.delimiters
    }

    /// Delimiter bits of the slots whose code is at most the broadcast constant.
    fn less_equal(&self, data: Word, constant: Word) -> Word {
        (constant | self.delimiters).wrapping_sub(data) & self.delimiters
    }

    /// Delimiter bits of the slots whose code differs from the broadcast constant.
    fn not_equal(&self, data: Word, constant: Word) -> Word {
        // Any nonzero difference carries into the delimiter, and never beyond
        (data ^ constant).wrapping_add(self.code_bits) & self.delimiters
    }

    /// Delimiter bits of the slots of `data` satisfying `comparator`.
    fn compare(&self, comparator: Comparator, data: Word, constant: Word) -> Word {
        match comparator {
            Comparator::Equal => !self.not_equal(data, constant) & self.delimiters,
            Comparator::NotEqual => self.not_equal(data, constant),
            Comparator::Less => !self.greater_equal(data, constant) & self.delimiters,
            Comparator::LessEqual => self.less_equal(data, constant),
            Comparator::Greater => !self.less_equal(data, constant) & self.delimiters,
            Comparator::GreaterEqual => self.greater_equal(data, constant),
        }
    }
}

/// BitWeaving/H storage of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HorizontalStorage {
    masks: HorizontalMasks,
    num_rows: usize,
    words: Vec<Word>,
}

impl HorizontalStorage {
    /// Create empty storage for codes of `bit_width` bits.
    pub(crate) fn new(bit_width: u8) -> Self {
        Self {
            masks: HorizontalMasks::new(bit_width),
            num_rows: 0,
            words: Vec::new(),
        }
    }

    /// Number of words required to store `num_rows` codes,
    /// or `None` if that number does not fit into a `usize`.
    pub(crate) fn expected_words(bit_width: u8, num_rows: usize) -> Option<usize> {
        let masks = HorizontalMasks::new(bit_width);
        num_rows
            .div_ceil(masks.rows_per_segment)
            .checked_mul(masks.slot_bits)
    }

    /// Restore storage from its packed words.
    pub(crate) fn from_words(bit_width: u8, num_rows: usize, words: Vec<Word>) -> Option<Self> {
        if Some(words.len()) != Self::expected_words(bit_width, num_rows) {
            return None;
        }

        let masks = HorizontalMasks::new(bit_width);
        if words.iter().any(|word| word & !masks.code_bits != 0) {
            return None;
        }

        // Slots of the last segment past the end must be empty
        let segment_end = num_rows.div_ceil(masks.rows_per_segment) * masks.rows_per_segment;
        let code_mask = low_bits(masks.bit_width);
        if (num_rows..segment_end).any(|row| {
            let (word, shift) = masks.locate(row);
            (words[word] >> shift) & code_mask != 0
        }) {
            return None;
        }

        Some(Self {
            masks,
            num_rows,
            words,
        })
    }

    fn num_segments(&self) -> usize {
        self.words.len() / self.masks.slot_bits
    }

    /// Evaluate `condition` for all slots of one word.
    fn evaluate_word(&self, condition: &PreparedCondition, data: Word) -> Word {
        match *condition {
            PreparedCondition::Compare(comparator, constant) => {
                self.masks.compare(comparator, data, constant)
            }
            PreparedCondition::Between(lower, upper) => {
                self.masks.greater_equal(data, lower) & self.masks.less_equal(data, upper)
            }
        }
    }
}

/// [ScanCondition] with its constants broadcast into every slot
#[derive(Debug, Clone, Copy)]
enum PreparedCondition {
    Compare(Comparator, Word),
    Between(Word, Word),
}

impl BitweavingStorage for HorizontalStorage {
    fn layout(&self) -> Layout {
        Layout::Horizontal
    }

    fn bit_width(&self) -> u8 {
        self.masks.bit_width as u8
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn words(&self) -> &[Word] {
        &self.words
    }

    fn append(&mut self, codes: &[Code]) {
        for &code in codes {
            debug_assert!(code <= max_code(self.bit_width()));

            if self.num_rows % self.masks.rows_per_segment == 0 {
                self.words.resize(self.words.len() + self.masks.slot_bits, 0);
            }

            let (word, shift) = self.masks.locate(self.num_rows);
            self.words[word] |= code << shift;
            self.num_rows += 1;
        }
    }

    fn code(&self, row: usize) -> Code {
        debug_assert!(row < self.num_rows);

        let (word, shift) = self.masks.locate(row);
        (self.words[word] >> shift) & max_code(self.bit_width())
    }

    fn scan(
        &self,
        condition: ScanCondition,
        bitvector: &mut BitVector,
        op: CombineOp,
    ) -> ScanStatistics {
        let condition = match condition {
            ScanCondition::Compare(comparator, constant) => {
                PreparedCondition::Compare(comparator, self.masks.broadcast(constant))
            }
            ScanCondition::Between(lower, upper) => {
                PreparedCondition::Between(self.masks.broadcast(lower), self.masks.broadcast(upper))
            }
        };

        let slot_bits = self.masks.slot_bits;
        let rows_per_segment = self.masks.rows_per_segment;

        for segment in 0..self.num_segments() {
            let segment_words = &self.words[segment * slot_bits..(segment + 1) * slot_bits];

            let mut result: Word = 0;
            for (position, &data) in segment_words.iter().enumerate() {
                // Move the delimiter of slot s from bit s * slot_bits + bit_width
                // to the row position s * slot_bits + position
                let matches = self.evaluate_word(&condition, data);
                result |= matches >> (self.masks.bit_width - position);
            }

            let first_row = segment * rows_per_segment;
            let rows = rows_per_segment.min(self.num_rows - first_row);
            bitvector.combine_bits(first_row, rows, result, op);
        }

        ScanStatistics {
            words_read: self.words.len(),
            segments_skipped: 0,
        }
    }
}

impl ByteSized for HorizontalStorage {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64 + size_inner_vec_flat(&self.words)
    }
}
