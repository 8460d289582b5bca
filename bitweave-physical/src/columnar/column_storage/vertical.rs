//! This module defines [VerticalStorage],
//! the BitWeaving/V layout.
//!
//! Rows are grouped into segments of [WORD_BITS] rows.
//! Each segment stores one word per bit of the code ("bit-plane"),
//! starting with the most significant bit.
//! Row `j` of a segment corresponds to bit `j` of each of its words.

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

/// BitWeaving/V storage of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerticalStorage {
    bit_width: u8,
    num_rows: usize,
    /// Word `segment * bit_width + plane`
    words: Vec<Word>,
}

/// Running state of a comparison against one constant within a segment
#[derive(Debug, Clone, Copy)]
struct PlaneComparison {
    constant: Code,
    /// Rows equal to the prefix of the constant seen so far
    equal: Word,
    /// Rows already known to be smaller
    less: Word,
    /// Rows already known to be greater
    greater: Word,
}

impl PlaneComparison {
    fn new(constant: Code, candidates: Word) -> Self {
        Self {
            constant,
            equal: candidates,
            less: 0,
            greater: 0,
        }
    }

    /// Process bit-plane `plane` of a code with `bit_width` bits.
    fn step(&mut self, plane: usize, bit_width: usize, data: Word) {
        let constant_bit = (self.constant >> (bit_width - 1 - plane)) & 1;

        if constant_bit == 1 {
            self.less |= self.equal & !data;
            self.equal &= data;
        } else {
            self.greater |= self.equal & data;
            self.equal &= !data;
        }
    }

    fn is_decided(&self) -> bool {
        self.equal == 0
    }

    fn result(&self, comparator: Comparator, candidates: Word) -> Word {
        match comparator {
            Comparator::Equal => self.equal,
            Comparator::NotEqual => candidates & !self.equal,
            Comparator::Less => self.less,
            Comparator::LessEqual => self.less | self.equal,
            Comparator::Greater => self.greater,
            Comparator::GreaterEqual => self.greater | self.equal,
        }
    }
}

impl VerticalStorage {
    /// Create empty storage for codes of `bit_width` bits.
    pub(crate) fn new(bit_width: u8) -> Self {
        debug_assert!(bit_width > 0 && usize::from(bit_width) <= WORD_BITS);

        Self {
            bit_width,
            num_rows: 0,
            words: Vec::new(),
        }
    }

    /// Number of words required to store `num_rows` codes,
    /// or `None` if that number does not fit into a `usize`.
    pub(crate) fn expected_words(bit_width: u8, num_rows: usize) -> Option<usize> {
        num_rows
            .div_ceil(WORD_BITS)
            .checked_mul(usize::from(bit_width))
    }

    /// Restore storage from its packed words.
    pub(crate) fn from_words(bit_width: u8, num_rows: usize, words: Vec<Word>) -> Option<Self> {
        if Some(words.len()) != Self::expected_words(bit_width, num_rows) {
            return None;
        }

        let result = Self {
            bit_width,
            num_rows,
            words,
        };

        // Rows past the end must not carry any bits
        let segments = result.num_segments();
        if segments > 0 {
            let tail = !result.valid_rows(segments - 1);
            if result.segment(segments - 1).iter().any(|word| word & tail != 0) {
                return None;
            }
        }

        Some(result)
    }

    fn num_segments(&self) -> usize {
        self.num_rows.div_ceil(WORD_BITS)
    }

    fn segment(&self, segment: usize) -> &[Word] {
        let width = usize::from(self.bit_width);
        &self.words[segment * width..(segment + 1) * width]
    }

    /// Mask of the rows of `segment` that hold codes.
    fn valid_rows(&self, segment: usize) -> Word {
        low_bits(self.num_rows - segment * WORD_BITS)
    }

    /// Rows of a segment that still need to be evaluated under `op`.
    fn candidates(existing: Word, valid: Word, op: CombineOp) -> Word {
        match op {
            CombineOp::Set => valid,
            CombineOp::And => existing & valid,
            CombineOp::Or => !existing & valid,
        }
    }

    /// Compare the codes of a segment against `constant`, restricted to `candidates`.
    fn scan_compare(
        &self,
        segment: &[Word],
        comparator: Comparator,
        constant: Code,
        candidates: Word,
    ) -> (Word, usize) {
        let bit_width = usize::from(self.bit_width);
        let mut comparison = PlaneComparison::new(constant, candidates);
        let mut words_read = 0;

        for (plane, &data) in segment.iter().enumerate() {
            if comparison.is_decided() {
                break;
            }

            comparison.step(plane, bit_width, data);
            words_read += 1;
        }

        (comparison.result(comparator, candidates), words_read)
    }

    /// Evaluate `lower <= code <= upper` for a segment,
    /// sharing one pass over the bit-planes between both bounds.
    fn scan_between(
        &self,
        segment: &[Word],
        lower: Code,
        upper: Code,
        candidates: Word,
    ) -> (Word, usize) {
        let bit_width = usize::from(self.bit_width);
        let mut lower = PlaneComparison::new(lower, candidates);
        let mut upper = PlaneComparison::new(upper, candidates);
        let mut words_read = 0;

        for (plane, &data) in segment.iter().enumerate() {
            if lower.is_decided() && upper.is_decided() {
                break;
            }

            lower.step(plane, bit_width, data);
            upper.step(plane, bit_width, data);
            words_read += 1;
        }

        let result = lower.result(Comparator::GreaterEqual, candidates)
            & upper.result(Comparator::LessEqual, candidates);

        (result, words_read)
    }
}

impl BitweavingStorage for VerticalStorage {
    fn layout(&self) -> Layout {
        Layout::Vertical
    }

    fn bit_width(&self) -> u8 {
        self.bit_width
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn words(&self) -> &[Word] {
        &self.words
    }

    fn append(&mut self, codes: &[Code]) {
        let bit_width = usize::from(self.bit_width);

        for &code in codes {
            debug_assert!(code <= max_code(self.bit_width));

            let row = self.num_rows % WORD_BITS;
            if row == 0 {
                self.words.resize(self.words.len() + bit_width, 0);
            }

            let base = self.words.len() - bit_width;
            for plane in 0..bit_width {
                let bit = (code >> (bit_width - 1 - plane)) & 1;
                self.words[base + plane] |= bit << row;
            }

            self.num_rows += 1;
        }
    }

    fn code(&self, row: usize) -> Code {
        debug_assert!(row < self.num_rows);

        let position = row % WORD_BITS;
        self.segment(row / WORD_BITS)
            .iter()
            .fold(0, |code, word| (code << 1) | ((word >> position) & 1))
    }

    fn scan(
        &self,
        condition: ScanCondition,
        bitvector: &mut BitVector,
        op: CombineOp,
    ) -> ScanStatistics {
        let mut statistics = ScanStatistics::default();

        for segment in 0..self.num_segments() {
            let valid = self.valid_rows(segment);
            let candidates = Self::candidates(bitvector.word(segment), valid, op);

            // Segments fully decided by earlier scans need not be read
            if candidates == 0 && op != CombineOp::Set {
                statistics.segments_skipped += 1;
                continue;
            }

            let words = self.segment(segment);
            let (result, words_read) = match condition {
                ScanCondition::Compare(comparator, constant) => {
                    self.scan_compare(words, comparator, constant, candidates)
                }
                ScanCondition::Between(lower, upper) => {
                    self.scan_between(words, lower, upper, candidates)
                }
            };

            statistics.words_read += words_read;
            bitvector.combine_word(segment, result, valid, op);
        }

        statistics
    }
}

impl ByteSized for VerticalStorage {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64 + size_inner_vec_flat(&self.words)
    }
}
