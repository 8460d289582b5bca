//! Helpers for generating test data and evaluating predicates naively.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::{
    columnar::{
        bitvector::BitVector,
        code::{max_code, Code, Layout},
    },
    predicate::Comparator,
};

/// Every comparator
pub(crate) const COMPARATORS: [Comparator; 6] = [
    Comparator::Equal,
    Comparator::NotEqual,
    Comparator::Less,
    Comparator::LessEqual,
    Comparator::Greater,
    Comparator::GreaterEqual,
];

/// Every layout
pub(crate) const LAYOUTS: [Layout; 2] = [Layout::Horizontal, Layout::Vertical];

/// Seeded random number generator
pub(crate) fn rng(seed: u64) -> Pcg64 {
    Pcg64::seed_from_u64(seed)
}

/// Generate `count` uniformly distributed codes of `bit_width` bits.
pub(crate) fn random_codes(rng: &mut Pcg64, count: usize, bit_width: u8) -> Vec<Code> {
    let max = max_code(bit_width);
    (0..count).map(|_| rng.gen_range(0..=max)).collect()
}

/// Bitvector of `capacity` bits with row `i` set iff `condition(codes[i])` holds.
pub(crate) fn reference_bitvector(
    codes: &[Code],
    capacity: usize,
    condition: impl Fn(Code) -> bool,
) -> BitVector {
    let mut result = BitVector::new(capacity);
    for (row, &code) in codes.iter().enumerate() {
        if condition(code) {
            result
                .set_bit(row, true)
                .expect("capacity covers all codes");
        }
    }

    result
}
