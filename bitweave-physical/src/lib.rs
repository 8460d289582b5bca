//! This crate implements the physical layer of BitWeaving,
//! a technique for evaluating range and equality predicates
//! directly on bit-packed column codes.
//!
//! Codes of a column are stored in one of two layouts
//! (see [Layout][columnar::code::Layout]) and scanned with bit-parallel
//! word operations, producing a [BitVector][columnar::bitvector::BitVector]
//! with one bit per row.

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

pub mod columnar;
pub mod config;
pub mod error;
pub mod index;
pub mod management;
pub mod predicate;
pub mod tabular;

/// Module for utility functions used in tests
#[cfg(test)]
pub(crate) mod util;
