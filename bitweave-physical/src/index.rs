//! This module builds BitWeaving indexes from Arrow record batches
//! and evaluates batches of predicates against them.
//!
//! The result of a comparison is handed back as an Arrow [BooleanArray][arrow::array::BooleanArray],
//! which can be passed directly to [arrow::compute::filter].

pub mod build;
pub mod compare;

pub use build::{build_index, build_index_into, ColumnIndexUnit};
pub use compare::{compare, compare_batch, compare_into, CompareOptions, CompareOptionsUnit};
