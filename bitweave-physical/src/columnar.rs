//! This module collects data structures and operations on individual columns.

pub mod bitvector;
pub mod code;
pub mod column;
pub(crate) mod column_storage;
pub mod iterator;

pub use column_storage::ScanStatistics;
