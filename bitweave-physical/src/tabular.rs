//! This module collects data structures and operations for tables of BitWeaving columns.

pub mod table;

pub(crate) mod persist;
