//! This module collects functionality for keeping track of resources.

pub mod bytesized;
