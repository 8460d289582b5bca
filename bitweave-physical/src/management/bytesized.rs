//! This module defines the trait [ByteSized],
//! which should be implemented by types that can
//! calculate their own size.

use std::mem::size_of;

/// Objects that are able calculate their current approximate size in bytes.
///
/// We use `u64` rather than `usize` here to avoid overflows in case of overestimations.
pub trait ByteSized {
    /// Return the number of bytes this object consumes
    fn size_bytes(&self) -> u64;
}

/// Heap bytes reserved by a vector of plain values such as packed words.
pub(crate) fn size_inner_vec_flat<T>(object: &Vec<T>) -> u64 {
    object.capacity() as u64 * size_of::<T>() as u64
}
