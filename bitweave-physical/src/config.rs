//! This module collects the configuration of tables and index builds.

use serde::{Deserialize, Serialize};

use crate::columnar::code::Layout;

/// Options of a [BwTable][crate::tabular::table::BwTable]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Keep all columns in memory and never touch the filesystem
    pub in_memory: bool,
    /// Remove stored column files when opening the table
    pub delete_existing_files: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            in_memory: true,
            delete_existing_files: false,
        }
    }
}

impl TableOptions {
    /// Options for a table that is stored in a directory.
    pub fn persistent() -> Self {
        Self {
            in_memory: false,
            ..Default::default()
        }
    }
}

/// Bit width from which columns are stored vertically by default
pub const DEFAULT_VERTICAL_FROM_WIDTH: u8 = 8;

/// Rule for choosing the layout of a column whose layout was not given explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    /// Columns with at least this many bits use [Layout::Vertical]
    pub vertical_from_width: u8,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            vertical_from_width: DEFAULT_VERTICAL_FROM_WIDTH,
        }
    }
}

impl LayoutPolicy {
    /// Layout for a column of `bit_width` bits.
    pub fn choose(&self, bit_width: u8) -> Layout {
        if bit_width >= self.vertical_from_width || bit_width > Layout::Horizontal.max_bit_width()
        {
            Layout::Vertical
        } else {
            Layout::Horizontal
        }
    }
}

#[cfg(test)]
mod test {
    use super::{LayoutPolicy, TableOptions};
    use crate::columnar::code::Layout;

    #[test]
    fn layout_policy() {
        let policy = LayoutPolicy::default();
        assert_eq!(policy.choose(1), Layout::Horizontal);
        assert_eq!(policy.choose(7), Layout::Horizontal);
        assert_eq!(policy.choose(8), Layout::Vertical);
        assert_eq!(policy.choose(64), Layout::Vertical);

        let horizontal = LayoutPolicy {
            vertical_from_width: u8::MAX,
        };
        assert_eq!(horizontal.choose(63), Layout::Horizontal);
        assert_eq!(horizontal.choose(64), Layout::Vertical);
    }

    #[test]
    fn options_defaults() {
        let options = TableOptions::default();
        assert!(options.in_memory);
        assert!(!options.delete_existing_files);
        assert!(!TableOptions::persistent().in_memory);
    }
}
