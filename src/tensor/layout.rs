//! DataLayout: the memory-order tag carried by tensor metadata

use std::fmt;

/// Memory-order tag recorded in tensor metadata
///
/// The tag is descriptive only: it never changes how bytes are addressed.
/// Sparse containers default to [`DataLayout::RowMajor`], the tag of a
/// row-major dense tensor with the same logical shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DataLayout {
    /// Row-major (C-order) dense layout
    #[default]
    RowMajor,
    /// Column-major (Fortran-order) dense layout
    ColumnMajor,
    /// Channels-last image layout
    ChannelsLast,
    /// Coordinate sparse layout
    SparseCoo,
    /// Compressed sparse row layout
    SparseCsr,
}

impl DataLayout {
    /// Returns the layout name as a string
    pub fn name(&self) -> &'static str {
        match self {
            DataLayout::RowMajor => "row_major",
            DataLayout::ColumnMajor => "column_major",
            DataLayout::ChannelsLast => "channels_last",
            DataLayout::SparseCoo => "sparse_coo",
            DataLayout::SparseCsr => "sparse_csr",
        }
    }

    /// Returns true for sparse layout tags
    #[inline]
    pub fn is_sparse(&self) -> bool {
        matches!(self, DataLayout::SparseCoo | DataLayout::SparseCsr)
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_row_major() {
        assert_eq!(DataLayout::default(), DataLayout::RowMajor);
        assert!(!DataLayout::RowMajor.is_sparse());
        assert!(DataLayout::SparseCsr.is_sparse());
    }

    #[test]
    fn test_layout_display() {
        assert_eq!(DataLayout::RowMajor.to_string(), "row_major");
        assert_eq!(DataLayout::SparseCoo.to_string(), "sparse_coo");
    }
}
