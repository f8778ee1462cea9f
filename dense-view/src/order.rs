//! Storage order markers.

/// Which index varies fastest in memory.
pub trait StorageOrder: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    const IS_ROW_MAJOR: bool;

    /// Strides `(row_stride, col_stride)` of a packed `rows x cols` buffer.
    #[inline]
    fn packed_strides(rows: usize, cols: usize) -> (isize, isize) {
        if Self::IS_ROW_MAJOR {
            (cols as isize, 1)
        } else {
            (1, rows as isize)
        }
    }

    /// Linear position of `(i, j)` in a packed buffer.
    #[inline(always)]
    fn linear_index(i: usize, j: usize, rows: usize, cols: usize) -> usize {
        if Self::IS_ROW_MAJOR {
            i * cols + j
        } else {
            j * rows + i
        }
    }
}

/// First (row) index varies fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColMajor;

/// Last (column) index varies fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RowMajor;

impl StorageOrder for ColMajor {
    const IS_ROW_MAJOR: bool = false;
}

impl StorageOrder for RowMajor {
    const IS_ROW_MAJOR: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_strides() {
        assert_eq!(ColMajor::packed_strides(3, 4), (1, 3));
        assert_eq!(RowMajor::packed_strides(3, 4), (4, 1));
        assert_eq!(ColMajor::linear_index(2, 1, 3, 4), 5);
        assert_eq!(RowMajor::linear_index(2, 1, 3, 4), 9);
    }
}
