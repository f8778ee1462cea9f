//! Traversal order for 2-D kernels.
//!
//! Each operand ranks its two axes by stride magnitude; the ranks are packed
//! into an importance score per axis with the destination counted twice, and
//! the axis with the highest score becomes the inner loop.

/// Rank of each axis by `|stride|`, starting at 1.
///
/// Zero strides (broadcast axes) rank 1 so they never outweigh a real unit
/// stride in the other axis.
pub fn index_order(strides: [isize; 2]) -> [usize; 2] {
    let mut ranks = [1usize; 2];
    for (k, &s) in strides.iter().enumerate() {
        if s == 0 {
            continue;
        }
        let mine = s.unsigned_abs();
        for &other in &strides {
            if other != 0 && other.unsigned_abs() < mine {
                ranks[k] += 1;
            }
        }
    }
    ranks
}

/// Bit-packed importance of each axis; the first entry of `strides` is the
/// destination and weighs twice.
pub fn axis_importance(dims: [usize; 2], strides: &[[isize; 2]]) -> [u64; 2] {
    let count = strides.len() as u64;
    let g = 64 - (count + 1).leading_zeros() as u64;
    let mut importance = [0u64; 2];
    for (a, s) in strides.iter().enumerate() {
        let ranks = index_order(*s);
        let weight = if a == 0 { 2 } else { 1 };
        for k in 0..2 {
            let shift = g * (2 - ranks[k] as u64);
            importance[k] += weight * (1u64 << shift);
        }
    }
    for k in 0..2 {
        if dims[k] <= 1 {
            importance[k] = 0;
        }
    }
    importance
}

/// Axis to run innermost: `0` for rows, `1` for columns.
///
/// Ties (including all-size-1 shapes) keep the row axis inner.
pub fn inner_axis(dims: [usize; 2], strides: &[[isize; 2]]) -> usize {
    if strides.is_empty() {
        return 0;
    }
    let importance = axis_importance(dims, strides);
    if importance[1] > importance[0] {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        assert_eq!(index_order([1, 4]), [1, 2]);
        assert_eq!(index_order([5, 1]), [2, 1]);
        assert_eq!(index_order([0, 3]), [1, 1]);
        assert_eq!(index_order([-1, 4]), [1, 2]);
    }

    #[test]
    fn test_inner_axis_column_major() {
        assert_eq!(inner_axis([4, 5], &[[1, 4]]), 0);
    }

    #[test]
    fn test_inner_axis_row_major() {
        assert_eq!(inner_axis([4, 5], &[[5, 1]]), 1);
    }

    #[test]
    fn test_destination_outweighs_single_source() {
        // row-major dst, col-major src: dst wins
        assert_eq!(inner_axis([8, 8], &[[8, 1], [1, 8]]), 1);
        // two col-major sources outvote the dst
        assert_eq!(inner_axis([8, 8], &[[8, 1], [1, 8], [1, 8], [1, 8]]), 0);
    }

    #[test]
    fn test_size_one_axis_never_inner() {
        assert_eq!(inner_axis([1, 6], &[[1, 1]]), 1);
        assert_eq!(inner_axis([6, 1], &[[6, 1]]), 0);
    }
}
