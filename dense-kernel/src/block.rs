//! Cache tile selection for 2-D kernels.
//!
//! Axes are given in traversal order (inner first). A tile keeps the full
//! extent of every axis whose footprint fits in [`BLOCK_MEMORY_SIZE`]; when it
//! doesn't, the most expensive axis is halved and then decremented until the
//! estimated footprint fits.

use crate::order::index_order;
use crate::{BLOCK_MEMORY_SIZE, CACHE_LINE_SIZE};

/// Tile extents for a traversal over `dims`, one `strides` entry per operand
/// (element strides, same axis order as `dims`).
pub fn tile_shape(dims: [usize; 2], strides: &[[isize; 2]], elem_size: usize) -> [usize; 2] {
    if strides.is_empty() {
        return dims;
    }
    let elem = elem_size.max(1) as isize;
    let bytes: Vec<[isize; 2]> = strides.iter().map(|s| [s[0] * elem, s[1] * elem]).collect();
    let ranks: Vec<[usize; 2]> = bytes.iter().map(|s| index_order(*s)).collect();
    let costs = axis_costs(strides);

    let mut tile = dims;
    shrink(&mut tile, costs, &bytes, &ranks, BLOCK_MEMORY_SIZE);
    tile
}

fn shrink(
    tile: &mut [usize; 2],
    costs: [isize; 2],
    bytes: &[[isize; 2]],
    ranks: &[[usize; 2]],
    budget: usize,
) {
    for first in 0..2 {
        if memory_region(&tile[first..], bytes, first) <= budget {
            return;
        }

        let min_rank = ranks
            .iter()
            .flat_map(|r| r[first..].iter().copied())
            .min()
            .unwrap_or(1);
        if ranks.iter().all(|r| r[first] == min_rank) {
            // unit-ish stride everywhere: keep this axis whole
            continue;
        }

        let min_stride = bytes
            .iter()
            .flat_map(|s| s[first..].iter().map(|x| x.unsigned_abs()))
            .min()
            .unwrap_or(0);
        if min_stride > budget {
            tile[first..].fill(1);
            return;
        }

        let costs = &costs[first..];
        while memory_region(&tile[first..], bytes, first) >= 2 * budget {
            match last_argmax_weighted(&tile[first..], costs) {
                Some(k) => tile[first + k] = tile[first + k].div_ceil(2),
                None => break,
            }
        }
        while memory_region(&tile[first..], bytes, first) > budget {
            match last_argmax_weighted(&tile[first..], costs) {
                Some(k) => tile[first + k] -= 1,
                None => break,
            }
        }
        return;
    }
}

/// Per-axis traversal cost: twice the smallest `|stride|` over operands, with
/// broadcast (zero-stride) axes costing 1.
pub(crate) fn axis_costs(strides: &[[isize; 2]]) -> [isize; 2] {
    let mut costs = [0isize; 2];
    for (k, cost) in costs.iter_mut().enumerate() {
        let min = strides.iter().map(|s| s[k].abs()).min().unwrap_or(0);
        *cost = if min == 0 { 1 } else { 2 * min };
    }
    costs
}

/// Estimated bytes touched by a tile, counting whole cache lines.
///
/// `first` selects the trailing axes of each operand's byte strides that line
/// up with `dims`.
pub(crate) fn memory_region(dims: &[usize], bytes: &[[isize; 2]], first: usize) -> usize {
    let mut region = 0usize;
    for strides in bytes {
        let mut contiguous = 0usize;
        let mut line_blocks = 1usize;
        for (&d, &s) in dims.iter().zip(&strides[first..]) {
            let s = s.unsigned_abs();
            if s < CACHE_LINE_SIZE {
                contiguous += d.saturating_sub(1) * s;
            } else {
                line_blocks *= d;
            }
        }
        region += CACHE_LINE_SIZE * (contiguous / CACHE_LINE_SIZE + 1) * line_blocks;
    }
    region
}

/// Last index maximizing `(tile - 1) * cost`, ignoring exhausted axes.
pub(crate) fn last_argmax_weighted(tile: &[usize], costs: &[isize]) -> Option<usize> {
    let mut best = None;
    let mut best_score = 0isize;
    for (k, (&t, &c)) in tile.iter().zip(costs).enumerate() {
        if t <= 1 {
            continue;
        }
        let score = (t as isize - 1) * c;
        if score >= best_score {
            best_score = score;
            best = Some(k);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_region() {
        assert_eq!(memory_region(&[10, 10], &[[8, 80]], 0), 1280);
        assert_eq!(memory_region(&[100], &[[0, 8]], 1), 832);
        assert_eq!(memory_region(&[10], &[[0, 128]], 1), 640);
    }

    #[test]
    fn test_axis_costs() {
        assert_eq!(axis_costs(&[[1, 8], [8, 1]]), [2, 2]);
        assert_eq!(axis_costs(&[[0, 4], [3, 4]]), [1, 8]);
    }

    #[test]
    fn test_last_argmax_weighted() {
        assert_eq!(last_argmax_weighted(&[10, 20], &[1, 1]), Some(1));
        assert_eq!(last_argmax_weighted(&[10, 10], &[1, 1]), Some(1));
        assert_eq!(last_argmax_weighted(&[10, 5], &[2, 1]), Some(0));
        assert_eq!(last_argmax_weighted(&[1, 1], &[2, 2]), None);
    }

    #[test]
    fn test_small_tile_is_full() {
        assert_eq!(tile_shape([10, 10], &[[1, 10]], 8), [10, 10]);
    }

    #[test]
    fn test_aligned_operands_stream() {
        // every operand walks the inner axis with unit stride
        assert_eq!(
            tile_shape([1000, 1000], &[[1, 1000], [1, 1000]], 8),
            [1000, 1000]
        );
    }

    #[test]
    fn test_transposed_operands_are_tiled() {
        let strides = [[1isize, 1000], [1000, 1]];
        let tile = tile_shape([1000, 1000], &strides, 8);
        assert!(tile[0] < 1000 && tile[1] < 1000);
        assert!(tile[0] >= 1 && tile[1] >= 1);
        let bytes = [[8isize, 8000], [8000, 8]];
        assert!(memory_region(&tile, &bytes, 0) <= BLOCK_MEMORY_SIZE);
    }
}
