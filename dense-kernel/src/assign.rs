//! Blocked assignment between two direct-access views.
//!
//! Pipeline: pick the inner axis from the operands' strides, transpose both
//! views so the inner axis is the row axis, then either run one flat loop over
//! packed storage or walk cache tiles column by column.

use dense_traits::{ElementOp, Identity};
use dense_view::{DenseError, MatMut, MatRef, Result};

use crate::block::tile_shape;
use crate::order::inner_axis;
use crate::simd;
use crate::Element;

fn check_same_shape<T>(dst: &MatMut<'_, T>, src: &MatRef<'_, T>) -> Result<()> {
    let expected = (dst.nrows(), dst.ncols());
    let found = (src.nrows(), src.ncols());
    if expected != found {
        return Err(DenseError::ShapeMismatch { expected, found });
    }
    Ok(())
}

/// `dst(i, j) = f(dst(i, j), Op(src(i, j)))` for every coefficient.
///
/// `dst` and `src` must not overlap unless every source coefficient is the
/// destination's own `(i, j)`.
pub fn zip_assign<T: Element, Op: ElementOp<T>>(
    dst: MatMut<'_, T>,
    src: MatRef<'_, T>,
    f: impl Fn(T, T) -> T,
) -> Result<()> {
    check_same_shape(&dst, &src)?;
    if dst.is_empty() {
        return Ok(());
    }

    let dims = [dst.nrows(), dst.ncols()];
    let strides = [
        [dst.row_stride(), dst.col_stride()],
        [src.row_stride(), src.col_stride()],
    ];
    let (mut dst, src) = if inner_axis(dims, &strides) == 1 {
        (dst.transpose(), src.transpose())
    } else {
        (dst, src)
    };

    let len = dst.nrows() * dst.ncols();
    if dst.rb().is_col_major_contiguous() && src.is_col_major_contiguous() {
        if let (Some(d), Some(s)) = (dst.as_mut_slice(), src.as_slice()) {
            simd::dispatch_if_large(len, || {
                for (x, &y) in d.iter_mut().zip(s) {
                    *x = f(*x, Op::apply(y));
                }
            });
            return Ok(());
        }
    }

    let (rows, cols) = (dst.nrows(), dst.ncols());
    let tile = tile_shape(
        [rows, cols],
        &[
            [dst.row_stride(), dst.col_stride()],
            [src.row_stride(), src.col_stride()],
        ],
        std::mem::size_of::<T>(),
    );
    let (tile_rows, tile_cols) = (tile[0].max(1), tile[1].max(1));
    for j0 in (0..cols).step_by(tile_cols) {
        let j1 = (j0 + tile_cols).min(cols);
        for i0 in (0..rows).step_by(tile_rows) {
            let n = (i0 + tile_rows).min(rows) - i0;
            for j in j0..j1 {
                zip_column::<T, Op>(&mut dst, src, i0, j, n, &f);
            }
        }
    }
    Ok(())
}

#[inline(always)]
fn zip_column<T: Element, Op: ElementOp<T>>(
    dst: &mut MatMut<'_, T>,
    src: MatRef<'_, T>,
    i0: usize,
    j: usize,
    n: usize,
    f: &impl Fn(T, T) -> T,
) {
    if let Some(s) = src.col_run(i0, j, n) {
        if let Some(d) = dst.col_run_mut(i0, j, n) {
            for (x, &y) in d.iter_mut().zip(s) {
                *x = f(*x, Op::apply(y));
            }
            return;
        }
    }
    for i in i0..i0 + n {
        let v = f(dst.get(i, j), Op::apply(src.get(i, j)));
        dst.write(i, j, v);
    }
}

/// `dst = Op(src)`.
pub fn copy_into<T: Element, Op: ElementOp<T>>(dst: MatMut<'_, T>, src: MatRef<'_, T>) -> Result<()> {
    zip_assign::<T, Op>(dst, src, |_, s| s)
}

/// `dst = src` without an element operation.
pub fn copy<T: Element>(dst: MatMut<'_, T>, src: MatRef<'_, T>) -> Result<()> {
    copy_into::<T, Identity>(dst, src)
}

/// Apply `f` to every coefficient of `dst` in place, in storage order.
pub fn map_in_place<T: Element>(dst: MatMut<'_, T>, f: impl Fn(T) -> T) {
    let mut dst = if dst.row_stride().unsigned_abs() > dst.col_stride().unsigned_abs() {
        dst.transpose()
    } else {
        dst
    };
    let len = dst.nrows() * dst.ncols();
    if let Some(d) = dst.as_mut_slice() {
        simd::dispatch_if_large(len, || {
            for x in d.iter_mut() {
                *x = f(*x);
            }
        });
        return;
    }
    for j in 0..dst.ncols() {
        for i in 0..dst.nrows() {
            let v = f(dst.get(i, j));
            dst.write(i, j, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dense_traits::Conj;
    use num_complex::Complex32;

    #[test]
    fn test_copy_contiguous() {
        let src: Vec<f64> = (0..12).map(|x| x as f64).collect();
        let mut dst = vec![0.0; 12];
        copy(
            MatMut::col_major(&mut dst, 3, 4).unwrap(),
            MatRef::col_major(&src, 3, 4).unwrap(),
        )
        .unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_transposed_layouts() {
        let (m, n) = (37, 53);
        let src: Vec<i64> = (0..(m * n) as i64).collect();
        let mut dst = vec![0i64; m * n];
        let sv = MatRef::col_major(&src, m, n).unwrap();
        copy(MatMut::row_major(&mut dst, m, n).unwrap(), sv).unwrap();
        for i in 0..m {
            for j in 0..n {
                assert_eq!(dst[i * n + j], sv.get(i, j));
            }
        }
    }

    #[test]
    fn test_large_transpose_is_blocked_and_complete() {
        let n = 300;
        let src: Vec<f32> = (0..n * n).map(|x| x as f32).collect();
        let mut dst = vec![-1.0f32; n * n];
        let sv = MatRef::col_major(&src, n, n).unwrap().transpose();
        copy(MatMut::col_major(&mut dst, n, n).unwrap(), sv).unwrap();
        for i in 0..n {
            for j in 0..n {
                assert_eq!(dst[i + j * n], src[j + i * n]);
            }
        }
    }

    #[test]
    fn test_zip_with_conjugation() {
        let src = [Complex32::new(1.0, 1.0), Complex32::new(2.0, -3.0)];
        let mut dst = [Complex32::new(10.0, 0.0); 2];
        zip_assign::<_, Conj>(
            MatMut::col_major(&mut dst, 2, 1).unwrap(),
            MatRef::col_major(&src, 2, 1).unwrap(),
            |d, s| d + s,
        )
        .unwrap();
        assert_eq!(dst[0], Complex32::new(11.0, -1.0));
        assert_eq!(dst[1], Complex32::new(12.0, 3.0));
    }

    #[test]
    fn test_strided_source() {
        // columns four elements apart
        let src: Vec<i32> = (0..12).collect();
        let sv = MatRef::from_slice(&src, 2, 3, 1, 4, 0).unwrap();
        let mut dst = vec![0; 6];
        copy(MatMut::col_major(&mut dst, 2, 3).unwrap(), sv).unwrap();
        assert_eq!(dst, vec![0, 1, 4, 5, 8, 9]);
    }

    #[test]
    fn test_shape_mismatch() {
        let src = [0.0f64; 6];
        let mut dst = [0.0f64; 6];
        let err = copy(
            MatMut::col_major(&mut dst, 3, 2).unwrap(),
            MatRef::col_major(&src, 2, 3).unwrap(),
        );
        assert!(matches!(err, Err(DenseError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_map_in_place_strided() {
        let mut data: Vec<i32> = (0..8).collect();
        let view = MatMut::from_slice(&mut data, 2, 2, 1, 4, 0).unwrap();
        map_in_place(view, |x| x * 10);
        assert_eq!(data, vec![0, 10, 2, 3, 40, 50, 6, 7]);
    }
}
