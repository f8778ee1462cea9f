//! Reductions over direct-access views.

use dense_traits::{Conj, ElementOp, Identity};
use dense_view::{DenseError, MatRef, Result};

use crate::order::inner_axis;
use crate::simd::{self, MaybeSimdOps};
use crate::Element;

/// `reduce_fn(..., map_fn(Op(x)), ...)` over every coefficient, starting from
/// `init`.
///
/// Coefficients are visited in whichever order is cheapest for the view's
/// strides, so `reduce_fn` must be associative and commutative.
pub fn reduce<T: Element, Op: ElementOp<T>, U>(
    src: MatRef<'_, T>,
    map_fn: impl Fn(T) -> U,
    reduce_fn: impl Fn(U, U) -> U,
    init: U,
) -> U {
    let src = if inner_axis([src.nrows(), src.ncols()], &[[src.row_stride(), src.col_stride()]]) == 1 {
        src.transpose()
    } else {
        src
    };
    if let Some(s) = src.as_slice() {
        return simd::dispatch_if_large(s.len(), || {
            let mut acc = init;
            for &x in s {
                acc = reduce_fn(acc, map_fn(Op::apply(x)));
            }
            acc
        });
    }
    let mut acc = init;
    for j in 0..src.ncols() {
        match src.col_run(0, j, src.nrows()) {
            Some(run) => {
                for &x in run {
                    acc = reduce_fn(acc, map_fn(Op::apply(x)));
                }
            }
            None => {
                for i in 0..src.nrows() {
                    acc = reduce_fn(acc, map_fn(Op::apply(src.get(i, j))));
                }
            }
        }
    }
    acc
}

/// Sum of all coefficients; zero for an empty view.
pub fn sum<T: Element>(src: MatRef<'_, T>) -> T {
    if let Some(s) = src.as_slice() {
        if let Some(v) = T::try_simd_sum(s) {
            return v;
        }
    }
    reduce::<T, Identity, T>(src, |x| x, |a, b| a + b, T::zero())
}

/// View a vector-shaped view as a column.
pub fn as_column<T>(v: MatRef<'_, T>) -> Result<MatRef<'_, T>> {
    if v.ncols() == 1 {
        Ok(v)
    } else if v.nrows() == 1 {
        Ok(v.transpose())
    } else {
        Err(DenseError::NotAVector {
            rows: v.nrows(),
            cols: v.ncols(),
        })
    }
}

/// `sum(op(a[k]) * op(b[k]))` over two vectors of equal length.
pub fn dot_with<T: Element>(a: MatRef<'_, T>, conj_a: bool, b: MatRef<'_, T>, conj_b: bool) -> Result<T> {
    let a = as_column(a)?;
    let b = as_column(b)?;
    if a.nrows() != b.nrows() {
        return Err(DenseError::ShapeMismatch {
            expected: (a.nrows(), 1),
            found: (b.nrows(), 1),
        });
    }
    let n = a.nrows();
    if !T::IS_COMPLEX {
        if let (Some(x), Some(y)) = (a.col_run(0, 0, n), b.col_run(0, 0, n)) {
            if let Some(v) = <T as MaybeSimdOps>::try_simd_dot(x, y) {
                return Ok(v);
            }
        }
    }
    Ok(match (conj_a, conj_b) {
        (false, false) => dot_loop::<T, Identity, Identity>(a, b),
        (true, false) => dot_loop::<T, Conj, Identity>(a, b),
        (false, true) => dot_loop::<T, Identity, Conj>(a, b),
        (true, true) => dot_loop::<T, Conj, Conj>(a, b),
    })
}

/// Inner product `sum(a[k] * conj(b[k]))`, linear in `a`.
pub fn dot<T: Element>(a: MatRef<'_, T>, b: MatRef<'_, T>) -> Result<T> {
    dot_with(a, false, b, true)
}

fn dot_loop<T: Element, OpA: ElementOp<T>, OpB: ElementOp<T>>(a: MatRef<'_, T>, b: MatRef<'_, T>) -> T {
    let n = a.nrows();
    if let (Some(x), Some(y)) = (a.col_run(0, 0, n), b.col_run(0, 0, n)) {
        return simd::dispatch_if_large(n, || {
            x.iter()
                .zip(y)
                .fold(T::zero(), |acc, (&p, &q)| acc + OpA::apply(p) * OpB::apply(q))
        });
    }
    (0..n).fold(T::zero(), |acc, k| {
        acc + OpA::apply(a.get(k, 0)) * OpB::apply(b.get(k, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_sum_contiguous_and_strided() {
        let data: Vec<f64> = (1..=12).map(|x| x as f64).collect();
        let v = MatRef::col_major(&data, 3, 4).unwrap();
        assert_eq!(sum(v), 78.0);
        assert_eq!(sum(v.subview(1, 1, 2, 2)), 5.0 + 6.0 + 8.0 + 9.0);
        assert_eq!(sum(v.transpose()), 78.0);
        let empty: [f64; 0] = [];
        assert_eq!(sum(MatRef::col_major(&empty, 0, 3).unwrap()), 0.0);
    }

    #[test]
    fn test_reduce_with_map() {
        let data = [3i32, -7, 2, 5];
        let v = MatRef::row_major(&data, 2, 2).unwrap();
        let max_abs = reduce::<i32, Identity, i32>(v, |x| x.abs(), |a, b| a.max(b), 0);
        assert_eq!(max_abs, 7);
    }

    #[test]
    fn test_dot_conjugates_second_argument() {
        let a = [Complex64::new(1.0, 2.0), Complex64::new(0.0, 1.0)];
        let b = [Complex64::new(3.0, 1.0), Complex64::new(2.0, 0.0)];
        let av = MatRef::col_major(&a, 2, 1).unwrap();
        let bv = MatRef::col_major(&b, 1, 2).unwrap();
        let expected = a[0] * b[0].conj() + a[1] * b[1].conj();
        assert_eq!(dot(av, bv).unwrap(), expected);
        let plain = dot_with(av, false, bv, false).unwrap();
        assert_eq!(plain, a[0] * b[0] + a[1] * b[1]);
    }

    #[test]
    fn test_dot_real_strided() {
        let data: Vec<f64> = (0..10).map(|x| x as f64).collect();
        // even entries against odd entries
        let even = MatRef::from_slice(&data, 5, 1, 2, 1, 0).unwrap();
        let odd = MatRef::from_slice(&data, 5, 1, 2, 1, 1).unwrap();
        assert_eq!(dot(even, odd).unwrap(), 0.0 * 1.0 + 2.0 * 3.0 + 4.0 * 5.0 + 6.0 * 7.0 + 8.0 * 9.0);
    }

    #[test]
    fn test_dot_errors() {
        let data = [1.0f32; 6];
        let m = MatRef::col_major(&data, 2, 3).unwrap();
        let v = MatRef::col_major(&data, 3, 1).unwrap();
        let w = MatRef::col_major(&data, 2, 1).unwrap();
        assert!(matches!(dot(m, v), Err(DenseError::NotAVector { .. })));
        assert!(matches!(dot(v, w), Err(DenseError::ShapeMismatch { .. })));
    }
}
