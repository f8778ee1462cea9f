//! Product kernels on strided views.
//!
//! All kernels compute `C = alpha * op(A) * op(B)` or update `C` in place,
//! where `op` is the identity or a conjugation chosen per operand. The
//! conjugation is a type parameter of the inner loops, so a conjugated operand
//! costs nothing extra per coefficient.

use dense_traits::{AssignKind, Conj, ElementOp, Identity};
use dense_view::{DenseError, MatMut, MatRef, Result};

use crate::backend::{ActiveBackend, BackendConfig};
use crate::Element;

fn check_product_shapes<T>(c: &MatMut<'_, T>, a: &MatRef<'_, T>, b: &MatRef<'_, T>) -> Result<()> {
    if a.ncols() != b.nrows() {
        return Err(DenseError::ShapeMismatch {
            expected: (a.ncols(), b.ncols()),
            found: (b.nrows(), b.ncols()),
        });
    }
    let expected = (a.nrows(), b.ncols());
    let found = (c.nrows(), c.ncols());
    if expected != found {
        return Err(DenseError::ShapeMismatch { expected, found });
    }
    Ok(())
}

/// Fold `kind` into the scale factor: `Sub` becomes an accumulation of `-alpha`.
#[inline]
fn accumulate_and_alpha<T: Element>(kind: AssignKind, alpha: T) -> (bool, T) {
    match kind {
        AssignKind::Replace => (false, alpha),
        AssignKind::Add => (true, alpha),
        AssignKind::Sub => (true, -alpha),
    }
}

/// General matrix product `C (kind)= alpha * op(A) * op(B)`.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Element>(
    mut c: MatMut<'_, T>,
    kind: AssignKind,
    a: MatRef<'_, T>,
    conj_a: bool,
    b: MatRef<'_, T>,
    conj_b: bool,
    alpha: T,
) -> Result<()> {
    check_product_shapes(&c, &a, &b)?;
    let (accumulate, alpha) = accumulate_and_alpha(kind, alpha);
    if c.is_empty() {
        return Ok(());
    }
    if T::try_gemm(c.rb_mut(), accumulate, a, conj_a, b, conj_b, alpha) {
        log::trace!(
            "gemm {}x{}x{} via {}",
            a.nrows(),
            a.ncols(),
            b.ncols(),
            ActiveBackend::NAME
        );
        return Ok(());
    }
    if !accumulate {
        c.fill(T::zero());
    }
    match (conj_a, conj_b) {
        (false, false) => gemm_naive::<T, Identity, Identity>(c, a, b, alpha),
        (true, false) => gemm_naive::<T, Conj, Identity>(c, a, b, alpha),
        (false, true) => gemm_naive::<T, Identity, Conj>(c, a, b, alpha),
        (true, true) => gemm_naive::<T, Conj, Conj>(c, a, b, alpha),
    }
    Ok(())
}

/// `C += alpha * op(A) * op(B)`, column by column, rank-one updates in `p`.
fn gemm_naive<T: Element, OpA: ElementOp<T>, OpB: ElementOp<T>>(
    mut c: MatMut<'_, T>,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    alpha: T,
) {
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    for j in 0..n {
        for p in 0..k {
            let t = alpha * OpB::apply(b.get(p, j));
            axpy_column::<T, OpA>(&mut c, j, a, p, 0..m, t);
        }
    }
}

/// `C[rows, j] += op(A[rows, p]) * t`.
#[inline(always)]
fn axpy_column<T: Element, OpA: ElementOp<T>>(
    c: &mut MatMut<'_, T>,
    j: usize,
    a: MatRef<'_, T>,
    p: usize,
    rows: std::ops::Range<usize>,
    t: T,
) {
    let start = rows.start;
    let len = rows.len();
    if len == 0 {
        return;
    }
    if let Some(a_run) = a.col_run(start, p, len) {
        if let Some(c_run) = c.col_run_mut(start, j, len) {
            for (ci, &ai) in c_run.iter_mut().zip(a_run) {
                *ci = *ci + OpA::apply(ai) * t;
            }
            return;
        }
    }
    for i in rows {
        let v = c.get(i, j) + OpA::apply(a.get(i, p)) * t;
        c.write(i, j, v);
    }
}

/// Matrix-vector product `y (kind)= alpha * op(A) * op(x)` for a column `x`.
pub fn gemv<T: Element>(
    y: MatMut<'_, T>,
    kind: AssignKind,
    a: MatRef<'_, T>,
    conj_a: bool,
    x: MatRef<'_, T>,
    conj_x: bool,
    alpha: T,
) -> Result<()> {
    if x.ncols() != 1 {
        return Err(DenseError::NotAVector {
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }
    gemm(y, kind, a, conj_a, x, conj_x, alpha)
}

// ============================================================================
// Triangular products
// ============================================================================

/// Which part of a square matrix a triangular view reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangularMode {
    Upper,
    Lower,
    /// Upper part with an implicit unit diagonal.
    UnitUpper,
    /// Lower part with an implicit unit diagonal.
    UnitLower,
    /// Upper part without the diagonal.
    StrictlyUpper,
    /// Lower part without the diagonal.
    StrictlyLower,
}

impl TriangularMode {
    pub const fn is_upper(self) -> bool {
        matches!(
            self,
            TriangularMode::Upper | TriangularMode::UnitUpper | TriangularMode::StrictlyUpper
        )
    }

    pub const fn is_unit(self) -> bool {
        matches!(self, TriangularMode::UnitUpper | TriangularMode::UnitLower)
    }

    pub const fn is_strict(self) -> bool {
        matches!(
            self,
            TriangularMode::StrictlyUpper | TriangularMode::StrictlyLower
        )
    }

    /// Mode of the transposed view.
    pub const fn transposed(self) -> TriangularMode {
        match self {
            TriangularMode::Upper => TriangularMode::Lower,
            TriangularMode::Lower => TriangularMode::Upper,
            TriangularMode::UnitUpper => TriangularMode::UnitLower,
            TriangularMode::UnitLower => TriangularMode::UnitUpper,
            TriangularMode::StrictlyUpper => TriangularMode::StrictlyLower,
            TriangularMode::StrictlyLower => TriangularMode::StrictlyUpper,
        }
    }

    /// Coefficient `(i, j)` of the view, given the stored value.
    #[inline]
    pub fn select<T: Element>(self, i: usize, j: usize, stored: impl FnOnce() -> T) -> T {
        if i == j {
            if self.is_unit() {
                T::one()
            } else if self.is_strict() {
                T::zero()
            } else {
                stored()
            }
        } else if (i < j) == self.is_upper() {
            stored()
        } else {
            T::zero()
        }
    }

    /// Rows of column `p` stored off the diagonal, within `0..n`.
    fn off_diagonal_rows(self, p: usize, n: usize) -> std::ops::Range<usize> {
        if self.is_upper() {
            0..p.min(n)
        } else {
            (p + 1).min(n)..n
        }
    }
}

/// `C (kind)= alpha * op(tri(A)) * op(B)` with `A` square.
#[allow(clippy::too_many_arguments)]
pub fn trmm<T: Element>(
    mut c: MatMut<'_, T>,
    kind: AssignKind,
    a: MatRef<'_, T>,
    mode: TriangularMode,
    conj_a: bool,
    b: MatRef<'_, T>,
    conj_b: bool,
    alpha: T,
) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(DenseError::NonSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    check_product_shapes(&c, &a, &b)?;
    let (accumulate, alpha) = accumulate_and_alpha(kind, alpha);
    if c.is_empty() {
        return Ok(());
    }
    if !accumulate {
        c.fill(T::zero());
    }
    match (conj_a, conj_b) {
        (false, false) => trmm_naive::<T, Identity, Identity>(c, a, mode, b, alpha),
        (true, false) => trmm_naive::<T, Conj, Identity>(c, a, mode, b, alpha),
        (false, true) => trmm_naive::<T, Identity, Conj>(c, a, mode, b, alpha),
        (true, true) => trmm_naive::<T, Conj, Conj>(c, a, mode, b, alpha),
    }
    Ok(())
}

fn trmm_naive<T: Element, OpA: ElementOp<T>, OpB: ElementOp<T>>(
    mut c: MatMut<'_, T>,
    a: MatRef<'_, T>,
    mode: TriangularMode,
    b: MatRef<'_, T>,
    alpha: T,
) {
    let (n, cols) = (a.nrows(), c.ncols());
    for j in 0..cols {
        for p in 0..n {
            let t = alpha * OpB::apply(b.get(p, j));
            axpy_column::<T, OpA>(&mut c, j, a, p, mode.off_diagonal_rows(p, n), t);
            if !mode.is_strict() {
                let diag = if mode.is_unit() {
                    T::one()
                } else {
                    OpA::apply(a.get(p, p))
                };
                let v = c.get(p, j) + diag * t;
                c.write(p, j, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn reference(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
        let mut c = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..m {
                c[i + j * m] = (0..k).map(|p| a[i + p * m] * b[p + j * k]).sum();
            }
        }
        c
    }

    #[test]
    fn test_gemm_replace_add_sub() {
        let (m, k, n) = (3, 4, 2);
        let a: Vec<f64> = (0..m * k).map(|x| x as f64 - 4.0).collect();
        let b: Vec<f64> = (0..k * n).map(|x| 0.5 * x as f64).collect();
        let expected = reference(&a, &b, m, k, n);
        let av = MatRef::col_major(&a, m, k).unwrap();
        let bv = MatRef::col_major(&b, k, n).unwrap();

        let mut c = vec![7.0; m * n];
        gemm(MatMut::col_major(&mut c, m, n).unwrap(), AssignKind::Replace, av, false, bv, false, 1.0).unwrap();
        for (x, y) in c.iter().zip(&expected) {
            approx::assert_relative_eq!(*x, *y);
        }

        gemm(MatMut::col_major(&mut c, m, n).unwrap(), AssignKind::Add, av, false, bv, false, 2.0).unwrap();
        for (x, y) in c.iter().zip(&expected) {
            approx::assert_relative_eq!(*x, 3.0 * y);
        }

        gemm(MatMut::col_major(&mut c, m, n).unwrap(), AssignKind::Sub, av, false, bv, false, 3.0).unwrap();
        for x in &c {
            approx::assert_abs_diff_eq!(*x, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gemm_row_major_destination() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        let av = MatRef::col_major(&a, 2, 2).unwrap();
        let bv = MatRef::col_major(&b, 2, 2).unwrap();
        gemm(MatMut::row_major(&mut c, 2, 2).unwrap(), AssignKind::Replace, av, false, bv, false, 1.0).unwrap();
        // A = [1 3; 2 4], B = [5 7; 6 8]
        assert_eq!(c, [23.0, 31.0, 34.0, 46.0]);
    }

    #[test]
    fn test_gemm_conjugated_operands() {
        let a = [Complex64::new(1.0, 2.0)];
        let b = [Complex64::new(3.0, -1.0)];
        let mut c = [Complex64::new(0.0, 0.0)];
        let av = MatRef::col_major(&a, 1, 1).unwrap();
        let bv = MatRef::col_major(&b, 1, 1).unwrap();
        let one = Complex64::new(1.0, 0.0);
        gemm(MatMut::col_major(&mut c, 1, 1).unwrap(), AssignKind::Replace, av, true, bv, false, one).unwrap();
        assert_eq!(c[0], a[0].conj() * b[0]);
        gemm(MatMut::col_major(&mut c, 1, 1).unwrap(), AssignKind::Replace, av, false, bv, true, one).unwrap();
        assert_eq!(c[0], a[0] * b[0].conj());
    }

    #[test]
    fn test_gemm_shape_mismatch() {
        let a = [0.0; 6];
        let mut c = [0.0; 4];
        let av = MatRef::col_major(&a, 2, 3).unwrap();
        let err = gemm(MatMut::col_major(&mut c, 2, 2).unwrap(), AssignKind::Replace, av, false, av, false, 1.0);
        assert!(matches!(err, Err(DenseError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_gemv_requires_column() {
        let a = [1i64, 2, 3, 4];
        let x = [1i64, 1];
        let mut y = [0i64; 2];
        let av = MatRef::col_major(&a, 2, 2).unwrap();
        gemv(MatMut::col_major(&mut y, 2, 1).unwrap(), AssignKind::Replace, av, false, MatRef::col_major(&x, 2, 1).unwrap(), false, 1).unwrap();
        assert_eq!(y, [4, 6]);
        let row = MatRef::col_major(&x, 1, 2).unwrap();
        let mut z = [0i64; 4];
        assert!(matches!(
            gemv(MatMut::col_major(&mut z, 2, 2).unwrap(), AssignKind::Replace, av, false, row, false, 1),
            Err(DenseError::NotAVector { .. })
        ));
    }

    #[test]
    fn test_triangular_mode_select() {
        let stored = || 5i32;
        assert_eq!(TriangularMode::Upper.select(0, 1, stored), 5);
        assert_eq!(TriangularMode::Upper.select(1, 0, stored), 0);
        assert_eq!(TriangularMode::UnitLower.select(1, 1, stored), 1);
        assert_eq!(TriangularMode::StrictlyLower.select(1, 1, stored), 0);
        assert_eq!(TriangularMode::StrictlyLower.select(2, 1, stored), 5);
        assert_eq!(TriangularMode::UnitUpper.transposed(), TriangularMode::UnitLower);
    }

    #[test]
    fn test_trmm_matches_masked_gemm() {
        let n = 4;
        let a: Vec<f64> = (0..n * n).map(|x| 1.0 + x as f64).collect();
        let b: Vec<f64> = (0..n * 2).map(|x| (x as f64) * 0.25 - 1.0).collect();
        let av = MatRef::col_major(&a, n, n).unwrap();
        let bv = MatRef::col_major(&b, n, 2).unwrap();
        for mode in [
            TriangularMode::Upper,
            TriangularMode::Lower,
            TriangularMode::UnitUpper,
            TriangularMode::UnitLower,
            TriangularMode::StrictlyUpper,
            TriangularMode::StrictlyLower,
        ] {
            let masked: Vec<f64> = (0..n * n)
                .map(|x| mode.select(x % n, x / n, || a[x]))
                .collect();
            let expected = reference(&masked, &b, n, n, 2);
            let mut c = vec![0.0; n * 2];
            trmm(MatMut::col_major(&mut c, n, 2).unwrap(), AssignKind::Replace, av, mode, false, bv, false, 1.0).unwrap();
            for (x, y) in c.iter().zip(&expected) {
                approx::assert_relative_eq!(*x, *y, max_relative = 1e-12);
            }
        }
    }
}
