//! Triangular views of square expressions.

use dense_kernel::TriangularMode;
use dense_view::{DenseError, Layout, Overlap, Result};

use crate::expr::Expr;
use crate::traits::Flags;

/// The part of a square `inner` selected by `mode`; the rest reads as zero.
///
/// Unit modes read one on the diagonal without touching `inner`, strict
/// modes read zero there.
#[derive(Debug, Clone, Copy)]
pub struct TriangularView<E> {
    inner: E,
    mode: TriangularMode,
}

impl<E: Expr> TriangularView<E> {
    /// Fails with [`DenseError::NonSquare`] unless `inner` is square.
    pub fn try_new(inner: E, mode: TriangularMode) -> Result<Self> {
        let (rows, cols) = inner.shape();
        if rows != cols {
            return Err(DenseError::NonSquare { rows, cols });
        }
        Ok(TriangularView { inner, mode })
    }

    pub fn mode(&self) -> TriangularMode {
        self.mode
    }

    pub fn nested(&self) -> &E {
        &self.inner
    }
}

impl<E: Expr> Expr for TriangularView<E> {
    type Scalar = E::Scalar;
    type Rows = E::Rows;
    type Cols = E::Cols;

    const FLAGS: Flags = E::FLAGS.intersect(Flags::ROW_MAJOR);
    const COST: usize = E::COST + 1;

    #[inline]
    fn rows(&self) -> E::Rows {
        self.inner.rows()
    }

    #[inline]
    fn cols(&self) -> E::Cols {
        self.inner.cols()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        self.mode.select(i, j, || self.inner.coeff(i, j))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.inner.overlap(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixBase, MatrixX};

    fn sample() -> MatrixX<i32> {
        MatrixX::from_fn(3, 3, |i, j| (1 + 3 * i + j) as i32)
    }

    #[test]
    fn test_modes() {
        let m = sample();
        let upper = (&m).triangular_view(TriangularMode::Upper);
        assert_eq!(upper.coeff(0, 2), 3);
        assert_eq!(upper.coeff(2, 0), 0);
        assert_eq!(upper.coeff(1, 1), 5);

        let unit = (&m).triangular_view(TriangularMode::UnitLower);
        assert_eq!(unit.coeff(1, 1), 1);
        assert_eq!(unit.coeff(2, 1), 8);
        assert_eq!(unit.coeff(0, 1), 0);

        let strict = (&m).triangular_view(TriangularMode::StrictlyUpper);
        assert_eq!(strict.sum(), 2 + 3 + 6);
    }

    #[test]
    fn test_non_square_rejected() {
        let m = MatrixX::<f64>::zeros(2, 3);
        assert_eq!(
            TriangularView::try_new(&m, TriangularMode::Lower).err(),
            Some(DenseError::NonSquare { rows: 2, cols: 3 })
        );
    }
}
