//! Column-wise and row-wise (partial) reductions.
//!
//! `colwise()` reduces every column to one coefficient, giving a row vector;
//! `rowwise()` reduces every row, giving a column vector. The reduced node is
//! lazy like any other: each coefficient folds one column or row of the
//! nested expression on demand.

use dense_kernel::Element;
use dense_traits::redux::{MaxRedux, MeanRedux, MinRedux, NormRedux, ProdRedux, SquaredNormRedux, SumRedux};
use dense_traits::{RealScalar, Reducer};
use dense_view::{Dim, Layout, Overlap, U1};

use crate::base::RealOf;
use crate::expr::Expr;
use crate::traits::Flags;

/// Axis a partial reduction runs along.
pub trait Direction: Copy + Default + std::fmt::Debug + 'static {
    type Rows<E: Expr>: Dim;
    type Cols<E: Expr>: Dim;
    /// Extent of the reduced axis.
    type Reduced<E: Expr>: Dim;

    fn rows<E: Expr>(e: &E) -> Self::Rows<E>;
    fn cols<E: Expr>(e: &E) -> Self::Cols<E>;

    /// `(row, col)` in the nested expression of entry `k` of the slice that
    /// produces output coefficient `(i, j)`.
    fn source(i: usize, j: usize, k: usize) -> (usize, usize);

    fn reduced_len<E: Expr>(e: &E) -> usize;
}

/// Reduce each column.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertical;

/// Reduce each row.
#[derive(Debug, Clone, Copy, Default)]
pub struct Horizontal;

impl Direction for Vertical {
    type Rows<E: Expr> = U1;
    type Cols<E: Expr> = E::Cols;
    type Reduced<E: Expr> = E::Rows;

    fn rows<E: Expr>(_e: &E) -> U1 {
        U1::default()
    }

    fn cols<E: Expr>(e: &E) -> E::Cols {
        e.cols()
    }

    #[inline(always)]
    fn source(_i: usize, j: usize, k: usize) -> (usize, usize) {
        (k, j)
    }

    fn reduced_len<E: Expr>(e: &E) -> usize {
        e.nrows()
    }
}

impl Direction for Horizontal {
    type Rows<E: Expr> = E::Rows;
    type Cols<E: Expr> = U1;
    type Reduced<E: Expr> = E::Cols;

    fn rows<E: Expr>(e: &E) -> E::Rows {
        e.rows()
    }

    fn cols<E: Expr>(_e: &E) -> U1 {
        U1::default()
    }

    #[inline(always)]
    fn source(i: usize, _j: usize, k: usize) -> (usize, usize) {
        (i, k)
    }

    fn reduced_len<E: Expr>(e: &E) -> usize {
        e.ncols()
    }
}

/// Entry point of partial reductions, from `colwise()` or `rowwise()`.
#[derive(Debug, Clone, Copy)]
pub struct VectorwiseOp<E, D> {
    inner: E,
    _direction: D,
}

impl<E: Expr, D: Direction> VectorwiseOp<E, D> {
    pub fn new(inner: E) -> Self {
        VectorwiseOp {
            inner,
            _direction: D::default(),
        }
    }

    /// Fold each slice with `reducer`.
    pub fn redux<Rd>(self, reducer: Rd) -> PartialRedux<E, Rd, D>
    where
        Rd: Reducer<E::Scalar>,
        Rd::Output: Element,
    {
        PartialRedux {
            inner: self.inner,
            reducer,
            _direction: D::default(),
        }
    }

    pub fn sum(self) -> PartialRedux<E, SumRedux, D> {
        self.redux(SumRedux)
    }

    pub fn prod(self) -> PartialRedux<E, ProdRedux, D> {
        self.redux(ProdRedux)
    }

    pub fn mean(self) -> PartialRedux<E, MeanRedux, D> {
        self.redux(MeanRedux)
    }

    pub fn squared_norm(self) -> PartialRedux<E, SquaredNormRedux, D>
    where
        RealOf<E>: Element,
    {
        self.redux(SquaredNormRedux)
    }

    pub fn norm(self) -> PartialRedux<E, NormRedux, D>
    where
        RealOf<E>: Element,
    {
        self.redux(NormRedux)
    }

    pub fn max_coeff(self) -> PartialRedux<E, MaxRedux, D>
    where
        E::Scalar: RealScalar,
    {
        self.redux(MaxRedux)
    }

    pub fn min_coeff(self) -> PartialRedux<E, MinRedux, D>
    where
        E::Scalar: RealScalar,
    {
        self.redux(MinRedux)
    }
}

/// One reduced coefficient per column ([`Vertical`]) or row
/// ([`Horizontal`]) of `inner`.
#[derive(Debug, Clone, Copy)]
pub struct PartialRedux<E, Rd, D> {
    inner: E,
    reducer: Rd,
    _direction: D,
}

impl<E, Rd, D> Expr for PartialRedux<E, Rd, D>
where
    E: Expr,
    Rd: Reducer<E::Scalar>,
    Rd::Output: Element,
    D: Direction,
{
    type Scalar = Rd::Output;
    type Rows = D::Rows<E>;
    type Cols = D::Cols<E>;

    const FLAGS: Flags = Flags::NONE;
    const COST: usize = <D::Reduced<E> as Dim>::EXTENT.fixed_or(16) * (E::COST + Rd::COST);

    #[inline]
    fn rows(&self) -> D::Rows<E> {
        D::rows(&self.inner)
    }

    #[inline]
    fn cols(&self) -> D::Cols<E> {
        D::cols(&self.inner)
    }

    fn coeff(&self, i: usize, j: usize) -> Rd::Output {
        let n = D::reduced_len(&self.inner);
        let acc = (0..n)
            .map(|k| {
                let (r, c) = D::source(i, j, k);
                self.reducer.lift(self.inner.coeff(r, c))
            })
            .reduce(|a, b| self.reducer.combine(a, b));
        self.reducer.finish(acc, n)
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.inner.overlap(dst).shuffled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixBase, MatrixX, MatrixXcd, RowVectorX};
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_colwise_and_rowwise_sums() {
        let m = MatrixX::<i32>::from_fn(2, 3, |i, j| (10 * i + j) as i32);
        let cols = (&m).colwise().sum();
        assert_eq!(cols.shape(), (1, 3));
        assert_eq!(cols.coeff(0, 2), 2 + 12);
        let rows = (&m).rowwise().sum().eval();
        assert_eq!(rows.shape(), (2, 1));
        assert_eq!(rows[1], 30 + 3);
    }

    #[test]
    fn test_colwise_norm_and_extrema() {
        let m = MatrixX::<f64>::from_row_slice(2, 2, &[3.0, -1.0, 4.0, 2.0]).unwrap();
        let norms = (&m).colwise().norm();
        assert_relative_eq!(norms.coeff(0, 0), 5.0);
        assert_eq!((&m).rowwise().max_coeff().coeff(0, 0), 3.0);
        assert_eq!((&m).colwise().min_coeff().coeff(0, 1), -1.0);
        assert_relative_eq!((&m).rowwise().mean().coeff(1, 0), 3.0);
    }

    #[test]
    fn test_complex_norms_are_real() {
        let m = MatrixXcd::from_fn(2, 3, |i, j| Complex64::new(i as f64 + 1.0, j as f64));
        let squared: RowVectorX<f64> = (&m).colwise().squared_norm().eval();
        assert_relative_eq!(squared[2], (1.0 + 4.0) + (4.0 + 4.0));
        let norms = (&m).rowwise().norm().eval();
        assert_eq!(norms.shape(), (2, 1));
        assert_relative_eq!(norms[0], 8.0f64.sqrt(), epsilon = 1e-12);
    }
}
