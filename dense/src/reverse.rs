//! Index-remapping nodes: reversal and tiling.

use dense_view::{Dyn, Layout, MatRef, Overlap};

use crate::expr::Expr;
use crate::traits::Flags;

/// `inner` with its row order, its column order, or both, flipped.
#[derive(Debug, Clone, Copy)]
pub struct Reverse<E, const ROWS: bool, const COLS: bool> {
    inner: E,
}

impl<E: Expr, const ROWS: bool, const COLS: bool> Reverse<E, ROWS, COLS> {
    pub fn new(inner: E) -> Self {
        Reverse { inner }
    }

    #[inline(always)]
    fn source(&self, i: usize, j: usize) -> (usize, usize) {
        let i = if ROWS { self.inner.nrows() - 1 - i } else { i };
        let j = if COLS { self.inner.ncols() - 1 - j } else { j };
        (i, j)
    }
}

impl<E: Expr, const ROWS: bool, const COLS: bool> Expr for Reverse<E, ROWS, COLS> {
    type Scalar = E::Scalar;
    type Rows = E::Rows;
    type Cols = E::Cols;

    const FLAGS: Flags = E::FLAGS.intersect(
        Flags::ROW_MAJOR
            .union(Flags::DIRECT_ACCESS)
            .union(Flags::LVALUE),
    );
    const COST: usize = E::COST;

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
        let (i, j) = self.source(i, j);
        self.inner.coeff(i, j)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        self.inner.direct().map(|v| v.reverse(ROWS, COLS))
    }

    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        self.inner
            .direct_conj()
            .map(|(v, conj)| (v.reverse(ROWS, COLS), conj))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        match self.direct_conj() {
            Some((v, _)) => v.layout().classify(dst),
            None => self.inner.overlap(dst).shuffled(),
        }
    }
}

/// `inner` tiled `row_factor x col_factor` times.
#[derive(Debug, Clone, Copy)]
pub struct Replicate<E> {
    inner: E,
    row_factor: usize,
    col_factor: usize,
}

impl<E: Expr> Replicate<E> {
    pub fn new(inner: E, row_factor: usize, col_factor: usize) -> Self {
        Replicate {
            inner,
            row_factor,
            col_factor,
        }
    }
}

impl<E: Expr> Expr for Replicate<E> {
    type Scalar = E::Scalar;
    type Rows = Dyn;
    type Cols = Dyn;

    const FLAGS: Flags = E::FLAGS.intersect(Flags::ROW_MAJOR);
    const COST: usize = E::COST;

    #[inline]
    fn rows(&self) -> Dyn {
        Dyn(self.inner.nrows() * self.row_factor)
    }

    #[inline]
    fn cols(&self) -> Dyn {
        Dyn(self.inner.ncols() * self.col_factor)
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        self.inner
            .coeff(i % self.inner.nrows(), j % self.inner.ncols())
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.inner.overlap(dst).shuffled()
    }
}
