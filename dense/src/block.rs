//! Rectangular windows and the main diagonal.

use dense_traits::Packet;
use dense_view::{Dim, Dyn, Layout, MatRef, Overlap, Result, U1};

use crate::expr::Expr;
use crate::matrix::check_window;
use crate::traits::Flags;

/// `inner(i0 + i, j0 + j)` for a `rows x cols` window.
///
/// `R` and `C` are the window's extents, fixed for `fixed_block` and
/// friends, [`Dyn`] otherwise. The window always lies inside `inner`.
#[derive(Debug, Clone, Copy)]
pub struct Block<E, R = Dyn, C = Dyn> {
    inner: E,
    i0: usize,
    j0: usize,
    rows: R,
    cols: C,
}

impl<E: Expr, R: Dim, C: Dim> Block<E, R, C> {
    /// Fails with [`dense_view::DenseError::IndexOutOfBounds`] when the
    /// window leaves `inner`.
    pub fn try_new(inner: E, i0: usize, j0: usize, rows: R, cols: C) -> Result<Self> {
        check_window(inner.shape(), i0, j0, rows.value(), cols.value())?;
        Ok(Block {
            inner,
            i0,
            j0,
            rows,
            cols,
        })
    }

    pub fn start(&self) -> (usize, usize) {
        (self.i0, self.j0)
    }

    pub fn nested(&self) -> &E {
        &self.inner
    }
}

impl<E: Expr, R: Dim, C: Dim> Expr for Block<E, R, C> {
    type Scalar = E::Scalar;
    type Rows = R;
    type Cols = C;

    const FLAGS: Flags = E::FLAGS.intersect(
        Flags::ROW_MAJOR
            .union(Flags::DIRECT_ACCESS)
            .union(Flags::LVALUE)
            .union(Flags::PACKET_ACCESS),
    );
    const COST: usize = E::COST;

    #[inline]
    fn rows(&self) -> R {
        self.rows
    }

    #[inline]
    fn cols(&self) -> C {
        self.cols
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        self.inner.coeff(self.i0 + i, self.j0 + j)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_col(self.i0 + i, self.j0 + j)
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_row(self.i0 + i, self.j0 + j)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        let (rows, cols) = self.shape();
        self.inner
            .direct()
            .map(|v| v.subview(self.i0, self.j0, rows, cols))
    }

    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        let (rows, cols) = self.shape();
        self.inner
            .direct_conj()
            .map(|(v, conj)| (v.subview(self.i0, self.j0, rows, cols), conj))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        match self.direct_conj() {
            Some((v, _)) => v.layout().classify(dst),
            None if self.i0 == 0 && self.j0 == 0 => self.inner.overlap(dst),
            None => self.inner.overlap(dst).shuffled(),
        }
    }
}

/// Main diagonal `inner(i, i)` as a column.
#[derive(Debug, Clone, Copy)]
pub struct Diagonal<E> {
    inner: E,
}

impl<E: Expr> Diagonal<E> {
    pub fn new(inner: E) -> Self {
        Diagonal { inner }
    }
}

impl<E: Expr> Expr for Diagonal<E> {
    type Scalar = E::Scalar;
    type Rows = Dyn;
    type Cols = U1;

    const FLAGS: Flags = E::FLAGS.intersect(Flags::DIRECT_ACCESS.union(Flags::LVALUE));
    const COST: usize = E::COST;

    #[inline]
    fn rows(&self) -> Dyn {
        Dyn(self.inner.nrows().min(self.inner.ncols()))
    }

    #[inline]
    fn cols(&self) -> U1 {
        U1::default()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, _j: usize) -> E::Scalar {
        self.inner.coeff(i, i)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        self.inner.direct().map(MatRef::diagonal)
    }

    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        self.inner.direct_conj().map(|(v, conj)| (v.diagonal(), conj))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        match self.direct_conj() {
            Some((v, _)) => v.layout().classify(dst),
            None => self.inner.overlap(dst).shuffled(),
        }
    }
}
