//! Transposition and conjugation nodes.

use dense_traits::{ElementOpApply, Packet};
use dense_view::{Layout, MatRef, Overlap};

use crate::expr::Expr;
use crate::traits::Flags;

/// `inner(j, i)`.
#[derive(Debug, Clone, Copy)]
pub struct Transpose<E> {
    inner: E,
}

impl<E: Expr> Transpose<E> {
    pub fn new(inner: E) -> Self {
        Transpose { inner }
    }

    pub fn nested(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Expr> Expr for Transpose<E> {
    type Scalar = E::Scalar;
    type Rows = E::Cols;
    type Cols = E::Rows;

    const FLAGS: Flags = E::FLAGS
        .intersect(
            Flags::ROW_MAJOR
                .union(Flags::DIRECT_ACCESS)
                .union(Flags::LVALUE)
                .union(Flags::PACKET_ACCESS)
                .union(Flags::LINEAR_ACCESS),
        )
        .flip_order();
    const COST: usize = E::COST;

    #[inline]
    fn rows(&self) -> E::Cols {
        self.inner.cols()
    }

    #[inline]
    fn cols(&self) -> E::Rows {
        self.inner.rows()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        self.inner.coeff(j, i)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_row(j, i)
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_col(j, i)
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> E::Scalar {
        self.inner.coeff_linear(k)
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<E::Scalar> {
        self.inner.packet_linear(k)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        self.inner.direct().map(MatRef::transpose)
    }

    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        self.inner.direct_conj().map(|(v, conj)| (v.transpose(), conj))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        match self.direct_conj() {
            Some((v, _)) => v.layout().classify(dst),
            None => self.inner.overlap(dst).shuffled(),
        }
    }
}

/// `conj(inner(i, j))`; the identity on real scalars.
#[derive(Debug, Clone, Copy)]
pub struct Conjugate<E> {
    inner: E,
}

impl<E: Expr> Conjugate<E> {
    pub fn new(inner: E) -> Self {
        Conjugate { inner }
    }

    pub fn nested(&self) -> &E {
        &self.inner
    }
}

impl<E: Expr> Expr for Conjugate<E> {
    type Scalar = E::Scalar;
    type Rows = E::Rows;
    type Cols = E::Cols;

    const FLAGS: Flags = E::FLAGS.intersect(
        Flags::ROW_MAJOR
            .union(Flags::DIRECT_ACCESS)
            .union(Flags::PACKET_ACCESS)
            .union(Flags::LINEAR_ACCESS),
    );
    const COST: usize = E::COST
        + if <E::Scalar as dense_traits::Scalar>::IS_COMPLEX {
            <E::Scalar as dense_traits::Scalar>::ADD_COST
        } else {
            0
        };

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
        self.inner.coeff(i, j).conj()
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_col(i, j).map(ElementOpApply::conj)
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        self.inner.packet_row(i, j).map(ElementOpApply::conj)
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> E::Scalar {
        self.inner.coeff_linear(k).conj()
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<E::Scalar> {
        self.inner.packet_linear(k).map(ElementOpApply::conj)
    }

    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        self.inner.direct_conj().map(|(v, conj)| (v, !conj))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.inner.overlap(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{select_traversal, AccessorsLevel, ExprMut, MatrixBase, MatrixX, MatrixXcf, Traversal};
    use num_complex::Complex32;

    #[test]
    fn test_transpose_coefficients_and_view() {
        let m = MatrixX::<i32>::from_fn(2, 3, |i, j| (10 * i + j) as i32);
        let t = (&m).transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.coeff(2, 1), 12);
        let v = t.direct().unwrap();
        assert_eq!((v.row_stride(), v.col_stride()), (2, 1));
        assert!(<Transpose<&MatrixX<i32>> as Expr>::FLAGS.contains(Flags::ROW_MAJOR));
    }

    #[test]
    fn test_conjugate_tracks_pending_flag() {
        let m = MatrixXcf::from_fn(2, 2, |i, j| Complex32::new(i as f32, j as f32));
        let c = (&m).conjugate();
        assert_eq!(c.coeff(1, 1), Complex32::new(1.0, -1.0));
        assert!(c.direct().is_none());
        assert!(c.direct_conj().unwrap().1);
        let cc = (&m).conjugate().conjugate();
        assert!(!cc.direct_conj().unwrap().1);
        let adj = (&m).adjoint();
        assert_eq!(adj.coeff(0, 1), Complex32::new(1.0, 0.0));
    }

    #[test]
    fn test_conjugate_keeps_direct_access() {
        fn flags_of<E: Expr>(_: &E) -> Flags {
            E::FLAGS
        }
        let m = MatrixXcf::from_fn(3, 2, |i, j| Complex32::new(i as f32, 1.0 + j as f32));
        assert_eq!(AccessorsLevel::from_flags(flags_of(&(&m).conjugate())), AccessorsLevel::Direct);
        assert!((&m).conjugate().direct_conj().is_some());
        assert!(!flags_of(&(&m + &m).conjugate()).contains(Flags::DIRECT_ACCESS));

        let mut dst = MatrixXcf::zeros(2, 3);
        let view = dst.target_view();
        assert_eq!(select_traversal(&view, &(&m).adjoint()), Traversal::Direct);
        dst.assign((&m).adjoint());
        assert_eq!(dst[(1, 2)], Complex32::new(2.0, -2.0));
    }
}
