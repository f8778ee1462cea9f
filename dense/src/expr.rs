//! The coefficient access protocol.
//!
//! [`Expr`] is implemented by every readable node: plain matrices (through a
//! shared reference), maps, and lazy expression nodes. [`ExprMut`] is
//! implemented by the types that can be assigned to.

use dense_kernel::Element;
use dense_traits::{AddAssignOp, AssignFunctor, AssignOp, Packet, SubAssignOp, PACKET_LANES};
use dense_view::{assert_index, DenseError, Dim, Layout, MatMut, MatRef, Overlap, Result, SameDim};

use crate::assign::{self, NoAlias};
use crate::traits::{AccessorsLevel, Flags, Nesting};

/// A readable `rows x cols` grid of coefficients.
///
/// Only [`Expr::rows`], [`Expr::cols`] and [`Expr::coeff`] are required. The
/// packet and linear accessors fall back to scalar reads, and nodes override
/// them when they can do better. Callers keep indices in range; logical
/// bounds checks live in the public entry points ([`crate::MatrixBase::at`]).
pub trait Expr {
    type Scalar: Element;
    type Rows: Dim;
    type Cols: Dim;

    const FLAGS: Flags;
    /// Estimated cost of producing one coefficient, in scalar operations.
    const COST: usize;
    const NESTING: Nesting = Nesting::ByValue;

    fn rows(&self) -> Self::Rows;
    fn cols(&self) -> Self::Cols;

    #[inline]
    fn nrows(&self) -> usize {
        self.rows().value()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.cols().value()
    }

    #[inline]
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    #[inline]
    fn size(&self) -> usize {
        self.nrows() * self.ncols()
    }

    fn coeff(&self, i: usize, j: usize) -> Self::Scalar;

    /// Coefficients `(i..i + PACKET_LANES, j)`.
    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<Self::Scalar> {
        Packet::from_fn(|k| self.coeff(i + k, j))
    }

    /// Coefficients `(i, j..j + PACKET_LANES)`.
    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<Self::Scalar> {
        Packet::from_fn(|k| self.coeff(i, j + k))
    }

    /// Coefficient `k` in the order given by [`Flags::ROW_MAJOR`].
    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> Self::Scalar {
        if Self::FLAGS.contains(Flags::ROW_MAJOR) {
            let cols = self.ncols();
            self.coeff(k / cols, k % cols)
        } else {
            let rows = self.nrows();
            self.coeff(k % rows, k / rows)
        }
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<Self::Scalar> {
        Packet::from_fn(|l| self.coeff_linear(k + l))
    }

    /// Strided storage holding exactly this expression's coefficients.
    #[inline]
    fn direct(&self) -> Option<MatRef<'_, Self::Scalar>> {
        None
    }

    /// Strided storage plus a pending conjugation.
    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, Self::Scalar>, bool)> {
        self.direct().map(|v| (v, false))
    }

    /// How the storage this expression reads relates to `dst`.
    ///
    /// Nodes that read their children at other positions than the ones they
    /// produce report [`Overlap::shuffled`] of their children.
    fn overlap(&self, dst: &Layout) -> Overlap {
        self.direct_conj()
            .map_or(Overlap::None, |(v, _)| v.layout().classify(dst))
    }

    /// `dst (func)= self` on a destination of the same shape that does not
    /// alias `self` at shuffled positions.
    fn eval_into<F: AssignFunctor<Self::Scalar>>(&self, dst: MatMut<'_, Self::Scalar>, func: F) -> Result<()>
    where
        Self: Sized,
    {
        assign::traverse(dst, self, func)
    }
}

impl<E: Expr> Expr for &E {
    type Scalar = E::Scalar;
    type Rows = E::Rows;
    type Cols = E::Cols;

    const FLAGS: Flags = E::FLAGS;
    const COST: usize = E::COST;
    const NESTING: Nesting = Nesting::ByRef;

    #[inline]
    fn rows(&self) -> E::Rows {
        (**self).rows()
    }
    #[inline]
    fn cols(&self) -> E::Cols {
        (**self).cols()
    }
    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        (**self).coeff(i, j)
    }
    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        (**self).packet_col(i, j)
    }
    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<E::Scalar> {
        (**self).packet_row(i, j)
    }
    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> E::Scalar {
        (**self).coeff_linear(k)
    }
    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<E::Scalar> {
        (**self).packet_linear(k)
    }
    #[inline]
    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        (**self).direct()
    }
    #[inline]
    fn direct_conj(&self) -> Option<(MatRef<'_, E::Scalar>, bool)> {
        (**self).direct_conj()
    }
    #[inline]
    fn overlap(&self, dst: &Layout) -> Overlap {
        (**self).overlap(dst)
    }
    fn eval_into<F: AssignFunctor<E::Scalar>>(&self, dst: MatMut<'_, E::Scalar>, func: F) -> Result<()> {
        (**self).eval_into(dst, func)
    }
}

/// Strided storage of `src` when its flags promise direct access.
///
/// The test is on the type, so nodes without [`Flags::DIRECT_ACCESS`] never
/// reach their `direct_conj`.
#[inline]
pub(crate) fn direct_operand<E: Expr>(src: &E) -> Option<(MatRef<'_, E::Scalar>, bool)> {
    if AccessorsLevel::from_flags(E::FLAGS).is_direct() {
        src.direct_conj()
    } else {
        None
    }
}

/// A destination with writable strided storage.
///
/// `Rows` and `Cols` are the destination's compile-time extents. Assigning a
/// source whose fixed extents disagree does not compile:
///
/// ```compile_fail
/// use dense::{ExprMut, Matrix2, Matrix3};
///
/// let mut a = Matrix3::<f64>::zeros();
/// a.assign(&Matrix2::<f64>::identity());
/// ```
///
/// A dynamic extent on either side defers the check to run time:
///
/// ```rust
/// use dense::{ExprMut, Matrix3, MatrixX};
///
/// let mut a = Matrix3::<f64>::zeros();
/// assert!(a.try_assign(&MatrixX::<f64>::identity(2, 2)).is_err());
/// a.assign(&MatrixX::<f64>::identity(3, 3));
/// assert_eq!(a[(2, 2)], 1.0);
/// ```
pub trait ExprMut {
    type Scalar: Element;
    type Rows: Dim;
    type Cols: Dim;

    fn target_shape(&self) -> (usize, usize);
    fn target_view(&mut self) -> MatMut<'_, Self::Scalar>;
    fn target_layout(&self) -> Layout;

    /// Make the destination `rows x cols`, or fail with
    /// [`DenseError::ShapeMismatch`] when it cannot be reshaped.
    fn resize_target(&mut self, rows: usize, cols: usize) -> Result<()> {
        let expected = self.target_shape();
        if expected == (rows, cols) {
            Ok(())
        } else {
            Err(DenseError::ShapeMismatch {
                expected,
                found: (rows, cols),
            })
        }
    }

    #[track_caller]
    fn coeff_mut(&mut self, i: usize, j: usize) -> &mut Self::Scalar {
        let (rows, cols) = self.target_shape();
        assert_index(i, j, rows, cols);
        self.target_view().into_coeff_mut(i, j)
    }

    /// Store `p` at `(i..i + PACKET_LANES, j)`.
    fn write_packet_col(&mut self, i: usize, j: usize, p: Packet<Self::Scalar>) {
        let mut view = self.target_view();
        match view.col_run_mut(i, j, PACKET_LANES) {
            Some(run) => p.store(run),
            None => {
                for k in 0..PACKET_LANES {
                    view.write(i + k, j, p.lane(k));
                }
            }
        }
    }

    /// Store `p` at `(i, j..j + PACKET_LANES)`.
    fn write_packet_row(&mut self, i: usize, j: usize, p: Packet<Self::Scalar>) {
        let mut view = self.target_view();
        match view.row_run_mut(i, j, PACKET_LANES) {
            Some(run) => p.store(run),
            None => {
                for k in 0..PACKET_LANES {
                    view.write(i, j + k, p.lane(k));
                }
            }
        }
    }

    /// `self = src`, resizing an empty dynamic destination.
    ///
    /// # Panics
    ///
    /// Panics when the shapes differ and the destination cannot be resized.
    #[track_caller]
    fn assign<E>(&mut self, src: E)
    where
        E: Expr<Scalar = Self::Scalar>,
        E::Rows: SameDim<Self::Rows>,
        E::Cols: SameDim<Self::Cols>,
    {
        if let Err(e) = self.try_assign(src) {
            assign::fault(e)
        }
    }

    fn try_assign<E>(&mut self, src: E) -> Result<()>
    where
        E: Expr<Scalar = Self::Scalar>,
        E::Rows: SameDim<Self::Rows>,
        E::Cols: SameDim<Self::Cols>,
    {
        assign::assign_expr(self, &src, AssignOp, true)
    }

    fn try_add_assign<E>(&mut self, src: E) -> Result<()>
    where
        E: Expr<Scalar = Self::Scalar>,
        E::Rows: SameDim<Self::Rows>,
        E::Cols: SameDim<Self::Cols>,
    {
        assign::assign_expr(self, &src, AddAssignOp, true)
    }

    fn try_sub_assign<E>(&mut self, src: E) -> Result<()>
    where
        E: Expr<Scalar = Self::Scalar>,
        E::Rows: SameDim<Self::Rows>,
        E::Cols: SameDim<Self::Cols>,
    {
        assign::assign_expr(self, &src, SubAssignOp, true)
    }

    /// Assign without the aliasing check.
    fn noalias(&mut self) -> NoAlias<'_, Self> {
        NoAlias::new(self)
    }

    fn fill(&mut self, value: Self::Scalar) {
        self.target_view().fill(value);
    }

    fn set_zero(&mut self) {
        self.fill(<Self::Scalar as num_traits::Zero>::zero());
    }

    fn set_identity(&mut self) {
        let mut view = self.target_view();
        for j in 0..view.ncols() {
            for i in 0..view.nrows() {
                let v = if i == j {
                    <Self::Scalar as num_traits::One>::one()
                } else {
                    <Self::Scalar as num_traits::Zero>::zero()
                };
                view.write(i, j, v);
            }
        }
    }

    /// Exchange the coefficients of two equally shaped destinations.
    fn try_swap<D>(&mut self, other: &mut D) -> Result<()>
    where
        D: ExprMut<Scalar = Self::Scalar> + ?Sized,
        D::Rows: SameDim<Self::Rows>,
        D::Cols: SameDim<Self::Cols>,
    {
        let expected = self.target_shape();
        let found = other.target_shape();
        if expected != found {
            return Err(DenseError::ShapeMismatch { expected, found });
        }
        let mut a = self.target_view();
        let mut b = other.target_view();
        for j in 0..expected.1 {
            for i in 0..expected.0 {
                let x = a.get(i, j);
                a.write(i, j, b.get(i, j));
                b.write(i, j, x);
            }
        }
        Ok(())
    }

    #[track_caller]
    fn swap<D>(&mut self, other: &mut D)
    where
        D: ExprMut<Scalar = Self::Scalar> + ?Sized,
        D::Rows: SameDim<Self::Rows>,
        D::Cols: SameDim<Self::Cols>,
    {
        if let Err(e) = self.try_swap(other) {
            assign::fault(e)
        }
    }
}
