//! Methods shared by every expression.
//!
//! [`MatrixBase`] is implemented for every [`Expr`]. Its node-building
//! methods take the expression by value, so on a matrix they are called
//! through a reference: `(&m).transpose()`, or `m.transpose()` which
//! auto-references. Fallible methods come in pairs: `try_*` returns a
//! [`Result`], the plain form panics with the error's message.

use dense_kernel::{dot_with, Element, TriangularMode};
use dense_traits::functor::{
    Abs2Op, AbsOp, BinaryClosureOp, CastOp, ConjugateOp, DivideByOp, ImagOp, MaxOp, MinOp, ProductOp, QuotientOp,
    RealOp, SqrtOp, UnaryClosureOp,
};
use dense_traits::redux::{MaxRedux, MeanRedux, MinRedux, NormRedux, ProdRedux, SquaredNormRedux};
use dense_traits::{BinaryFunctor, ElementOpApply, RealScalar, Reducer, Scalar};
use dense_view::{check_index, assert_index, Const, DenseError, Result, SameDim, U1};
use num_traits::{One, Zero};

use crate::assign::fault;
use crate::block::{Block, Diagonal};
use crate::cwise::{CwiseBinary, CwiseUnary};
use crate::expr::{direct_operand, Expr};
use crate::matrix::Matrix;
use crate::redux;
use crate::reverse::{Replicate, Reverse};
use crate::select::Select;
use crate::storage::Allocate;
use crate::transpose::{Conjugate, Transpose};
use crate::triangular::TriangularView;
use crate::vectorwise::{Horizontal, Vertical, VectorwiseOp};

/// Real counterpart of an expression's scalar.
pub type RealOf<E> = <<E as Expr>::Scalar as Scalar>::Real;

/// Binary node, panicking when the run-time shapes differ.
#[track_caller]
pub(crate) fn binary<F, L, R>(lhs: L, rhs: R, func: F) -> CwiseBinary<F, L, R>
where
    L: Expr,
    R: Expr,
    L::Rows: SameDim<R::Rows>,
    L::Cols: SameDim<R::Cols>,
    F: BinaryFunctor<L::Scalar, R::Scalar>,
    F::Output: Element,
{
    CwiseBinary::try_new(lhs, rhs, func).unwrap_or_else(|e| fault(e))
}

/// Coefficient `k` of a vector-shaped expression.
#[inline]
fn vector_coeff<E: Expr>(e: &E, k: usize) -> E::Scalar {
    if e.ncols() == 1 {
        e.coeff(k, 0)
    } else {
        e.coeff(0, k)
    }
}

fn check_vector<E: Expr>(e: &E) -> Result<()> {
    let (rows, cols) = e.shape();
    if rows == 1 || cols == 1 {
        Ok(())
    } else {
        Err(DenseError::NotAVector { rows, cols })
    }
}

pub trait MatrixBase: Expr + Sized {
    // ------------------------------------------------------------------
    // Structural nodes
    // ------------------------------------------------------------------

    fn transpose(self) -> Transpose<Self> {
        Transpose::new(self)
    }

    /// Coefficient-wise complex conjugate; free on direct-access storage,
    /// where it becomes a flag handed to the kernels.
    fn conjugate(self) -> Conjugate<Self> {
        Conjugate::new(self)
    }

    /// Conjugate transpose.
    fn adjoint(self) -> Transpose<Conjugate<Self>> {
        Transpose::new(Conjugate::new(self))
    }

    fn try_block(self, i: usize, j: usize, rows: usize, cols: usize) -> Result<Block<Self>> {
        Block::try_new(self, i, j, dense_view::Dyn(rows), dense_view::Dyn(cols))
    }

    /// `rows x cols` window starting at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics when the window does not fit inside `self`.
    #[track_caller]
    fn block(self, i: usize, j: usize, rows: usize, cols: usize) -> Block<Self> {
        self.try_block(i, j, rows, cols).unwrap_or_else(|e| fault(e))
    }

    /// Window with compile-time extents.
    #[track_caller]
    fn fixed_block<const R: usize, const C: usize>(self, i: usize, j: usize) -> Block<Self, Const<R>, Const<C>> {
        Block::try_new(self, i, j, Const::<R>, Const::<C>).unwrap_or_else(|e| fault(e))
    }

    #[track_caller]
    fn row(self, i: usize) -> Block<Self, U1, Self::Cols> {
        let cols = self.cols();
        Block::try_new(self, i, 0, U1::default(), cols).unwrap_or_else(|e| fault(e))
    }

    #[track_caller]
    fn col(self, j: usize) -> Block<Self, Self::Rows, U1> {
        let rows = self.rows();
        Block::try_new(self, 0, j, rows, U1::default()).unwrap_or_else(|e| fault(e))
    }

    /// `n` coefficients of a vector starting at `start`.
    fn try_segment(self, start: usize, n: usize) -> Result<Block<Self>> {
        check_vector(&self)?;
        if self.ncols() == 1 {
            self.try_block(start, 0, n, 1)
        } else {
            self.try_block(0, start, 1, n)
        }
    }

    #[track_caller]
    fn segment(self, start: usize, n: usize) -> Block<Self> {
        self.try_segment(start, n).unwrap_or_else(|e| fault(e))
    }

    #[track_caller]
    fn head(self, n: usize) -> Block<Self> {
        self.segment(0, n)
    }

    #[track_caller]
    fn tail(self, n: usize) -> Block<Self> {
        let start = self.size().saturating_sub(n);
        self.segment(start, n)
    }

    #[track_caller]
    fn top_rows(self, n: usize) -> Block<Self> {
        let cols = self.ncols();
        self.block(0, 0, n, cols)
    }

    #[track_caller]
    fn bottom_rows(self, n: usize) -> Block<Self> {
        let (rows, cols) = self.shape();
        self.block(rows.saturating_sub(n), 0, n, cols)
    }

    #[track_caller]
    fn left_cols(self, n: usize) -> Block<Self> {
        let rows = self.nrows();
        self.block(0, 0, rows, n)
    }

    #[track_caller]
    fn right_cols(self, n: usize) -> Block<Self> {
        let (rows, cols) = self.shape();
        self.block(0, cols.saturating_sub(n), rows, n)
    }

    #[track_caller]
    fn top_left_corner(self, rows: usize, cols: usize) -> Block<Self> {
        self.block(0, 0, rows, cols)
    }

    #[track_caller]
    fn top_right_corner(self, rows: usize, cols: usize) -> Block<Self> {
        let j = self.ncols().saturating_sub(cols);
        self.block(0, j, rows, cols)
    }

    #[track_caller]
    fn bottom_left_corner(self, rows: usize, cols: usize) -> Block<Self> {
        let i = self.nrows().saturating_sub(rows);
        self.block(i, 0, rows, cols)
    }

    #[track_caller]
    fn bottom_right_corner(self, rows: usize, cols: usize) -> Block<Self> {
        let (r, c) = self.shape();
        self.block(r.saturating_sub(rows), c.saturating_sub(cols), rows, cols)
    }

    /// Main diagonal as a column.
    fn diagonal(self) -> Diagonal<Self> {
        Diagonal::new(self)
    }

    fn reverse(self) -> Reverse<Self, true, true> {
        Reverse::new(self)
    }

    /// Rows in reverse order.
    fn reverse_rows(self) -> Reverse<Self, true, false> {
        Reverse::new(self)
    }

    /// Columns in reverse order.
    fn reverse_cols(self) -> Reverse<Self, false, true> {
        Reverse::new(self)
    }

    fn replicate(self, row_factor: usize, col_factor: usize) -> Replicate<Self> {
        Replicate::new(self, row_factor, col_factor)
    }

    /// `then` where `self` is non-zero, `otherwise` elsewhere.
    #[track_caller]
    fn select<Th, El>(self, then: Th, otherwise: El) -> Select<Self, Th, El>
    where
        Th: Expr,
        El: Expr<Scalar = Th::Scalar>,
    {
        Select::try_new(self, then, otherwise).unwrap_or_else(|e| fault(e))
    }

    /// Reductions of each column.
    fn colwise(self) -> VectorwiseOp<Self, Vertical> {
        VectorwiseOp::new(self)
    }

    /// Reductions of each row.
    fn rowwise(self) -> VectorwiseOp<Self, Horizontal> {
        VectorwiseOp::new(self)
    }

    fn try_triangular_view(self, mode: TriangularMode) -> Result<TriangularView<Self>> {
        TriangularView::try_new(self, mode)
    }

    #[track_caller]
    fn triangular_view(self, mode: TriangularMode) -> TriangularView<Self> {
        self.try_triangular_view(mode).unwrap_or_else(|e| fault(e))
    }

    // ------------------------------------------------------------------
    // Coefficient-wise nodes
    // ------------------------------------------------------------------

    fn map<U, G>(self, f: G) -> CwiseUnary<UnaryClosureOp<G>, Self>
    where
        U: Element,
        G: Fn(Self::Scalar) -> U + Clone,
    {
        CwiseUnary::new(self, UnaryClosureOp(f))
    }

    #[track_caller]
    fn zip_with<Rhs, U, G>(self, rhs: Rhs, f: G) -> CwiseBinary<BinaryClosureOp<G>, Self, Rhs>
    where
        Rhs: Expr,
        Self::Rows: SameDim<Rhs::Rows>,
        Self::Cols: SameDim<Rhs::Cols>,
        U: Element,
        G: Fn(Self::Scalar, Rhs::Scalar) -> U + Clone,
    {
        binary(self, rhs, BinaryClosureOp(f))
    }

    fn cast<U>(self) -> CwiseUnary<CastOp<U>, Self>
    where
        U: Element,
        Self::Scalar: Into<U>,
    {
        CwiseUnary::new(self, CastOp::new())
    }

    fn real(self) -> CwiseUnary<RealOp, Self>
    where
        RealOf<Self>: Element,
    {
        CwiseUnary::new(self, RealOp)
    }

    fn imag(self) -> CwiseUnary<ImagOp, Self>
    where
        RealOf<Self>: Element,
    {
        CwiseUnary::new(self, ImagOp)
    }

    /// Conjugate as a plain unary node, without the pending-flag
    /// bookkeeping of [`MatrixBase::conjugate`].
    fn cwise_conjugate(self) -> CwiseUnary<ConjugateOp, Self> {
        CwiseUnary::new(self, ConjugateOp)
    }

    fn cwise_abs(self) -> CwiseUnary<AbsOp, Self>
    where
        RealOf<Self>: Element,
    {
        CwiseUnary::new(self, AbsOp)
    }

    fn cwise_abs2(self) -> CwiseUnary<Abs2Op, Self>
    where
        RealOf<Self>: Element,
    {
        CwiseUnary::new(self, Abs2Op)
    }

    fn cwise_sqrt(self) -> CwiseUnary<SqrtOp, Self> {
        CwiseUnary::new(self, SqrtOp)
    }

    #[track_caller]
    fn cwise_product<Rhs>(self, rhs: Rhs) -> CwiseBinary<ProductOp, Self, Rhs>
    where
        Rhs: Expr<Scalar = Self::Scalar>,
        Self::Rows: SameDim<Rhs::Rows>,
        Self::Cols: SameDim<Rhs::Cols>,
    {
        binary(self, rhs, ProductOp)
    }

    #[track_caller]
    fn cwise_quotient<Rhs>(self, rhs: Rhs) -> CwiseBinary<QuotientOp, Self, Rhs>
    where
        Rhs: Expr<Scalar = Self::Scalar>,
        Self::Rows: SameDim<Rhs::Rows>,
        Self::Cols: SameDim<Rhs::Cols>,
    {
        binary(self, rhs, QuotientOp)
    }

    #[track_caller]
    fn cwise_min<Rhs>(self, rhs: Rhs) -> CwiseBinary<MinOp, Self, Rhs>
    where
        Self::Scalar: RealScalar,
        Rhs: Expr<Scalar = Self::Scalar>,
        Self::Rows: SameDim<Rhs::Rows>,
        Self::Cols: SameDim<Rhs::Cols>,
    {
        binary(self, rhs, MinOp)
    }

    #[track_caller]
    fn cwise_max<Rhs>(self, rhs: Rhs) -> CwiseBinary<MaxOp, Self, Rhs>
    where
        Self::Scalar: RealScalar,
        Rhs: Expr<Scalar = Self::Scalar>,
        Self::Rows: SameDim<Rhs::Rows>,
        Self::Cols: SameDim<Rhs::Cols>,
    {
        binary(self, rhs, MaxOp)
    }

    // ------------------------------------------------------------------
    // Reductions
    // ------------------------------------------------------------------

    /// Fold every coefficient with `reducer`.
    fn redux<Rd: Reducer<Self::Scalar>>(self, reducer: Rd) -> Rd::Output {
        redux::redux(&self, reducer)
    }

    /// Sum of all coefficients; zero when empty.
    fn sum(self) -> Self::Scalar {
        redux::sum(&self)
    }

    /// Product of all coefficients; one when empty.
    fn prod(self) -> Self::Scalar {
        redux::redux(&self, ProdRedux)
    }

    fn mean(self) -> Self::Scalar {
        redux::redux(&self, MeanRedux)
    }

    /// Sum of the main diagonal.
    fn trace(self) -> Self::Scalar {
        redux::sum(&Diagonal::new(self))
    }

    /// `sum(self[k] * conj(rhs[k]))` over two vectors of the same length.
    fn try_dot<Rhs>(self, rhs: Rhs) -> Result<Self::Scalar>
    where
        Rhs: Expr<Scalar = Self::Scalar>,
    {
        check_vector(&self)?;
        check_vector(&rhs)?;
        if self.size() != rhs.size() {
            return Err(DenseError::ShapeMismatch {
                expected: self.shape(),
                found: rhs.shape(),
            });
        }
        if let (Some((a, conj_a)), Some((b, conj_b))) = (direct_operand(&self), direct_operand(&rhs)) {
            return dot_with(a, conj_a, b, !conj_b);
        }
        Ok((0..self.size()).fold(Self::Scalar::zero(), |acc, k| {
            acc + vector_coeff(&self, k) * vector_coeff(&rhs, k).conj()
        }))
    }

    #[track_caller]
    fn dot<Rhs>(self, rhs: Rhs) -> Self::Scalar
    where
        Rhs: Expr<Scalar = Self::Scalar>,
    {
        self.try_dot(rhs).unwrap_or_else(|e| fault(e))
    }

    fn squared_norm(self) -> RealOf<Self> {
        redux::redux(&self, SquaredNormRedux)
    }

    /// Frobenius norm (Euclidean norm for vectors).
    fn norm(self) -> RealOf<Self> {
        redux::redux(&self, NormRedux)
    }

    /// `self / self.norm()`, or `self` unchanged when the norm is zero.
    fn normalized(self) -> CwiseUnary<DivideByOp<Self::Scalar>, Self> {
        let n = redux::redux(&self, NormRedux);
        let divisor = if n.is_zero() {
            Self::Scalar::one()
        } else {
            Self::Scalar::from_real(n)
        };
        CwiseUnary::new(self, DivideByOp(divisor))
    }

    /// Largest coefficient, or [`DenseError::EmptyReduction`].
    fn try_max_coeff(self) -> Result<Self::Scalar>
    where
        Self::Scalar: RealScalar,
    {
        if self.size() == 0 {
            return Err(DenseError::EmptyReduction);
        }
        Ok(redux::redux(&self, MaxRedux))
    }

    #[track_caller]
    fn max_coeff(self) -> Self::Scalar
    where
        Self::Scalar: RealScalar,
    {
        self.try_max_coeff().unwrap_or_else(|e| fault(e))
    }

    fn try_min_coeff(self) -> Result<Self::Scalar>
    where
        Self::Scalar: RealScalar,
    {
        if self.size() == 0 {
            return Err(DenseError::EmptyReduction);
        }
        Ok(redux::redux(&self, MinRedux))
    }

    #[track_caller]
    fn min_coeff(self) -> Self::Scalar
    where
        Self::Scalar: RealScalar,
    {
        self.try_min_coeff().unwrap_or_else(|e| fault(e))
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    /// `|self - other|^2 <= prec^2 * min(|self|^2, |other|^2)` in the
    /// Frobenius norm; false when the shapes differ.
    fn is_approx_with<O>(self, other: O, prec: RealOf<Self>) -> bool
    where
        O: Expr<Scalar = Self::Scalar>,
    {
        if self.shape() != other.shape() {
            return false;
        }
        let zero = RealOf::<Self>::zero();
        let (mut diff, mut a, mut b) = (zero, zero, zero);
        let (rows, cols) = self.shape();
        for j in 0..cols {
            for i in 0..rows {
                let x = self.coeff(i, j);
                let y = other.coeff(i, j);
                diff = diff + (x - y).abs2();
                a = a + x.abs2();
                b = b + y.abs2();
            }
        }
        diff <= prec * prec * a.min_of(b)
    }

    /// [`MatrixBase::is_approx_with`] at the scalar's default precision.
    fn is_approx<O>(self, other: O) -> bool
    where
        O: Expr<Scalar = Self::Scalar>,
    {
        self.is_approx_with(other, Self::Scalar::dummy_precision())
    }

    /// `|self|^2 <= prec^2 * other^2`.
    fn is_much_smaller_than_with(self, other: RealOf<Self>, prec: RealOf<Self>) -> bool {
        redux::redux(&self, SquaredNormRedux) <= prec * prec * other * other
    }

    fn is_much_smaller_than(self, other: RealOf<Self>) -> bool {
        self.is_much_smaller_than_with(other, Self::Scalar::dummy_precision())
    }

    /// Every coefficient has modulus at most `prec`.
    fn is_zero_with(self, prec: RealOf<Self>) -> bool {
        let (rows, cols) = self.shape();
        (0..cols).all(|j| (0..rows).all(|i| self.coeff(i, j).abs() <= prec))
    }

    fn is_zero(self) -> bool {
        self.is_zero_with(Self::Scalar::dummy_precision())
    }

    /// Within `prec` of the identity, coefficient by coefficient.
    fn is_identity_with(self, prec: RealOf<Self>) -> bool {
        let (rows, cols) = self.shape();
        (0..cols).all(|j| {
            (0..rows).all(|i| {
                let target = if i == j {
                    Self::Scalar::one()
                } else {
                    Self::Scalar::zero()
                };
                (self.coeff(i, j) - target).abs() <= prec
            })
        })
    }

    fn is_identity(self) -> bool {
        self.is_identity_with(Self::Scalar::dummy_precision())
    }

    /// Same shape and exactly equal coefficients.
    fn equals<O>(self, other: O) -> bool
    where
        O: Expr<Scalar = Self::Scalar>,
    {
        if self.shape() != other.shape() {
            return false;
        }
        let (rows, cols) = self.shape();
        (0..cols).all(|j| (0..rows).all(|i| self.coeff(i, j) == other.coeff(i, j)))
    }

    // ------------------------------------------------------------------
    // Evaluation and access
    // ------------------------------------------------------------------

    /// Evaluate into a new matrix with the same extents.
    fn eval(self) -> Matrix<Self::Scalar, Self::Rows, Self::Cols>
    where
        (Self::Rows, Self::Cols): Allocate<Self::Scalar>,
        Self::Rows: SameDim<Self::Rows>,
        Self::Cols: SameDim<Self::Cols>,
    {
        Matrix::from_expr(self)
    }

    /// Coefficient `(i, j)`, always bounds checked.
    fn try_at(self, i: usize, j: usize) -> Result<Self::Scalar> {
        let (rows, cols) = self.shape();
        check_index(i, j, rows, cols)?;
        Ok(self.coeff(i, j))
    }

    /// Coefficient `(i, j)`, bounds checked according to the check policy.
    #[track_caller]
    fn at(self, i: usize, j: usize) -> Self::Scalar {
        let (rows, cols) = self.shape();
        assert_index(i, j, rows, cols);
        self.coeff(i, j)
    }
}

impl<E: Expr> MatrixBase for E {}
