//! Coefficient-wise nodes: generators, maps and zips.

use std::marker::PhantomData;

use dense_kernel::Element;
use dense_traits::functor::{ConstantOp, FromFnOp, IdentityOp, LinSpacedOp};
use dense_traits::{BinaryFunctor, NullaryFunctor, Packet, RealScalar, UnaryFunctor};
use dense_view::{DenseError, Dim, Dyn, Layout, Overlap, Result, SameDim, U1};

use crate::expr::Expr;
use crate::traits::Flags;

// ============================================================================
// Nullary
// ============================================================================

/// Coefficients computed from their position by a [`NullaryFunctor`].
#[derive(Debug, Clone)]
pub struct CwiseNullary<F, T, R = Dyn, C = Dyn> {
    func: F,
    rows: R,
    cols: C,
    _scalar: PhantomData<T>,
}

impl<F, T, R, C> CwiseNullary<F, T, R, C>
where
    F: NullaryFunctor<T>,
    T: Element,
    R: Dim,
    C: Dim,
{
    pub fn new(rows: R, cols: C, func: F) -> Self {
        CwiseNullary {
            func,
            rows,
            cols,
            _scalar: PhantomData,
        }
    }

    pub fn functor(&self) -> &F {
        &self.func
    }
}

impl<T: Element, R: Dim, C: Dim> CwiseNullary<ConstantOp<T>, T, R, C> {
    pub fn constant(rows: R, cols: C, value: T) -> Self {
        Self::new(rows, cols, ConstantOp(value))
    }

    pub fn zeros(rows: R, cols: C) -> Self {
        Self::constant(rows, cols, T::zero())
    }

    pub fn ones(rows: R, cols: C) -> Self {
        Self::constant(rows, cols, T::one())
    }
}

impl<T: Element, R: Dim, C: Dim> CwiseNullary<IdentityOp, T, R, C> {
    pub fn identity(rows: R, cols: C) -> Self {
        Self::new(rows, cols, IdentityOp)
    }
}

impl<T: Element, R: Dim, C: Dim, G: Fn(usize, usize) -> T + Clone> CwiseNullary<FromFnOp<G>, T, R, C> {
    pub fn from_fn(rows: R, cols: C, f: G) -> Self {
        Self::new(rows, cols, FromFnOp(f))
    }
}

impl<T: Element + RealScalar> CwiseNullary<LinSpacedOp<T>, T, Dyn, U1> {
    /// Column of `n` evenly spaced values from `low` to `high`.
    pub fn lin_spaced(n: usize, low: T, high: T) -> Self {
        Self::new(Dyn(n), U1::default(), LinSpacedOp::new(n, low, high))
    }
}

impl<F, T, R, C> Expr for CwiseNullary<F, T, R, C>
where
    F: NullaryFunctor<T>,
    T: Element,
    R: Dim,
    C: Dim,
{
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    const FLAGS: Flags = Flags::LINEAR_ACCESS.with_if(Flags::PACKET_ACCESS, F::PACKET_ACCESS);
    const COST: usize = F::COST;

    #[inline]
    fn rows(&self) -> R {
        self.rows
    }

    #[inline]
    fn cols(&self) -> C {
        self.cols
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> T {
        self.func.call(i, j)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<T> {
        self.func.packet(i, j)
    }

    fn overlap(&self, _dst: &Layout) -> Overlap {
        Overlap::None
    }
}

// ============================================================================
// Unary
// ============================================================================

/// `func(inner(i, j))` for every coefficient.
#[derive(Debug, Clone)]
pub struct CwiseUnary<F, E> {
    func: F,
    inner: E,
}

impl<F, E> CwiseUnary<F, E>
where
    E: Expr,
    F: UnaryFunctor<E::Scalar>,
    F::Output: Element,
{
    pub fn new(inner: E, func: F) -> Self {
        CwiseUnary { func, inner }
    }

    pub fn nested(&self) -> &E {
        &self.inner
    }

    pub fn functor(&self) -> &F {
        &self.func
    }
}

impl<F, E> Expr for CwiseUnary<F, E>
where
    E: Expr,
    F: UnaryFunctor<E::Scalar>,
    F::Output: Element,
{
    type Scalar = F::Output;
    type Rows = E::Rows;
    type Cols = E::Cols;

    const FLAGS: Flags = E::FLAGS
        .intersect(Flags::ROW_MAJOR.union(Flags::LINEAR_ACCESS))
        .with_if(
            Flags::PACKET_ACCESS,
            E::FLAGS.contains(Flags::PACKET_ACCESS) && F::PACKET_ACCESS,
        );
    const COST: usize = E::COST + F::COST;

    #[inline]
    fn rows(&self) -> E::Rows {
        self.inner.rows()
    }

    #[inline]
    fn cols(&self) -> E::Cols {
        self.inner.cols()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> F::Output {
        self.func.call(self.inner.coeff(i, j))
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<F::Output> {
        self.func.packet(self.inner.packet_col(i, j))
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<F::Output> {
        self.func.packet(self.inner.packet_row(i, j))
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> F::Output {
        self.func.call(self.inner.coeff_linear(k))
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<F::Output> {
        self.func.packet(self.inner.packet_linear(k))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.inner.overlap(dst)
    }
}

// ============================================================================
// Binary
// ============================================================================

/// `func(lhs(i, j), rhs(i, j))` for every coefficient.
///
/// Extents merge through [`SameDim`], so a fixed extent on either side wins
/// and two different fixed extents do not type-check.
#[derive(Debug, Clone)]
pub struct CwiseBinary<F, L, R> {
    func: F,
    lhs: L,
    rhs: R,
}

impl<F, L, R> CwiseBinary<F, L, R>
where
    L: Expr,
    R: Expr,
    L::Rows: SameDim<R::Rows>,
    L::Cols: SameDim<R::Cols>,
    F: BinaryFunctor<L::Scalar, R::Scalar>,
    F::Output: Element,
{
    /// Fails with [`DenseError::ShapeMismatch`] when the run-time shapes
    /// differ.
    pub fn try_new(lhs: L, rhs: R, func: F) -> Result<Self> {
        let rows_ok = lhs.rows().same(rhs.rows()).is_some();
        let cols_ok = lhs.cols().same(rhs.cols()).is_some();
        if !(rows_ok && cols_ok) {
            return Err(DenseError::ShapeMismatch {
                expected: lhs.shape(),
                found: rhs.shape(),
            });
        }
        Ok(CwiseBinary { func, lhs, rhs })
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }
}

impl<F, L, R> Expr for CwiseBinary<F, L, R>
where
    L: Expr,
    R: Expr,
    L::Rows: SameDim<R::Rows>,
    L::Cols: SameDim<R::Cols>,
    F: BinaryFunctor<L::Scalar, R::Scalar>,
    F::Output: Element,
{
    type Scalar = F::Output;
    type Rows = <L::Rows as SameDim<R::Rows>>::Output;
    type Cols = <L::Cols as SameDim<R::Cols>>::Output;

    const FLAGS: Flags = {
        let same_order = L::FLAGS.contains(Flags::ROW_MAJOR) == R::FLAGS.contains(Flags::ROW_MAJOR);
        let both = L::FLAGS.intersect(R::FLAGS);
        L::FLAGS
            .intersect(Flags::ROW_MAJOR)
            .with_if(
                Flags::LINEAR_ACCESS,
                same_order && both.contains(Flags::LINEAR_ACCESS),
            )
            .with_if(
                Flags::PACKET_ACCESS,
                both.contains(Flags::PACKET_ACCESS) && F::PACKET_ACCESS,
            )
    };
    const COST: usize = L::COST + R::COST + F::COST;

    #[inline]
    fn rows(&self) -> Self::Rows {
        self.lhs.rows().merge(self.rhs.rows())
    }

    #[inline]
    fn cols(&self) -> Self::Cols {
        self.lhs.cols().merge(self.rhs.cols())
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> F::Output {
        self.func.call(self.lhs.coeff(i, j), self.rhs.coeff(i, j))
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<F::Output> {
        self.func
            .packet(self.lhs.packet_col(i, j), self.rhs.packet_col(i, j))
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<F::Output> {
        self.func
            .packet(self.lhs.packet_row(i, j), self.rhs.packet_row(i, j))
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> F::Output {
        self.func
            .call(self.lhs.coeff_linear(k), self.rhs.coeff_linear(k))
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<F::Output> {
        self.func
            .packet(self.lhs.packet_linear(k), self.rhs.packet_linear(k))
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.lhs.overlap(dst).max(self.rhs.overlap(dst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixBase, MatrixX, VectorX, U2, U3};
    use dense_traits::functor::{ProductOp, SumOp};

    #[test]
    fn test_nullary_generators() {
        let c = CwiseNullary::<_, f64, _, _>::constant(Dyn(2), Dyn(3), 1.5);
        assert_eq!(c.shape(), (2, 3));
        assert_eq!(c.coeff(1, 2), 1.5);
        let id = CwiseNullary::<IdentityOp, i32, U3, U3>::identity(U3::default(), U3::default());
        assert_eq!(id.trace(), 3);
        let lin = CwiseNullary::lin_spaced(5, 0.0f64, 1.0);
        assert_eq!(lin.coeff(4, 0), 1.0);
        assert_eq!(lin.coeff(2, 0), 0.5);
    }

    #[test]
    fn test_binary_dims_merge() {
        let a = MatrixX::<f64>::zeros(2, 3);
        let b = crate::Matrix::<f64, U2, U3>::zeros();
        let sum = CwiseBinary::try_new(&a, &b, SumOp).unwrap();
        let _: (U2, U3) = (sum.rows(), sum.cols());
        let c = MatrixX::<f64>::zeros(3, 2);
        assert!(matches!(
            CwiseBinary::try_new(&a, &c, SumOp),
            Err(DenseError::ShapeMismatch { expected: (2, 3), found: (3, 2) })
        ));
    }

    #[test]
    fn test_flags_propagate() {
        type M<'a> = &'a MatrixX<f32>;
        type Sum<'a> = CwiseBinary<SumOp, M<'a>, M<'a>>;
        assert!(<Sum as Expr>::FLAGS.contains(Flags::LINEAR_ACCESS.union(Flags::PACKET_ACCESS)));
        assert!(!<Sum as Expr>::FLAGS.contains(Flags::DIRECT_ACCESS));
        type Mapped<'a> = CwiseUnary<dense_traits::functor::UnaryClosureOp<fn(f32) -> f32>, M<'a>>;
        assert!(!<Mapped as Expr>::FLAGS.contains(Flags::PACKET_ACCESS));
    }

    #[test]
    fn test_cwise_product_of_vectors() {
        let a = VectorX::<i64>::from_fn(5, |i| i as i64);
        let b = VectorX::<i64>::from_fn(5, |i| 2 * i as i64);
        let p = CwiseBinary::try_new(&a, &b, ProductOp).unwrap();
        assert_eq!(p.sum(), 2 * (1 + 4 + 9 + 16));
    }
}
