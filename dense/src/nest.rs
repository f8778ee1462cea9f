//! Owning wrapper for an evaluated matrix inside an expression.

use std::fmt;

use dense_kernel::Element;
use dense_traits::{AssignFunctor, Packet};
use dense_view::{ColMajor, Dim, Layout, MatMut, MatRef, Overlap, Result, StorageOrder};

use crate::expr::Expr;
use crate::matrix::Matrix;
use crate::storage::Allocate;
use crate::traits::{Flags, Nesting};

/// A matrix held by value inside an expression tree.
///
/// `&Matrix` nests by reference, so an expression built from it cannot
/// outlive the matrix. `NestByValue` moves the matrix into the tree instead,
/// which lets a function return an expression over a result it computed.
pub struct NestByValue<T, R, C, O = ColMajor>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    value: Matrix<T, R, C, O>,
}

impl<T, R, C, O> NestByValue<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    pub fn new(value: Matrix<T, R, C, O>) -> Self {
        NestByValue { value }
    }

    pub fn into_inner(self) -> Matrix<T, R, C, O> {
        self.value
    }
}

impl<T, R, C, O> Clone for NestByValue<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn clone(&self) -> Self {
        NestByValue {
            value: self.value.clone(),
        }
    }
}

impl<T, R, C, O> fmt::Debug for NestByValue<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NestByValue").field(&self.value).finish()
    }
}

impl<T, R, C, O> Expr for NestByValue<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    const FLAGS: Flags = <&Matrix<T, R, C, O> as Expr>::FLAGS;
    const COST: usize = <&Matrix<T, R, C, O> as Expr>::COST;
    const NESTING: Nesting = Nesting::ByValue;

    #[inline]
    fn rows(&self) -> R {
        (&self.value).rows()
    }

    #[inline]
    fn cols(&self) -> C {
        (&self.value).cols()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> T {
        (&self.value).coeff(i, j)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<T> {
        (&self.value).packet_col(i, j)
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<T> {
        (&self.value).packet_row(i, j)
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> T {
        (&self.value).coeff_linear(k)
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<T> {
        (&self.value).packet_linear(k)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, T>> {
        Some(self.value.mat_ref())
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.value.mat_ref().layout().classify(dst)
    }

    fn eval_into<F: AssignFunctor<T>>(&self, dst: MatMut<'_, T>, func: F) -> Result<()> {
        (&self.value).eval_into(dst, func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixBase, MatrixX};
    use dense_view::Dyn;

    fn transposed_sums(n: usize) -> impl Expr<Scalar = f64> {
        let m = MatrixX::<f64>::from_fn(n, n, |i, j| (i + 2 * j) as f64);
        m.nest_by_value().transpose()
    }

    #[test]
    fn test_returned_expression_owns_its_matrix() {
        let t = transposed_sums(3);
        assert_eq!(t.coeff(2, 1), 5.0);
        assert_eq!(t.sum(), 27.0);
    }

    #[test]
    fn test_nesting_tags() {
        assert_eq!(<NestByValue<f64, Dyn, Dyn> as Expr>::NESTING, Nesting::ByValue);
        assert_eq!(<&MatrixX<f64> as Expr>::NESTING, Nesting::ByRef);
        assert_eq!(
            <NestByValue<f64, Dyn, Dyn> as Expr>::FLAGS,
            <&MatrixX<f64> as Expr>::FLAGS
        );
    }
}
