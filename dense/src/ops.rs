//! Arithmetic operators on expressions.
//!
//! Every node type and every borrowed matrix or map gets the same set of
//! operators: `+`, `-` and unary `-` build coefficient-wise nodes, `*`
//! between two expressions builds a [`Product`], and `*` or `/` by a scalar
//! builds a scaled node. Operators panic on shape mismatches; the checked
//! forms live on [`MatrixBase`](crate::MatrixBase) and the node constructors.

use std::ops::{Add, Div, Mul, Neg, Sub};

use dense_traits::functor::{DifferenceOp, DivideByOp, LeftMultipleOp, MultipleOp, OppositeOp, SumOp};
use dense_view::{Dim, SameDim, StorageOrder};
use num_complex::Complex;

use crate::assign::fault;
use crate::base::binary;
use crate::block::{Block, Diagonal};
use crate::cwise::{CwiseBinary, CwiseNullary, CwiseUnary};
use crate::expr::Expr;
use crate::map::{Map, MapMut};
use crate::matrix::Matrix;
use crate::nest::NestByValue;
use crate::product::{Product, TriangularProduct};
use crate::reverse::{Replicate, Reverse};
use crate::select::Select;
use crate::storage::Allocate;
use crate::transpose::{Conjugate, Transpose};
use crate::triangular::TriangularView;
use crate::vectorwise::PartialRedux;

/// `expr * s`, `expr / s` and `s * expr` for one scalar type.
macro_rules! impl_scalar_ops {
    ([$($gen:tt)*] $ty:ty where [$($w:tt)*]; $s:ty) => {
        impl<$($gen)*> Mul<$s> for $ty
        where
            $($w)*
            $ty: Expr<Scalar = $s>,
        {
            type Output = CwiseUnary<MultipleOp<$s>, $ty>;

            #[inline]
            fn mul(self, rhs: $s) -> Self::Output {
                CwiseUnary::new(self, MultipleOp(rhs))
            }
        }

        impl<$($gen)*> Div<$s> for $ty
        where
            $($w)*
            $ty: Expr<Scalar = $s>,
        {
            type Output = CwiseUnary<DivideByOp<$s>, $ty>;

            #[inline]
            fn div(self, rhs: $s) -> Self::Output {
                CwiseUnary::new(self, DivideByOp(rhs))
            }
        }

        impl<$($gen)*> Mul<$ty> for $s
        where
            $($w)*
            $ty: Expr<Scalar = $s>,
        {
            type Output = CwiseUnary<LeftMultipleOp<$s>, $ty>;

            #[inline]
            fn mul(self, rhs: $ty) -> Self::Output {
                CwiseUnary::new(rhs, LeftMultipleOp(self))
            }
        }
    };
}

/// `+`, binary `-`, unary `-` and the scalar operators.
macro_rules! impl_cwise_ops {
    ([$($gen:tt)*] $ty:ty $(where [$($w:tt)*])?) => {
        impl<$($gen)*, Rhs> Add<Rhs> for $ty
        where
            $($($w)*)?
            $ty: Expr,
            Rhs: Expr<Scalar = <$ty as Expr>::Scalar>,
            <$ty as Expr>::Rows: SameDim<Rhs::Rows>,
            <$ty as Expr>::Cols: SameDim<Rhs::Cols>,
        {
            type Output = CwiseBinary<SumOp, $ty, Rhs>;

            #[inline]
            #[track_caller]
            fn add(self, rhs: Rhs) -> Self::Output {
                binary(self, rhs, SumOp)
            }
        }

        impl<$($gen)*, Rhs> Sub<Rhs> for $ty
        where
            $($($w)*)?
            $ty: Expr,
            Rhs: Expr<Scalar = <$ty as Expr>::Scalar>,
            <$ty as Expr>::Rows: SameDim<Rhs::Rows>,
            <$ty as Expr>::Cols: SameDim<Rhs::Cols>,
        {
            type Output = CwiseBinary<DifferenceOp, $ty, Rhs>;

            #[inline]
            #[track_caller]
            fn sub(self, rhs: Rhs) -> Self::Output {
                binary(self, rhs, DifferenceOp)
            }
        }

        impl<$($gen)*> Neg for $ty
        where
            $($($w)*)?
            $ty: Expr,
        {
            type Output = CwiseUnary<OppositeOp, $ty>;

            #[inline]
            fn neg(self) -> Self::Output {
                CwiseUnary::new(self, OppositeOp)
            }
        }

        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; f32);
        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; f64);
        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; i32);
        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; i64);
        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; Complex<f32>);
        impl_scalar_ops!([$($gen)*] $ty where [$($($w)*)?]; Complex<f64>);
    };
}

/// `*` between two expressions.
macro_rules! impl_product_op {
    ([$($gen:tt)*] $ty:ty $(where [$($w:tt)*])?) => {
        impl<$($gen)*, Rhs> Mul<Rhs> for $ty
        where
            $($($w)*)?
            $ty: Expr,
            Rhs: Expr<Scalar = <$ty as Expr>::Scalar>,
            <$ty as Expr>::Cols: SameDim<Rhs::Rows>,
        {
            type Output = Product<$ty, Rhs>;

            #[inline]
            #[track_caller]
            fn mul(self, rhs: Rhs) -> Self::Output {
                Product::try_new(self, rhs).unwrap_or_else(|e| fault(e))
            }
        }
    };
}

/// Both operator families for one type.
macro_rules! impl_expr_ops {
    ($([$($gen:tt)*] $ty:ty $(where [$($w:tt)*])?;)*) => {
        $(
            impl_cwise_ops!([$($gen)*] $ty $(where [$($w)*])?);
            impl_product_op!([$($gen)*] $ty $(where [$($w)*])?);
        )*
    };
}

impl_expr_ops! {
    ['a, T, R, C, O] &'a Matrix<T, R, C, O>
        where [T: dense_kernel::Element, R: Dim, C: Dim, O: StorageOrder, (R, C): Allocate<T>,];
    [T, R, C, O] NestByValue<T, R, C, O>
        where [T: dense_kernel::Element, R: Dim, C: Dim, O: StorageOrder, (R, C): Allocate<T>,];
    ['a, T, R, C] Map<'a, T, R, C>;
    ['a, 'b, T, R, C] &'a MapMut<'b, T, R, C>;
    [F, T, R, C] CwiseNullary<F, T, R, C>;
    [F, E] CwiseUnary<F, E>;
    [F, L, R] CwiseBinary<F, L, R>;
    [E] Transpose<E>;
    [E] Conjugate<E>;
    [E, R, C] Block<E, R, C>;
    [E] Diagonal<E>;
    [E, const ROWS: bool, const COLS: bool] Reverse<E, ROWS, COLS>;
    [E] Replicate<E>;
    [Cnd, Th, El] Select<Cnd, Th, El>;
    [E, Rd, D] PartialRedux<E, Rd, D>;
    [L, R] Product<L, R> where [L: Expr, R: Expr,];
    [E, R] TriangularProduct<E, R> where [E: Expr, R: Expr,];
}

impl_cwise_ops!([E] TriangularView<E>);

/// A triangular view times an expression runs the triangular kernel.
impl<E, Rhs> Mul<Rhs> for TriangularView<E>
where
    E: Expr,
    Rhs: Expr<Scalar = E::Scalar>,
    E::Cols: SameDim<Rhs::Rows>,
{
    type Output = TriangularProduct<E, Rhs>;

    #[inline]
    #[track_caller]
    fn mul(self, rhs: Rhs) -> Self::Output {
        TriangularProduct::try_new(self, rhs).unwrap_or_else(|e| fault(e))
    }
}
