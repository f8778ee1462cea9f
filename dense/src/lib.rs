//! Dense linear algebra built from lazy expression trees.
//!
//! Arithmetic on matrices does not compute anything by itself: `&a + &b * 2.0`
//! builds a tree of expression nodes, and the work happens when the tree is
//! assigned to a destination. The assignment engine then picks a loop
//! structure from the compile-time traits of the tree and the run-time
//! layout of the destination. It inserts a temporary when source and
//! destination overlap.
//!
//! # Core Types
//!
//! - [`Matrix`]: owned storage, fixed or dynamic in each dimension
//! - [`Map`] / [`MapMut`]: matrices over borrowed, possibly strided memory
//! - [`Expr`]: the coefficient access protocol every node implements
//! - [`ExprMut`]: assignment destinations, with checked `try_*` forms
//! - [`MatrixBase`]: node builders, reductions and fuzzy comparisons
//!
//! # Nodes
//!
//! - [`CwiseNullary`], [`CwiseUnary`], [`CwiseBinary`]: coefficient-wise functors
//! - [`Transpose`], [`Conjugate`], [`Block`], [`Diagonal`], [`Reverse`],
//!   [`Replicate`], [`Select`]: structural views
//! - [`PartialRedux`]: per-column and per-row reductions
//! - [`Product`], [`TriangularProduct`]: matrix products, evaluated once
//!   and cached when nested in a larger tree
//!
//! # Example
//!
//! ```rust
//! use dense::{MatrixBase, MatrixX, VectorX};
//!
//! let a = MatrixX::<f64>::from_fn(3, 3, |i, j| (i + j) as f64);
//! let x = VectorX::<f64>::from_fn(3, |i| i as f64);
//!
//! let y = (&a * &x + &x * 2.0).eval();
//! assert_eq!(y[0], 5.0);
//! assert_eq!((&a).transpose().sum(), 18.0);
//! ```
//!
//! # Assignment
//!
//! Plain `assign` evaluates through a temporary whenever the source may read
//! storage the destination writes. [`NoAlias`] skips that check:
//!
//! ```rust
//! use dense::{ExprMut, MatrixX};
//!
//! let a = MatrixX::<f64>::identity(2, 2);
//! let mut c = MatrixX::<f64>::zeros(2, 2);
//! c.noalias().assign(&a * &a);
//! assert_eq!(c[(1, 1)], 1.0);
//! ```

mod assign;
mod base;
mod block;
mod cwise;
mod expr;
mod map;
mod matrix;
mod nest;
mod ops;
mod product;
pub mod redux;
mod reverse;
mod select;
mod storage;
mod traits;
mod transpose;
mod triangular;
mod vectorwise;

// ============================================================================
// Re-exports from the lower layers
// ============================================================================
pub use dense_kernel::{Element, TriangularMode};
pub use dense_traits::{
    functor, AssignFunctor, BinaryFunctor, ElementOpApply, NullaryFunctor, RealScalar, Reducer, Scalar, UnaryFunctor,
};
pub use dense_view::{
    check_policy, set_check_policy, with_check_policy, CheckPolicy, ColMajor, Const, DenseError, Dim, Dyn, Extent,
    Result, RowMajor, SameDim, StorageOrder, U1, U2, U3, U4,
};

// ============================================================================
// Expressions and storage
// ============================================================================
pub use base::{MatrixBase, RealOf};
pub use expr::{Expr, ExprMut};
pub use map::{Map, MapMut};
pub use matrix::Matrix;
pub use storage::{Allocate, Buffer};
pub use traits::{AccessorsLevel, Flags, Nesting};

// ============================================================================
// Nodes
// ============================================================================
pub use block::{Block, Diagonal};
pub use cwise::{CwiseBinary, CwiseNullary, CwiseUnary};
pub use nest::NestByValue;
pub use product::{product_kind, Product, ProductKind, TriangularProduct, LAZY_PRODUCT_THRESHOLD};
pub use reverse::{Replicate, Reverse};
pub use select::Select;
pub use transpose::{Conjugate, Transpose};
pub use triangular::TriangularView;
pub use vectorwise::{Direction, Horizontal, PartialRedux, VectorwiseOp, Vertical};

// ============================================================================
// Assignment
// ============================================================================
pub use assign::{select_traversal, NoAlias, Traversal};

// ============================================================================
// Type aliases
// ============================================================================

/// Matrix with both dimensions chosen at run time.
pub type MatrixX<T> = Matrix<T, Dyn, Dyn>;
/// Column vector of run-time length.
pub type VectorX<T> = Matrix<T, Dyn, U1>;
/// Row vector of run-time length.
pub type RowVectorX<T> = Matrix<T, U1, Dyn>;
/// Matrix with both dimensions fixed at compile time.
pub type SMatrix<T, const R: usize, const C: usize> = Matrix<T, Const<R>, Const<C>>;
/// Column vector of compile-time length.
pub type SVector<T, const N: usize> = Matrix<T, Const<N>, U1>;

pub type Matrix2<T> = SMatrix<T, 2, 2>;
pub type Matrix3<T> = SMatrix<T, 3, 3>;
pub type Matrix4<T> = SMatrix<T, 4, 4>;
pub type Vector2<T> = SVector<T, 2>;
pub type Vector3<T> = SVector<T, 3>;
pub type Vector4<T> = SVector<T, 4>;

pub type MatrixXf = MatrixX<f32>;
pub type MatrixXd = MatrixX<f64>;
pub type MatrixXi = MatrixX<i32>;
pub type MatrixXcf = MatrixX<num_complex::Complex<f32>>;
pub type MatrixXcd = MatrixX<num_complex::Complex<f64>>;
pub type Matrix4d = Matrix4<f64>;
pub type VectorXd = VectorX<f64>;
