//! Storage-level building blocks of the dense expression engine.
//!
//! # Core Types
//!
//! - [`Dim`], [`Const`], [`Dyn`]: compile-time or run-time extents, with
//!   [`SameDim`] rejecting statically incompatible pairs
//! - [`StorageOrder`] markers [`ColMajor`] / [`RowMajor`]
//! - [`MatRef`] / [`MatMut`]: borrowed 2-D strided views over existing data
//! - [`Layout`] / [`Overlap`]: memory footprints for aliasing detection
//! - [`CheckPolicy`]: run-time switch for logical index and shape checks
//!
//! # View Transformations
//!
//! These only touch the pointer, shape and strides, never the data:
//! - `transpose`: swap shape and strides
//! - `subview`: rectangular window
//! - `reverse`: negate a stride
//! - `diagonal`: fuse both strides into one

pub mod check;
pub mod dim;
pub mod order;
pub mod view;

// ============================================================================
// Dimensions and storage order
// ============================================================================
pub use dim::{Const, Dim, Dyn, Extent, SameDim, U1, U2, U3, U4};
pub use order::{ColMajor, RowMajor, StorageOrder};

// ============================================================================
// Views
// ============================================================================
pub use view::{Layout, MatMut, MatRef, Overlap};

// ============================================================================
// Check policy
// ============================================================================
pub use check::{
    assert_index, check_index, check_policy, set_check_policy, should_check, with_check_policy,
    CheckPolicy,
};

// ============================================================================
// Error types
// ============================================================================

/// Errors reported by the checked (`try_*`) entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenseError {
    /// Source and destination shapes differ.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Coefficient index outside `[0, rows) x [0, cols)`.
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Integer overflow while computing a coefficient offset.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// Backing slice shorter than the view's footprint.
    #[error("buffer of length {len} too small, {needed} elements needed")]
    BufferTooSmall { needed: usize, len: usize },

    /// Attempt to give a compile-time extent another value.
    #[error("fixed dimension {fixed} cannot become {requested}")]
    FixedDimension { fixed: usize, requested: usize },

    /// Matrix is not square when a square matrix was required.
    #[error("non-square matrix: rows={rows}, cols={cols}")]
    NonSquare { rows: usize, cols: usize },

    /// Vector operation on a matrix with neither extent equal to one.
    #[error("expected a vector, found a {rows}x{cols} matrix")]
    NotAVector { rows: usize, cols: usize },

    /// Reduction that needs at least one coefficient.
    #[error("reduction over an empty expression")]
    EmptyReduction,
}

/// Result type for dense operations.
pub type Result<T> = std::result::Result<T, DenseError>;
