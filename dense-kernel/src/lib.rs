//! Cache-aware kernels on strided 2-D views.
//!
//! The expression engine hands every operation that can run on raw storage to
//! this crate: copies and in-place updates between direct-access views,
//! reductions, and matrix products.
//!
//! # Pipeline
//!
//! 1. **Order**: rank each axis by stride, destination counted twice, and run
//!    the most important axis innermost ([`order`])
//! 2. **Tile**: shrink the traversal to cache-sized tiles when operands walk
//!    memory in different directions ([`block`])
//! 3. **Execute**: flat SIMD-dispatched loops over packed storage, tiled
//!    column runs otherwise ([`assign`], [`reduce`])
//!
//! Products go through [`gemm`], which asks [`MaybeGemm`] for an external
//! kernel (faer, with the `faer` feature) before falling back to loops.

pub mod assign;
pub mod backend;
pub mod block;
pub mod gemm;
pub mod order;
pub mod reduce;
pub mod simd;

use dense_traits::Scalar;

pub use assign::{copy, copy_into, map_in_place, zip_assign};
pub use backend::{ActiveBackend, BackendConfig, MaybeGemm, NaiveBackend};
#[cfg(feature = "faer")]
pub use backend::FaerBackend;
pub use gemm::{gemm, gemv, trmm, TriangularMode};
pub use reduce::{dot, dot_with, reduce, sum};
pub use simd::MaybeSimdOps;

/// Target footprint of one cache tile, in bytes.
pub const BLOCK_MEMORY_SIZE: usize = 1 << 15;

pub const CACHE_LINE_SIZE: usize = 64;

/// Scalars the kernels accept: a [`Scalar`] with optional SIMD and external
/// product hooks.
pub trait Element: Scalar + MaybeSimdOps + MaybeGemm {}

impl<T: Scalar + MaybeSimdOps + MaybeGemm> Element for T {}
