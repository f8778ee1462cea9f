//! Scalar and functor traits shared by the dense expression crates.
//!
//! This crate provides the numeric-traits table ([`Scalar`]), the fixed-width
//! [`Packet`] used by vectorized traversals, and the per-element functors that
//! expression nodes carry. `dense-view`, `dense-kernel` and `dense` all build
//! on it; external crates can implement [`Scalar`] or the functor traits for
//! their own types without orphan rule violations.

pub mod assign;
pub mod element_op;
pub mod functor;
pub mod packet;
pub mod redux;
pub mod scalar;

pub use assign::{AddAssignOp, AssignFunctor, AssignKind, AssignOp, SubAssignOp};
pub use element_op::{Conj, ElementOp, ElementOpApply, Identity};
pub use functor::{BinaryFunctor, NullaryFunctor, UnaryFunctor};
pub use packet::{Packet, PACKET_LANES};
pub use redux::Reducer;
pub use scalar::{RealScalar, Scalar};
