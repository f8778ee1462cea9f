//! Backing buffers of owned matrices.
//!
//! A matrix whose extents are both compile-time constants stores its
//! coefficients inline in a `[[T; R]; C]` array; any dynamic extent switches
//! to a heap `Vec<T>`. [`Allocate`] picks the buffer from the pair of
//! dimension types, so the choice costs nothing at run time.

use dense_traits::Scalar;
use dense_view::{Const, Dyn};

/// Contiguous coefficient storage.
pub trait Buffer<T>: Clone {
    /// A buffer of `len` copies of `value`. Inline buffers ignore `len`.
    fn filled(value: T, len: usize) -> Self;
    fn as_slice(&self) -> &[T];
    fn as_mut_slice(&mut self) -> &mut [T];
}

impl<T: Scalar, const R: usize, const C: usize> Buffer<T> for [[T; R]; C] {
    #[inline]
    fn filled(value: T, _len: usize) -> Self {
        [[value; R]; C]
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self.as_flattened()
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self.as_flattened_mut()
    }
}

impl<T: Scalar> Buffer<T> for Vec<T> {
    #[inline]
    fn filled(value: T, len: usize) -> Self {
        vec![value; len]
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

/// Maps a `(rows, cols)` pair of dimension types to its buffer.
pub trait Allocate<T: Scalar>: Sized {
    type Buffer: Buffer<T>;
}

impl<T: Scalar, const R: usize, const C: usize> Allocate<T> for (Const<R>, Const<C>) {
    type Buffer = [[T; R]; C];
}

impl<T: Scalar, const R: usize> Allocate<T> for (Const<R>, Dyn) {
    type Buffer = Vec<T>;
}

impl<T: Scalar, const C: usize> Allocate<T> for (Dyn, Const<C>) {
    type Buffer = Vec<T>;
}

impl<T: Scalar> Allocate<T> for (Dyn, Dyn) {
    type Buffer = Vec<T>;
}
