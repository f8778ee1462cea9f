//! Fixed-width coefficient packets.
//!
//! A [`Packet`] is a group of [`PACKET_LANES`] consecutive coefficients moved
//! and combined as one unit. Lane-wise operations are plain array loops that
//! the optimizer lowers to vector instructions; the lane count is the same for
//! every scalar type so that type-changing functors (complex `abs`, casts) keep
//! their packet path.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Number of coefficients per packet.
pub const PACKET_LANES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Packet<T>(pub [T; PACKET_LANES]);

impl<T: Copy> Packet<T> {
    pub const LANES: usize = PACKET_LANES;

    #[inline(always)]
    pub fn splat(value: T) -> Self {
        Packet([value; PACKET_LANES])
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        Packet(std::array::from_fn(f))
    }

    /// Load the first `PACKET_LANES` elements of `src`.
    ///
    /// # Panics
    /// If `src` is shorter than one packet.
    #[inline(always)]
    pub fn load(src: &[T]) -> Self {
        let mut lanes = [src[0]; PACKET_LANES];
        lanes.copy_from_slice(&src[..PACKET_LANES]);
        Packet(lanes)
    }

    #[inline(always)]
    pub fn store(self, dst: &mut [T]) {
        dst[..PACKET_LANES].copy_from_slice(&self.0);
    }

    #[inline(always)]
    pub fn lane(&self, k: usize) -> T {
        self.0[k]
    }

    #[inline(always)]
    pub fn map<U: Copy>(self, mut f: impl FnMut(T) -> U) -> Packet<U> {
        Packet::from_fn(|k| f(self.0[k]))
    }

    #[inline(always)]
    pub fn zip_with<U: Copy, V: Copy>(
        self,
        other: Packet<U>,
        mut f: impl FnMut(T, U) -> V,
    ) -> Packet<V> {
        Packet::from_fn(|k| f(self.0[k], other.0[k]))
    }

    /// Fold the lanes left to right.
    #[inline(always)]
    pub fn reduce(self, f: impl Fn(T, T) -> T) -> T {
        let mut acc = self.0[0];
        for &x in &self.0[1..] {
            acc = f(acc, x);
        }
        acc
    }
}

macro_rules! impl_packet_binop {
    ($trait:ident, $method:ident) => {
        impl<T: Copy + $trait<Output = T>> $trait for Packet<T> {
            type Output = Packet<T>;

            #[inline(always)]
            fn $method(self, rhs: Packet<T>) -> Packet<T> {
                self.zip_with(rhs, |a, b| a.$method(b))
            }
        }
    };
}

impl_packet_binop!(Add, add);
impl_packet_binop!(Sub, sub);
impl_packet_binop!(Mul, mul);
impl_packet_binop!(Div, div);

impl<T: Copy + Neg<Output = T>> Neg for Packet<T> {
    type Output = Packet<T>;

    #[inline(always)]
    fn neg(self) -> Packet<T> {
        self.map(|a| -a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store() {
        let src = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let p = Packet::load(&src[1..]);
        assert_eq!(p.0, [2.0, 3.0, 4.0, 5.0]);
        let mut dst = [0.0; 6];
        p.store(&mut dst[2..]);
        assert_eq!(dst, [0.0, 0.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    #[should_panic]
    fn test_load_short_slice_panics() {
        let src = [1i32, 2, 3];
        let _ = Packet::load(&src);
    }

    #[test]
    fn test_lanewise_ops() {
        let a = Packet([1i32, 2, 3, 4]);
        let b = Packet::splat(10);
        assert_eq!((a + b).0, [11, 12, 13, 14]);
        assert_eq!((b - a).0, [9, 8, 7, 6]);
        assert_eq!((a * a).0, [1, 4, 9, 16]);
        assert_eq!((-a).0, [-1, -2, -3, -4]);
        assert_eq!(a.reduce(|x, y| x + y), 10);
        assert_eq!(a.map(|x| x as f64 * 0.5).lane(3), 2.0);
    }
}
