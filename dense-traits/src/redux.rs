//! Reducers for full and partial (column-/row-wise) reductions.
//!
//! A reducer lifts each coefficient into an accumulator, folds accumulators
//! pairwise, then finishes with the number of folded coefficients. Keeping the
//! fold associative lets the engine accumulate in packets and combine lanes
//! at the end.

use crate::packet::Packet;
use crate::scalar::{RealScalar, Scalar};

pub trait Reducer<T: Scalar>: Clone + Default {
    type Acc: Scalar;
    type Output: Scalar;
    const COST: usize;

    fn lift(&self, x: T) -> Self::Acc;

    fn combine(&self, a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// `acc` is `None` when nothing was folded.
    fn finish(&self, acc: Option<Self::Acc>, count: usize) -> Self::Output;

    #[inline(always)]
    fn lift_packet(&self, p: Packet<T>) -> Packet<Self::Acc> {
        p.map(|x| self.lift(x))
    }

    #[inline(always)]
    fn combine_packet(&self, a: Packet<Self::Acc>, b: Packet<Self::Acc>) -> Packet<Self::Acc> {
        a.zip_with(b, |x, y| self.combine(x, y))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumRedux;

impl<T: Scalar> Reducer<T> for SumRedux {
    type Acc = T;
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T {
        x
    }
    #[inline(always)]
    fn combine(&self, a: T, b: T) -> T {
        a + b
    }
    fn finish(&self, acc: Option<T>, _count: usize) -> T {
        acc.unwrap_or_else(T::zero)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProdRedux;

impl<T: Scalar> Reducer<T> for ProdRedux {
    type Acc = T;
    type Output = T;
    const COST: usize = T::MUL_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T {
        x
    }
    #[inline(always)]
    fn combine(&self, a: T, b: T) -> T {
        a * b
    }
    fn finish(&self, acc: Option<T>, _count: usize) -> T {
        acc.unwrap_or_else(T::one)
    }
}

/// Arithmetic mean; zero for an empty run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanRedux;

impl<T: Scalar> Reducer<T> for MeanRedux {
    type Acc = T;
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T {
        x
    }
    #[inline(always)]
    fn combine(&self, a: T, b: T) -> T {
        a + b
    }
    fn finish(&self, acc: Option<T>, count: usize) -> T {
        match acc {
            Some(sum) if count > 0 => sum / T::from_real(T::Real::from_usize(count)),
            _ => T::zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredNormRedux;

impl<T: Scalar> Reducer<T> for SquaredNormRedux {
    type Acc = T::Real;
    type Output = T::Real;
    const COST: usize = T::MUL_COST + T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T::Real {
        x.abs2()
    }
    #[inline(always)]
    fn combine(&self, a: T::Real, b: T::Real) -> T::Real {
        a + b
    }
    fn finish(&self, acc: Option<T::Real>, _count: usize) -> T::Real {
        acc.unwrap_or_else(<T::Real as num_traits::Zero>::zero)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormRedux;

impl<T: Scalar> Reducer<T> for NormRedux {
    type Acc = T::Real;
    type Output = T::Real;
    const COST: usize = T::MUL_COST + T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T::Real {
        x.abs2()
    }
    #[inline(always)]
    fn combine(&self, a: T::Real, b: T::Real) -> T::Real {
        a + b
    }
    fn finish(&self, acc: Option<T::Real>, _count: usize) -> T::Real {
        acc.unwrap_or_else(<T::Real as num_traits::Zero>::zero).sqrt()
    }
}

/// Largest coefficient; zero for an empty run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxRedux;

impl<T: RealScalar> Reducer<T> for MaxRedux {
    type Acc = T;
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T {
        x
    }
    #[inline(always)]
    fn combine(&self, a: T, b: T) -> T {
        a.max_of(b)
    }
    fn finish(&self, acc: Option<T>, _count: usize) -> T {
        acc.unwrap_or_else(T::zero)
    }
}

/// Smallest coefficient; zero for an empty run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinRedux;

impl<T: RealScalar> Reducer<T> for MinRedux {
    type Acc = T;
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn lift(&self, x: T) -> T {
        x
    }
    #[inline(always)]
    fn combine(&self, a: T, b: T) -> T {
        a.min_of(b)
    }
    fn finish(&self, acc: Option<T>, _count: usize) -> T {
        acc.unwrap_or_else(T::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn fold<T: Scalar, R: Reducer<T>>(r: R, xs: &[T]) -> R::Output {
        let acc = xs.iter().map(|&x| r.lift(x)).reduce(|a, b| r.combine(a, b));
        r.finish(acc, xs.len())
    }

    #[test]
    fn test_sum_prod_mean() {
        assert_eq!(fold(SumRedux, &[1, 2, 3, 4]), 10);
        assert_eq!(fold(ProdRedux, &[1, 2, 3, 4]), 24);
        assert_relative_eq!(fold(MeanRedux, &[1.0, 2.0, 3.0, 6.0]), 3.0);
    }

    #[test]
    fn test_empty_runs() {
        assert_eq!(fold::<i32, _>(SumRedux, &[]), 0);
        assert_eq!(fold::<i32, _>(ProdRedux, &[]), 1);
        assert_eq!(fold::<f64, _>(MeanRedux, &[]), 0.0);
    }

    #[test]
    fn test_norms_of_complex() {
        let xs = [Complex64::new(3.0, 4.0), Complex64::new(0.0, 0.0)];
        assert_relative_eq!(fold(SquaredNormRedux, &xs), 25.0);
        assert_relative_eq!(fold(NormRedux, &xs), 5.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(fold(MaxRedux, &[3.0, -1.0, 7.5]), 7.5);
        assert_eq!(fold(MinRedux, &[3, -1, 7]), -1);
    }

    #[test]
    fn test_packet_fold_matches_scalar_fold() {
        let r = SquaredNormRedux;
        let xs = [1.0f64, -2.0, 3.0, 0.5, 0.0, 1.0, 1.0, 1.0];
        let a = Reducer::<f64>::lift_packet(&r, Packet([1.0, -2.0, 3.0, 0.5]));
        let b = Reducer::<f64>::lift_packet(&r, Packet([0.0, 1.0, 1.0, 1.0]));
        let total = Reducer::<f64>::combine_packet(&r, a, b).reduce(|x, y| x + y);
        assert_relative_eq!(total, 1.0 + 4.0 + 9.0 + 0.25 + 3.0);
        assert_relative_eq!(total, fold(r, &xs));
    }
}
