//! Per-element operator functors.
//!
//! Expression nodes carry one of these as a value and invoke it on the
//! coefficients of their children. Every functor reports a `COST` (used by the
//! nesting heuristics) and whether it has a lane-wise packet form.

use std::marker::PhantomData;

use crate::packet::Packet;
use crate::scalar::{RealScalar, Scalar};

// ============================================================================
// Traits
// ============================================================================

/// Functor producing a coefficient from its position alone.
pub trait NullaryFunctor<T: Scalar>: Clone {
    const COST: usize;
    const PACKET_ACCESS: bool = true;

    fn call(&self, i: usize, j: usize) -> T;

    /// Coefficients `(i..i + LANES, j)`.
    #[inline(always)]
    fn packet(&self, i: usize, j: usize) -> Packet<T> {
        Packet::from_fn(|k| self.call(i + k, j))
    }
}

/// Functor mapping one coefficient to another, possibly of another type.
pub trait UnaryFunctor<T: Scalar>: Clone {
    type Output: Scalar;
    const COST: usize;
    const PACKET_ACCESS: bool = true;

    fn call(&self, x: T) -> Self::Output;

    #[inline(always)]
    fn packet(&self, p: Packet<T>) -> Packet<Self::Output> {
        p.map(|x| self.call(x))
    }
}

/// Functor combining the coefficients of two children at the same position.
pub trait BinaryFunctor<L: Scalar, R: Scalar = L>: Clone {
    type Output: Scalar;
    const COST: usize;
    const PACKET_ACCESS: bool = true;

    fn call(&self, a: L, b: R) -> Self::Output;

    #[inline(always)]
    fn packet(&self, a: Packet<L>, b: Packet<R>) -> Packet<Self::Output> {
        a.zip_with(b, |x, y| self.call(x, y))
    }
}

// ============================================================================
// Nullary functors
// ============================================================================

/// Every coefficient equals the stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantOp<T>(pub T);

impl<T: Scalar> NullaryFunctor<T> for ConstantOp<T> {
    const COST: usize = 0;

    #[inline(always)]
    fn call(&self, _i: usize, _j: usize) -> T {
        self.0
    }

    #[inline(always)]
    fn packet(&self, _i: usize, _j: usize) -> Packet<T> {
        Packet::splat(self.0)
    }
}

/// One on the main diagonal, zero elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityOp;

impl<T: Scalar> NullaryFunctor<T> for IdentityOp {
    const COST: usize = 1;

    #[inline(always)]
    fn call(&self, i: usize, j: usize) -> T {
        if i == j {
            T::one()
        } else {
            T::zero()
        }
    }
}

/// Evenly spaced values along a vector, indexed by `i + j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinSpacedOp<T> {
    low: T,
    step: T,
}

impl<T: RealScalar> LinSpacedOp<T> {
    /// `n` values from `low` to `high` inclusive.
    pub fn new(n: usize, low: T, high: T) -> Self {
        let step = if n > 1 {
            (high - low) / T::from_usize(n - 1)
        } else {
            T::zero()
        };
        Self { low, step }
    }
}

impl<T: RealScalar> NullaryFunctor<T> for LinSpacedOp<T> {
    const COST: usize = T::ADD_COST + T::MUL_COST;

    #[inline(always)]
    fn call(&self, i: usize, j: usize) -> T {
        self.low + self.step * T::from_usize(i + j)
    }
}

/// Coefficients produced by a closure of `(row, col)`.
#[derive(Clone)]
pub struct FromFnOp<F>(pub F);

impl<T: Scalar, F: Fn(usize, usize) -> T + Clone> NullaryFunctor<T> for FromFnOp<F> {
    const COST: usize = 10;
    const PACKET_ACCESS: bool = false;

    #[inline(always)]
    fn call(&self, i: usize, j: usize) -> T {
        (self.0)(i, j)
    }
}

// ============================================================================
// Unary functors
// ============================================================================

/// f(x) = -x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OppositeOp;

impl<T: Scalar> UnaryFunctor<T> for OppositeOp {
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T {
        -x
    }

    #[inline(always)]
    fn packet(&self, p: Packet<T>) -> Packet<T> {
        -p
    }
}

/// f(x) = x * s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultipleOp<T>(pub T);

impl<T: Scalar> UnaryFunctor<T> for MultipleOp<T> {
    type Output = T;
    const COST: usize = T::MUL_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T {
        x * self.0
    }

    #[inline(always)]
    fn packet(&self, p: Packet<T>) -> Packet<T> {
        p * Packet::splat(self.0)
    }
}

/// f(x) = s * x, for scalars written on the left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeftMultipleOp<T>(pub T);

impl<T: Scalar> UnaryFunctor<T> for LeftMultipleOp<T> {
    type Output = T;
    const COST: usize = T::MUL_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T {
        self.0 * x
    }
}

/// f(x) = x / s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivideByOp<T>(pub T);

impl<T: Scalar> UnaryFunctor<T> for DivideByOp<T> {
    type Output = T;
    const COST: usize = 2 * T::MUL_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T {
        x / self.0
    }
}

/// f(x) = conj(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConjugateOp;

impl<T: Scalar> UnaryFunctor<T> for ConjugateOp {
    type Output = T;
    const COST: usize = if T::IS_COMPLEX { T::ADD_COST } else { 0 };

    #[inline(always)]
    fn call(&self, x: T) -> T {
        x.conj()
    }
}

/// Real part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealOp;

impl<T: Scalar> UnaryFunctor<T> for RealOp {
    type Output = T::Real;
    const COST: usize = 0;

    #[inline(always)]
    fn call(&self, x: T) -> T::Real {
        x.real()
    }
}

/// Imaginary part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagOp;

impl<T: Scalar> UnaryFunctor<T> for ImagOp {
    type Output = T::Real;
    const COST: usize = 0;

    #[inline(always)]
    fn call(&self, x: T) -> T::Real {
        x.imag()
    }
}

/// Modulus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsOp;

impl<T: Scalar> UnaryFunctor<T> for AbsOp {
    type Output = T::Real;
    const COST: usize = if T::IS_COMPLEX { 5 * T::MUL_COST } else { T::ADD_COST };

    #[inline(always)]
    fn call(&self, x: T) -> T::Real {
        x.abs()
    }
}

/// Squared modulus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abs2Op;

impl<T: Scalar> UnaryFunctor<T> for Abs2Op {
    type Output = T::Real;
    const COST: usize = T::MUL_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T::Real {
        x.abs2()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqrtOp;

impl<T: Scalar> UnaryFunctor<T> for SqrtOp {
    type Output = T;
    const COST: usize = 5 * T::MUL_COST;

    #[inline(always)]
    fn call(&self, x: T) -> T {
        x.sqrt()
    }
}

/// Lossless conversion into another scalar type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastOp<U>(PhantomData<U>);

impl<U> CastOp<U> {
    pub fn new() -> Self {
        CastOp(PhantomData)
    }
}

impl<T: Scalar + Into<U>, U: Scalar> UnaryFunctor<T> for CastOp<U> {
    type Output = U;
    const COST: usize = 1;

    #[inline(always)]
    fn call(&self, x: T) -> U {
        x.into()
    }
}

/// Arbitrary closure; not vectorized.
#[derive(Clone)]
pub struct UnaryClosureOp<F>(pub F);

impl<T: Scalar, U: Scalar, F: Fn(T) -> U + Clone> UnaryFunctor<T> for UnaryClosureOp<F> {
    type Output = U;
    const COST: usize = 10;
    const PACKET_ACCESS: bool = false;

    #[inline(always)]
    fn call(&self, x: T) -> U {
        (self.0)(x)
    }
}

// ============================================================================
// Binary functors
// ============================================================================

macro_rules! arithmetic_binary_op {
    ($(#[$doc:meta])* $name:ident, $op:tt, $cost:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl<T: Scalar> BinaryFunctor<T> for $name {
            type Output = T;
            const COST: usize = T::$cost;

            #[inline(always)]
            fn call(&self, a: T, b: T) -> T {
                a $op b
            }

            #[inline(always)]
            fn packet(&self, a: Packet<T>, b: Packet<T>) -> Packet<T> {
                a $op b
            }
        }
    };
}

arithmetic_binary_op!(
    /// f(a, b) = a + b
    SumOp, +, ADD_COST
);
arithmetic_binary_op!(
    /// f(a, b) = a - b
    DifferenceOp, -, ADD_COST
);
arithmetic_binary_op!(
    /// f(a, b) = a * b, coefficient-wise
    ProductOp, *, MUL_COST
);
arithmetic_binary_op!(
    /// f(a, b) = a / b, coefficient-wise
    QuotientOp, /, MUL_COST
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinOp;

impl<T: RealScalar> BinaryFunctor<T> for MinOp {
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn call(&self, a: T, b: T) -> T {
        a.min_of(b)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxOp;

impl<T: RealScalar> BinaryFunctor<T> for MaxOp {
    type Output = T;
    const COST: usize = T::ADD_COST;

    #[inline(always)]
    fn call(&self, a: T, b: T) -> T {
        a.max_of(b)
    }
}

/// Arbitrary two-argument closure; not vectorized.
#[derive(Clone)]
pub struct BinaryClosureOp<F>(pub F);

impl<L: Scalar, R: Scalar, U: Scalar, F: Fn(L, R) -> U + Clone> BinaryFunctor<L, R>
    for BinaryClosureOp<F>
{
    type Output = U;
    const COST: usize = 10;
    const PACKET_ACCESS: bool = false;

    #[inline(always)]
    fn call(&self, a: L, b: R) -> U {
        (self.0)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_nullary() {
        assert_eq!(ConstantOp(2.5f64).call(3, 4), 2.5);
        assert_eq!(<IdentityOp as NullaryFunctor<i32>>::call(&IdentityOp, 2, 2), 1);
        assert_eq!(<IdentityOp as NullaryFunctor<i32>>::call(&IdentityOp, 2, 1), 0);
        let p: Packet<f64> = IdentityOp.packet(0, 1);
        assert_eq!(p.0, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lin_spaced() {
        let op = LinSpacedOp::new(5, 0.0f64, 1.0);
        assert_relative_eq!(op.call(0, 0), 0.0);
        assert_relative_eq!(op.call(2, 0), 0.5);
        assert_relative_eq!(op.call(0, 4), 1.0);
        let single = LinSpacedOp::new(1, 3.0f64, 9.0);
        assert_eq!(single.call(0, 0), 3.0);
    }

    #[test]
    fn test_unary_type_changing() {
        let z = Complex64::new(3.0, 4.0);
        assert_relative_eq!(AbsOp.call(z), 5.0);
        assert_relative_eq!(Abs2Op.call(z), 25.0);
        assert_eq!(RealOp.call(z), 3.0);
        assert_eq!(ImagOp.call(z), 4.0);
        assert_eq!(ConjugateOp.call(z), Complex64::new(3.0, -4.0));
        let p = Packet::splat(z);
        assert_eq!(AbsOp.packet(p).0, [5.0; 4]);
    }

    #[test]
    fn test_cast() {
        let op = CastOp::<f64>::new();
        assert_eq!(op.call(7i32), 7.0);
        let op = CastOp::<Complex64>::new();
        assert_eq!(op.call(1.5f64), Complex64::new(1.5, 0.0));
    }

    #[test]
    fn test_binary() {
        assert_eq!(SumOp.call(2, 3), 5);
        assert_eq!(DifferenceOp.call(2, 3), -1);
        assert_eq!(ProductOp.call(2, 3), 6);
        assert_eq!(QuotientOp.call(7.0, 2.0), 3.5);
        assert_eq!(MinOp.call(2.0, -1.0), -1.0);
        assert_eq!(MaxOp.call(2, 9), 9);
        let p = SumOp.packet(Packet([1, 2, 3, 4]), Packet::splat(1));
        assert_eq!(p.0, [2, 3, 4, 5]);
    }

    #[test]
    fn test_closures() {
        let f = UnaryClosureOp(|x: f64| x * x + 1.0);
        assert_eq!(f.call(2.0), 5.0);
        let g = BinaryClosureOp(|a: i32, b: i32| a.max(b) - a.min(b));
        assert_eq!(g.call(3, 10), 7);
        assert!(!<UnaryClosureOp<fn(f64) -> f64> as UnaryFunctor<f64>>::PACKET_ACCESS);
    }

    #[test]
    fn test_costs_scale_with_scalar() {
        assert!(
            <ProductOp as BinaryFunctor<Complex64>>::COST > <ProductOp as BinaryFunctor<f64>>::COST
        );
        assert_eq!(<ConjugateOp as UnaryFunctor<f64>>::COST, 0);
    }
}
