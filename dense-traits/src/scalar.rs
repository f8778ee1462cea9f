//! Per-scalar numeric traits consumed by the expression engine.
//!
//! [`Scalar`] plays the role of a numeric-traits table: it tells the engine the
//! real counterpart of a (possibly complex) scalar, its machine epsilon, whether
//! it has floating-point semantics, and rough per-operation costs used by the
//! nesting and product heuristics.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex;
use num_traits::{One, Zero};
use rand::Rng;

use crate::element_op::ElementOpApply;

/// Element type of a dense expression.
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + ElementOpApply
{
    /// Real counterpart (`Self` for real scalars).
    type Real: RealScalar;

    const IS_COMPLEX: bool;
    const HAS_FLOATING_POINT: bool;

    const READ_COST: usize = 1;
    const ADD_COST: usize;
    const MUL_COST: usize;

    /// Machine epsilon; zero for integers.
    fn epsilon() -> Self::Real;

    /// Default relative precision of fuzzy comparisons.
    fn dummy_precision() -> Self::Real;

    fn real(self) -> Self::Real;
    fn imag(self) -> Self::Real;
    fn from_real(re: Self::Real) -> Self;

    /// Modulus.
    fn abs(self) -> Self::Real;

    /// Squared modulus, `conj(x) * x` without the square root.
    fn abs2(self) -> Self::Real;

    fn sqrt(self) -> Self;

    /// Draw one value for the `Random` factory.
    fn sample<G: Rng + ?Sized>(rng: &mut G) -> Self;
}

/// Real scalar with a total-enough order for min/max reductions.
pub trait RealScalar: Scalar<Real = Self> + PartialOrd {
    fn max_of(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    fn from_usize(n: usize) -> Self;
}

macro_rules! impl_float_scalar {
    ($t:ty, $prec:expr) => {
        impl Scalar for $t {
            type Real = $t;

            const IS_COMPLEX: bool = false;
            const HAS_FLOATING_POINT: bool = true;
            const ADD_COST: usize = 1;
            const MUL_COST: usize = 1;

            #[inline]
            fn epsilon() -> $t {
                <$t>::EPSILON
            }
            #[inline]
            fn dummy_precision() -> $t {
                $prec
            }
            #[inline(always)]
            fn real(self) -> $t {
                self
            }
            #[inline(always)]
            fn imag(self) -> $t {
                0.0
            }
            #[inline(always)]
            fn from_real(re: $t) -> $t {
                re
            }
            #[inline(always)]
            fn abs(self) -> $t {
                <$t>::abs(self)
            }
            #[inline(always)]
            fn abs2(self) -> $t {
                self * self
            }
            #[inline(always)]
            fn sqrt(self) -> $t {
                <$t>::sqrt(self)
            }
            fn sample<G: Rng + ?Sized>(rng: &mut G) -> $t {
                rng.gen_range(-1.0..1.0)
            }
        }

        impl RealScalar for $t {
            fn from_usize(n: usize) -> $t {
                n as $t
            }
        }
    };
}

impl_float_scalar!(f32, 1e-5);
impl_float_scalar!(f64, 1e-12);

macro_rules! impl_int_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                type Real = $t;

                const IS_COMPLEX: bool = false;
                const HAS_FLOATING_POINT: bool = false;
                const ADD_COST: usize = 1;
                const MUL_COST: usize = 1;

                #[inline]
                fn epsilon() -> $t {
                    0
                }
                #[inline]
                fn dummy_precision() -> $t {
                    0
                }
                #[inline(always)]
                fn real(self) -> $t {
                    self
                }
                #[inline(always)]
                fn imag(self) -> $t {
                    0
                }
                #[inline(always)]
                fn from_real(re: $t) -> $t {
                    re
                }
                #[inline(always)]
                fn abs(self) -> $t {
                    <$t>::abs(self)
                }
                #[inline(always)]
                fn abs2(self) -> $t {
                    self * self
                }
                // Floor of the real square root; negative inputs give 0.
                fn sqrt(self) -> $t {
                    if self <= 0 {
                        return 0;
                    }
                    let mut r = (self as f64).sqrt() as $t;
                    while r * r > self {
                        r -= 1;
                    }
                    while (r + 1) * (r + 1) <= self {
                        r += 1;
                    }
                    r
                }
                fn sample<G: Rng + ?Sized>(rng: &mut G) -> $t {
                    rng.gen_range(-10..=10)
                }
            }

            impl RealScalar for $t {
                fn from_usize(n: usize) -> $t {
                    n as $t
                }
            }
        )*
    };
}

impl_int_scalar!(i32, i64);

macro_rules! impl_complex_scalar {
    ($t:ty) => {
        impl Scalar for Complex<$t> {
            type Real = $t;

            const IS_COMPLEX: bool = true;
            const HAS_FLOATING_POINT: bool = true;
            const ADD_COST: usize = 2;
            const MUL_COST: usize = 6;

            #[inline]
            fn epsilon() -> $t {
                <$t as Scalar>::epsilon()
            }
            #[inline]
            fn dummy_precision() -> $t {
                <$t as Scalar>::dummy_precision()
            }
            #[inline(always)]
            fn real(self) -> $t {
                self.re
            }
            #[inline(always)]
            fn imag(self) -> $t {
                self.im
            }
            #[inline(always)]
            fn from_real(re: $t) -> Self {
                Complex::new(re, 0.0)
            }
            #[inline(always)]
            fn abs(self) -> $t {
                self.norm()
            }
            #[inline(always)]
            fn abs2(self) -> $t {
                self.norm_sqr()
            }
            #[inline(always)]
            fn sqrt(self) -> Self {
                Complex::sqrt(self)
            }
            fn sample<G: Rng + ?Sized>(rng: &mut G) -> Self {
                Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
            }
        }
    };
}

impl_complex_scalar!(f32);
impl_complex_scalar!(f64);
