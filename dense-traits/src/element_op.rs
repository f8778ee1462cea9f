//! Element operations applied while loading coefficients.
//!
//! Kernels that read from a direct-access operand take an `ElementOp` type
//! parameter instead of a runtime flag, so a conjugated operand and a plain one
//! compile to two separate loops with no per-element branch.
//!
//! ```text
//!   compose | Id   | Conj
//! ---------|------|------
//!   Id     | Id   | Conj
//!   Conj   | Conj | Id
//! ```

use num_complex::Complex;
use num_traits::Num;

// ---------------------------------------------------------------------------
// ElementOpApply: scalars that know how to conjugate themselves
// ---------------------------------------------------------------------------

/// Scalars that support complex conjugation.
///
/// The default implementation returns `self`, so real types only need an
/// empty impl.
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }
}

macro_rules! impl_element_op_apply_real {
    ($($t:ty),*) => {
        $(impl ElementOpApply for $t {})*
    };
}

impl_element_op_apply_real!(f32, f64, i8, i16, i32, i64, i128, isize);

impl<T: Num + Copy + Clone + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }
}

// ---------------------------------------------------------------------------
// Marker types
// ---------------------------------------------------------------------------

/// f(x) = x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// f(x) = conj(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// Operation applied to each coefficient as it is read.
pub trait ElementOp<T>: Copy + Default + 'static {
    /// Whether this operation is the identity (no-op).
    const IS_IDENTITY: bool = false;

    /// The operation composed with one more conjugation.
    type Flipped: ElementOp<T>;

    fn apply(value: T) -> T;
}

impl<T: ElementOpApply> ElementOp<T> for Identity {
    const IS_IDENTITY: bool = true;
    type Flipped = Conj;

    #[inline(always)]
    fn apply(value: T) -> T {
        value
    }
}

impl<T: ElementOpApply> ElementOp<T> for Conj {
    type Flipped = Identity;

    #[inline(always)]
    fn apply(value: T) -> T {
        value.conj()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_identity() {
        let x = Complex64::new(3.0, 4.0);
        assert_eq!(<Identity as ElementOp<Complex64>>::apply(x), x);
    }

    #[test]
    fn test_conj() {
        let x = Complex64::new(3.0, 4.0);
        assert_eq!(
            <Conj as ElementOp<Complex64>>::apply(x),
            Complex64::new(3.0, -4.0)
        );
        assert_eq!(<Conj as ElementOp<i32>>::apply(-7), -7);
    }

    #[test]
    fn test_flipped_is_involution() {
        fn assert_same<A: 'static, B: 'static>() {
            assert_eq!(std::any::TypeId::of::<A>(), std::any::TypeId::of::<B>());
        }
        assert_same::<<Identity as ElementOp<f64>>::Flipped, Conj>();
        assert_same::<<<Conj as ElementOp<f64>>::Flipped as ElementOp<f64>>::Flipped, Conj>();
    }

    #[test]
    fn test_element_op_apply_default() {
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Real(f64);
        impl ElementOpApply for Real {}

        let x = Real(3.0);
        assert_eq!(x.conj(), x);
        assert_eq!(<Conj as ElementOp<Real>>::apply(x), x);
    }
}
