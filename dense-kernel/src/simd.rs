//! Runtime SIMD dispatch for contiguous loops.
//!
//! With the `simd` feature, closures run under `pulp::Arch::dispatch`, so the
//! optimizer may use the widest instruction set detected at run time; `f32`
//! and `f64` additionally get hand-written sum and dot kernels.

/// Below this many elements the dispatch overhead outweighs the gain.
pub const SIMD_MIN_LEN: usize = 64;

#[inline(always)]
pub fn dispatch<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        pulp::Arch::new().dispatch(f)
    }
    #[cfg(not(feature = "simd"))]
    {
        f()
    }
}

#[inline(always)]
pub fn dispatch_if_large<R>(len: usize, f: impl FnOnce() -> R) -> R {
    if len >= SIMD_MIN_LEN {
        dispatch(f)
    } else {
        f()
    }
}

/// Scalars that may have vectorized contiguous sum and dot kernels.
///
/// `None` means "no kernel, use the generic loop".
pub trait MaybeSimdOps: Copy + Sized {
    fn try_simd_sum(_src: &[Self]) -> Option<Self> {
        None
    }

    /// `sum(a[k] * b[k])`, no conjugation.
    fn try_simd_dot(_a: &[Self], _b: &[Self]) -> Option<Self> {
        None
    }
}

impl MaybeSimdOps for i32 {}
impl MaybeSimdOps for i64 {}
impl MaybeSimdOps for num_complex::Complex<f32> {}
impl MaybeSimdOps for num_complex::Complex<f64> {}

#[cfg(not(feature = "simd"))]
impl MaybeSimdOps for f32 {}

#[cfg(not(feature = "simd"))]
impl MaybeSimdOps for f64 {}

#[cfg(feature = "simd")]
mod kernels {
    use super::MaybeSimdOps;
    use pulp::{Simd, WithSimd};

    macro_rules! real_simd_ops {
        ($t:ty, $as_simd:ident, $splat:ident, $add:ident, $mul_add:ident, $reduce:ident) => {
            impl MaybeSimdOps for $t {
                fn try_simd_sum(src: &[$t]) -> Option<$t> {
                    struct Sum<'a>(&'a [$t]);

                    impl WithSimd for Sum<'_> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> $t {
                            let (head, tail) = S::$as_simd(self.0);
                            let mut even = simd.$splat(0.0);
                            let mut odd = simd.$splat(0.0);
                            let mut pairs = head.chunks_exact(2);
                            for pair in &mut pairs {
                                even = simd.$add(even, pair[0]);
                                odd = simd.$add(odd, pair[1]);
                            }
                            for &v in pairs.remainder() {
                                even = simd.$add(even, v);
                            }
                            simd.$reduce(simd.$add(even, odd)) + tail.iter().sum::<$t>()
                        }
                    }

                    Some(pulp::Arch::new().dispatch(Sum(src)))
                }

                fn try_simd_dot(a: &[$t], b: &[$t]) -> Option<$t> {
                    if a.len() != b.len() {
                        return None;
                    }

                    struct Dot<'a>(&'a [$t], &'a [$t]);

                    impl WithSimd for Dot<'_> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> $t {
                            let (a_head, a_tail) = S::$as_simd(self.0);
                            let (b_head, b_tail) = S::$as_simd(self.1);
                            let mut even = simd.$splat(0.0);
                            let mut odd = simd.$splat(0.0);
                            let mut k = 0;
                            while k + 2 <= a_head.len() {
                                even = simd.$mul_add(a_head[k], b_head[k], even);
                                odd = simd.$mul_add(a_head[k + 1], b_head[k + 1], odd);
                                k += 2;
                            }
                            if k < a_head.len() {
                                even = simd.$mul_add(a_head[k], b_head[k], even);
                            }
                            let tail: $t = a_tail.iter().zip(b_tail).map(|(&x, &y)| x * y).sum();
                            simd.$reduce(simd.$add(even, odd)) + tail
                        }
                    }

                    Some(pulp::Arch::new().dispatch(Dot(a, b)))
                }
            }
        };
    }

    real_simd_ops!(f32, as_simd_f32s, splat_f32s, add_f32s, mul_add_f32s, reduce_sum_f32s);
    real_simd_ops!(f64, as_simd_f64s, splat_f64s, add_f64s, mul_add_f64s, reduce_sum_f64s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_runs_closure() {
        assert_eq!(dispatch(|| 3 + 4), 7);
        assert_eq!(dispatch_if_large(3, || "small"), "small");
        assert_eq!(dispatch_if_large(1000, || "large"), "large");
    }

    #[test]
    fn test_integer_has_no_kernel() {
        assert_eq!(i32::try_simd_sum(&[1, 2, 3]), None);
    }

    #[cfg(feature = "simd")]
    #[test]
    fn test_real_kernels() {
        let a: Vec<f64> = (0..103).map(|k| k as f64).collect();
        let b: Vec<f64> = (0..103).map(|k| (k % 5) as f64 - 2.0).collect();
        let sum = f64::try_simd_sum(&a).unwrap();
        assert_eq!(sum, (0..103).sum::<i32>() as f64);
        let dot = f64::try_simd_dot(&a, &b).unwrap();
        let expected: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        approx::assert_relative_eq!(dot, expected, max_relative = 1e-12);

        let c: Vec<f32> = vec![0.5; 37];
        approx::assert_relative_eq!(f32::try_simd_sum(&c).unwrap(), 18.5);
        assert_eq!(f32::try_simd_dot(&c, &c[1..]), None);
    }
}
