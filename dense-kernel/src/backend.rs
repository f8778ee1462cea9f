//! Matrix-product backend selection.
//!
//! The naive loops in [`crate::gemm`] always work. With the `faer` feature,
//! floating-point scalars hand general products to
//! `faer::linalg::matmul::matmul_with_conj` through [`MaybeGemm`]; every other
//! scalar keeps the naive path.

use dense_view::{MatMut, MatRef};

/// Static description of a product backend.
pub trait BackendConfig {
    const NAME: &'static str;

    /// Whether conjugation of an operand is applied by the backend itself.
    const CONJ_IN_KERNEL: bool;
}

/// Loops over strided views; no external library.
pub struct NaiveBackend;

impl BackendConfig for NaiveBackend {
    const NAME: &'static str = "naive";
    const CONJ_IN_KERNEL: bool = true;
}

#[cfg(feature = "faer")]
pub struct FaerBackend;

#[cfg(feature = "faer")]
impl BackendConfig for FaerBackend {
    const NAME: &'static str = "faer";
    const CONJ_IN_KERNEL: bool = true;
}

/// The backend used for general products, selected by Cargo features.
#[cfg(feature = "faer")]
pub type ActiveBackend = FaerBackend;

#[cfg(not(feature = "faer"))]
pub type ActiveBackend = NaiveBackend;

/// Scalars that may route `C (+)= alpha * op(A) * op(B)` to an external kernel.
///
/// Returns `false` when the call was not handled, leaving `c` untouched.
pub trait MaybeGemm: Copy + Sized {
    #[allow(clippy::too_many_arguments)]
    fn try_gemm(
        _c: MatMut<'_, Self>,
        _accumulate: bool,
        _a: MatRef<'_, Self>,
        _conj_a: bool,
        _b: MatRef<'_, Self>,
        _conj_b: bool,
        _alpha: Self,
    ) -> bool {
        false
    }
}

impl MaybeGemm for i32 {}
impl MaybeGemm for i64 {}

#[cfg(not(feature = "faer"))]
mod fallback {
    use super::MaybeGemm;

    impl MaybeGemm for f32 {}
    impl MaybeGemm for f64 {}
    impl MaybeGemm for num_complex::Complex<f32> {}
    impl MaybeGemm for num_complex::Complex<f64> {}
}

#[cfg(feature = "faer")]
mod faer_impls {
    use super::MaybeGemm;
    use dense_view::{MatMut, MatRef};
    use faer::linalg::matmul::matmul_with_conj;
    use faer::{Accum, Conj, Par};
    use faer_traits::ComplexField;

    fn faer_gemm<T: ComplexField + Copy>(
        mut c: MatMut<'_, T>,
        accumulate: bool,
        a: MatRef<'_, T>,
        conj_a: bool,
        b: MatRef<'_, T>,
        conj_b: bool,
        alpha: T,
    ) -> bool {
        let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
        if a.nrows() != m || b.nrows() != k || b.ncols() != n {
            return false;
        }
        // faer requires a destination without repeated coefficients
        if (m > 1 && c.row_stride() == 0) || (n > 1 && c.col_stride() == 0) {
            return false;
        }
        let accum = if accumulate { Accum::Add } else { Accum::Replace };
        let cj_a = if conj_a { Conj::Yes } else { Conj::No };
        let cj_b = if conj_b { Conj::Yes } else { Conj::No };
        // SAFETY: the views describe valid memory for their lifetimes; `c` is
        // borrowed mutably and therefore the only writer.
        unsafe {
            let a_mat = faer::mat::MatRef::<'_, T>::from_raw_parts(
                a.as_ptr(),
                m,
                k,
                a.row_stride(),
                a.col_stride(),
            );
            let b_mat = faer::mat::MatRef::<'_, T>::from_raw_parts(
                b.as_ptr(),
                k,
                n,
                b.row_stride(),
                b.col_stride(),
            );
            let c_mat = faer::mat::MatMut::<'_, T>::from_raw_parts_mut(
                c.as_mut_ptr(),
                m,
                n,
                c.row_stride(),
                c.col_stride(),
            );
            matmul_with_conj(c_mat, accum, a_mat, cj_a, b_mat, cj_b, alpha, Par::Seq);
        }
        true
    }

    macro_rules! faer_gemm_impl {
        ($($t:ty),*) => {
            $(impl MaybeGemm for $t {
                fn try_gemm(
                    c: MatMut<'_, $t>,
                    accumulate: bool,
                    a: MatRef<'_, $t>,
                    conj_a: bool,
                    b: MatRef<'_, $t>,
                    conj_b: bool,
                    alpha: $t,
                ) -> bool {
                    faer_gemm(c, accumulate, a, conj_a, b, conj_b, alpha)
                }
            })*
        };
    }

    faer_gemm_impl!(f32, f64, num_complex::Complex<f32>, num_complex::Complex<f64>);
}
