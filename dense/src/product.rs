//! Matrix products.
//!
//! `lhs * rhs` builds a [`Product`] node without computing anything. The
//! product's kind is picked from the operands' compile-time extents and
//! refined from their run-time sizes when an extent is dynamic:
//!
//! | kind     | shape                              | evaluation              |
//! |----------|------------------------------------|-------------------------|
//! | Inner    | `1 x n` times `n x 1`              | dot kernel              |
//! | Outer    | `m x 1` times `1 x n`              | gemm kernel (rank one)  |
//! | Gemv     | one side a vector                  | gemv kernel             |
//! | Gemm     | general                            | gemm kernel             |
//! | Lazy     | all extents fixed and small        | coefficient by coefficient |
//!
//! Assigning a product writes the kernel's output straight into the
//! destination. A product read by a parent node is evaluated once into a
//! cached temporary on first access.

use std::cell::OnceCell;

use dense_kernel::{dot_with, gemm, gemv, trmm, TriangularMode};
use dense_traits::{AssignFunctor, AssignOp, Scalar};
use dense_view::{DenseError, Dim, Extent, Layout, MatMut, MatRef, Overlap, Result, SameDim};
use log::debug;

use crate::assign::{evaluate_unaliased, fault};
use crate::expr::{direct_operand, Expr, ExprMut};
use crate::traits::Flags;
use crate::triangular::TriangularView;
use crate::MatrixX;

/// Products whose fixed extents sum below this are evaluated coefficient by
/// coefficient.
pub const LAZY_PRODUCT_THRESHOLD: usize = 20;

/// Evaluation strategy of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKind {
    Inner,
    Outer,
    Gemv,
    Gemm,
    Lazy,
    Triangular,
}

/// Kind of a `rows x depth` times `depth x cols` product from its extents.
pub const fn product_kind(rows: Extent, depth: Extent, cols: Extent) -> ProductKind {
    if rows.is_fixed_to(1) && cols.is_fixed_to(1) {
        ProductKind::Inner
    } else if depth.is_fixed_to(1) {
        ProductKind::Outer
    } else if rows.is_fixed()
        && depth.is_fixed()
        && cols.is_fixed()
        && rows.fixed_or(0) + depth.fixed_or(0) + cols.fixed_or(0) < LAZY_PRODUCT_THRESHOLD
    {
        ProductKind::Lazy
    } else if rows.is_fixed_to(1) || cols.is_fixed_to(1) {
        ProductKind::Gemv
    } else {
        ProductKind::Gemm
    }
}

/// Kind of a product of run-time sizes.
fn runtime_kind(rows: usize, depth: usize, cols: usize) -> ProductKind {
    if rows == 1 && cols == 1 {
        ProductKind::Inner
    } else if depth == 1 {
        ProductKind::Outer
    } else if rows == 1 || cols == 1 {
        ProductKind::Gemv
    } else {
        ProductKind::Gemm
    }
}

fn check_inner_dims(lhs: (usize, usize), rhs: (usize, usize)) -> Result<()> {
    if lhs.1 == rhs.0 {
        Ok(())
    } else {
        Err(DenseError::ShapeMismatch {
            expected: (lhs.1, rhs.1),
            found: rhs,
        })
    }
}

/// Materialize the coefficients of `node` in `cache` on first use.
fn cached<'c, E>(cache: &'c OnceCell<MatrixX<E::Scalar>>, node: &E) -> &'c MatrixX<E::Scalar>
where
    E: Expr,
{
    cache.get_or_init(|| {
        let mut tmp = MatrixX::zeros(node.nrows(), node.ncols());
        if let Err(e) = node.eval_into(tmp.target_view(), AssignOp) {
            fault(e)
        }
        tmp
    })
}

/// Strided storage of a kernel operand, evaluated into `tmp` unless its
/// flags promise direct access.
fn operand<'a, E: Expr>(
    node: &'a E,
    tmp: &'a mut Option<MatrixX<E::Scalar>>,
) -> Result<(MatRef<'a, E::Scalar>, bool)> {
    if let Some(v) = direct_operand(node) {
        return Ok(v);
    }
    debug!("product operand without direct access, evaluating {}x{}", node.nrows(), node.ncols());
    let m: &'a MatrixX<E::Scalar> = tmp.insert(evaluate_unaliased(node)?);
    Ok((m.mat_ref(), false))
}

/// `lhs * rhs`.
#[derive(Debug, Clone)]
pub struct Product<L: Expr, R: Expr> {
    lhs: L,
    rhs: R,
    cache: OnceCell<MatrixX<L::Scalar>>,
}

impl<L, R> Product<L, R>
where
    L: Expr,
    R: Expr<Scalar = L::Scalar>,
    L::Cols: SameDim<R::Rows>,
{
    pub const STATIC_KIND: ProductKind = product_kind(
        <L::Rows as Dim>::EXTENT,
        <<L::Cols as SameDim<R::Rows>>::Output as Dim>::EXTENT,
        <R::Cols as Dim>::EXTENT,
    );

    /// Fails with [`DenseError::ShapeMismatch`] when `lhs.ncols()` differs
    /// from `rhs.nrows()`.
    pub fn try_new(lhs: L, rhs: R) -> Result<Self> {
        check_inner_dims(lhs.shape(), rhs.shape())?;
        Ok(Product {
            lhs,
            rhs,
            cache: OnceCell::new(),
        })
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }

    pub fn depth(&self) -> usize {
        self.lhs.ncols()
    }

    /// [`Self::STATIC_KIND`], refined by the run-time sizes when it names a
    /// kernel.
    pub fn kind(&self) -> ProductKind {
        match Self::STATIC_KIND {
            ProductKind::Gemm | ProductKind::Gemv => {
                runtime_kind(self.lhs.nrows(), self.depth(), self.rhs.ncols())
            }
            kind => kind,
        }
    }

    /// The single coefficient of a `1 x 1` product.
    pub fn try_value(&self) -> Result<L::Scalar> {
        let found = (self.lhs.nrows(), self.rhs.ncols());
        if found != (1, 1) {
            return Err(DenseError::ShapeMismatch {
                expected: (1, 1),
                found,
            });
        }
        self.inner_value()
    }

    #[track_caller]
    pub fn value(&self) -> L::Scalar {
        self.try_value().unwrap_or_else(|e| fault(e))
    }

    fn lazy_coeff(&self, i: usize, j: usize) -> L::Scalar {
        (0..self.depth()).fold(<L::Scalar as num_traits::Zero>::zero(), |acc, k| {
            acc + self.lhs.coeff(i, k) * self.rhs.coeff(k, j)
        })
    }

    fn inner_value(&self) -> Result<L::Scalar> {
        let (mut lhs_tmp, mut rhs_tmp) = (None, None);
        let (a, conj_a) = operand(&self.lhs, &mut lhs_tmp)?;
        let (b, conj_b) = operand(&self.rhs, &mut rhs_tmp)?;
        dot_with(a, conj_a, b, conj_b)
    }

    fn run_kernel<F: AssignFunctor<L::Scalar>>(
        &self,
        kind: ProductKind,
        dst: MatMut<'_, L::Scalar>,
        _func: F,
    ) -> Result<()> {
        let one = <L::Scalar as num_traits::One>::one();
        let (mut lhs_tmp, mut rhs_tmp) = (None, None);
        let (a, conj_a) = operand(&self.lhs, &mut lhs_tmp)?;
        let (b, conj_b) = operand(&self.rhs, &mut rhs_tmp)?;
        debug!(
            "{:?} product {}x{}x{} ({:?})",
            kind,
            a.nrows(),
            a.ncols(),
            b.ncols(),
            F::KIND
        );
        match kind {
            ProductKind::Gemv if b.ncols() == 1 => gemv(dst, F::KIND, a, conj_a, b, conj_b, one),
            // row vector times matrix: y^T = B^T x^T
            ProductKind::Gemv if a.nrows() == 1 => gemv(
                dst.transpose(),
                F::KIND,
                b.transpose(),
                conj_b,
                a.transpose(),
                conj_a,
                one,
            ),
            _ => gemm(dst, F::KIND, a, conj_a, b, conj_b, one),
        }
    }
}

impl<L, R> Expr for Product<L, R>
where
    L: Expr,
    R: Expr<Scalar = L::Scalar>,
    L::Cols: SameDim<R::Rows>,
{
    type Scalar = L::Scalar;
    type Rows = L::Rows;
    type Cols = R::Cols;

    /// Kernel products read through their cached result.
    const FLAGS: Flags = match Self::STATIC_KIND {
        ProductKind::Lazy | ProductKind::Inner => Flags::NONE,
        _ => Flags::EVAL_BEFORE_NESTING.union(Flags::DIRECT_ACCESS),
    };
    const COST: usize = match Self::STATIC_KIND {
        ProductKind::Lazy | ProductKind::Inner => {
            <<L::Cols as SameDim<R::Rows>>::Output as Dim>::EXTENT.fixed_or(LAZY_PRODUCT_THRESHOLD)
                * (L::COST + R::COST + <L::Scalar as Scalar>::MUL_COST + <L::Scalar as Scalar>::ADD_COST)
        }
        _ => <L::Scalar as Scalar>::READ_COST,
    };

    #[inline]
    fn rows(&self) -> L::Rows {
        self.lhs.rows()
    }

    #[inline]
    fn cols(&self) -> R::Cols {
        self.rhs.cols()
    }

    fn coeff(&self, i: usize, j: usize) -> L::Scalar {
        if Self::FLAGS.contains(Flags::DIRECT_ACCESS) {
            cached(&self.cache, self).coeff(i, j)
        } else {
            self.lazy_coeff(i, j)
        }
    }

    fn direct(&self) -> Option<MatRef<'_, L::Scalar>> {
        if Self::FLAGS.contains(Flags::DIRECT_ACCESS) {
            Some(cached(&self.cache, self).mat_ref())
        } else {
            None
        }
    }

    /// A kernel reads every operand coefficient for every output
    /// coefficient, so any overlap with the destination is shuffled.
    fn overlap(&self, dst: &Layout) -> Overlap {
        self.lhs.overlap(dst).max(self.rhs.overlap(dst)).shuffled()
    }

    fn eval_into<F: AssignFunctor<L::Scalar>>(&self, mut dst: MatMut<'_, L::Scalar>, func: F) -> Result<()> {
        if let Some(c) = self.cache.get() {
            return c.eval_into(dst, func);
        }
        match self.kind() {
            ProductKind::Lazy => crate::assign::traverse(dst, self, func),
            ProductKind::Inner => {
                let expected = (dst.nrows(), dst.ncols());
                if expected != (1, 1) {
                    return Err(DenseError::ShapeMismatch {
                        expected,
                        found: (1, 1),
                    });
                }
                let v = self.inner_value()?;
                let d = dst.get(0, 0);
                dst.write(0, 0, func.assign(d, v));
                Ok(())
            }
            kind => self.run_kernel(kind, dst, func),
        }
    }
}

/// `tri * rhs` with `tri` a [`TriangularView`].
#[derive(Debug, Clone)]
pub struct TriangularProduct<E: Expr, R: Expr> {
    tri: TriangularView<E>,
    rhs: R,
    cache: OnceCell<MatrixX<E::Scalar>>,
}

impl<E, R> TriangularProduct<E, R>
where
    E: Expr,
    R: Expr<Scalar = E::Scalar>,
    E::Cols: SameDim<R::Rows>,
{
    /// Fails with [`DenseError::ShapeMismatch`] when the inner extents
    /// differ at run time; fixed inner extents must agree at compile time:
    ///
    /// ```compile_fail
    /// use dense::{Matrix2, Matrix3, MatrixBase, TriangularMode};
    ///
    /// let a = Matrix3::<f64>::identity();
    /// let b = Matrix2::<f64>::identity();
    /// let _ = (&a).triangular_view(TriangularMode::Upper) * &b;
    /// ```
    pub fn try_new(tri: TriangularView<E>, rhs: R) -> Result<Self> {
        check_inner_dims(tri.shape(), rhs.shape())?;
        Ok(TriangularProduct {
            tri,
            rhs,
            cache: OnceCell::new(),
        })
    }

    pub fn kind(&self) -> ProductKind {
        ProductKind::Triangular
    }

    pub fn mode(&self) -> TriangularMode {
        self.tri.mode()
    }
}

impl<E, R> Expr for TriangularProduct<E, R>
where
    E: Expr,
    R: Expr<Scalar = E::Scalar>,
{
    type Scalar = E::Scalar;
    type Rows = E::Rows;
    type Cols = R::Cols;

    const FLAGS: Flags = Flags::EVAL_BEFORE_NESTING.union(Flags::DIRECT_ACCESS);
    const COST: usize = <E::Scalar as Scalar>::READ_COST;

    #[inline]
    fn rows(&self) -> E::Rows {
        self.tri.rows()
    }

    #[inline]
    fn cols(&self) -> R::Cols {
        self.rhs.cols()
    }

    fn coeff(&self, i: usize, j: usize) -> E::Scalar {
        cached(&self.cache, self).coeff(i, j)
    }

    fn direct(&self) -> Option<MatRef<'_, E::Scalar>> {
        Some(cached(&self.cache, self).mat_ref())
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.tri.overlap(dst).max(self.rhs.overlap(dst)).shuffled()
    }

    fn eval_into<F: AssignFunctor<E::Scalar>>(&self, dst: MatMut<'_, E::Scalar>, func: F) -> Result<()> {
        if let Some(c) = self.cache.get() {
            return c.eval_into(dst, func);
        }
        let one = <E::Scalar as num_traits::One>::one();
        let (mut lhs_tmp, mut rhs_tmp) = (None, None);
        let (a, conj_a) = operand(self.tri.nested(), &mut lhs_tmp)?;
        let (b, conj_b) = operand(&self.rhs, &mut rhs_tmp)?;
        debug!(
            "triangular product {:?} {}x{}x{} ({:?})",
            self.tri.mode(),
            a.nrows(),
            a.ncols(),
            b.ncols(),
            F::KIND
        );
        trmm(dst, F::KIND, a, self.tri.mode(), conj_a, b, conj_b, one)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AccessorsLevel;
    use crate::{Map, MapMut, Matrix2, Matrix3, MatrixBase, MatrixX, RowVectorX, SMatrix, Vector3, VectorX};
    use approx::assert_relative_eq;

    fn naive(a: &MatrixX<f64>, b: &MatrixX<f64>) -> MatrixX<f64> {
        MatrixX::from_fn(a.nrows(), b.ncols(), |i, j| {
            (0..a.ncols()).map(|k| a[(i, k)] * b[(k, j)]).sum()
        })
    }

    #[test]
    fn test_static_kinds() {
        let d = Extent::Dynamic;
        let one = Extent::Fixed(1);
        assert_eq!(product_kind(one, d, one), ProductKind::Inner);
        assert_eq!(product_kind(d, one, d), ProductKind::Outer);
        assert_eq!(product_kind(Extent::Fixed(3), Extent::Fixed(3), Extent::Fixed(3)), ProductKind::Lazy);
        assert_eq!(product_kind(Extent::Fixed(8), Extent::Fixed(8), Extent::Fixed(8)), ProductKind::Gemm);
        assert_eq!(product_kind(d, d, one), ProductKind::Gemv);
        assert_eq!(product_kind(d, d, d), ProductKind::Gemm);
        assert_eq!(Product::<&Matrix3<f64>, &Vector3<f64>>::STATIC_KIND, ProductKind::Lazy);
        assert!(<Product<&MatrixX<f64>, &MatrixX<f64>> as Expr>::FLAGS.contains(Flags::EVAL_BEFORE_NESTING));
    }

    #[test]
    fn test_flags_match_direct_access() {
        let a = MatrixX::<f64>::from_fn(4, 4, |i, j| (i + 2 * j) as f64);
        let gemm = &a * &a;
        assert!(AccessorsLevel::from_flags(<Product<&MatrixX<f64>, &MatrixX<f64>> as Expr>::FLAGS).is_direct());
        assert!(gemm.direct().is_some());

        let f = Matrix2::<f64>::identity();
        let lazy = &f * &f;
        assert!(!AccessorsLevel::from_flags(<Product<&Matrix2<f64>, &Matrix2<f64>> as Expr>::FLAGS).is_direct());
        assert!(lazy.direct().is_none());

        let tri = (&a).triangular_view(TriangularMode::Lower) * &a;
        assert!(<TriangularProduct<&MatrixX<f64>, &MatrixX<f64>> as Expr>::FLAGS.contains(Flags::DIRECT_ACCESS));
        assert!(tri.direct().is_some());

        // a dynamic product that turns out 1 x 1 still reads through its cache
        let row = MatrixX::<f64>::from_element(1, 4, 1.0);
        let col = MatrixX::<f64>::from_element(4, 1, 2.0);
        let dot = &row * &col;
        assert_eq!(dot.kind(), ProductKind::Inner);
        assert_eq!(dot.direct().map(|v| v.get(0, 0)), Some(8.0));
        assert_eq!(dot.coeff(0, 0), 8.0);
    }

    #[test]
    fn test_operand_without_direct_access_is_evaluated() {
        let a = MatrixX::<f64>::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        let expected = naive(&(&a + &a).eval(), &a);
        let got = ((&a + &a) * &a).eval();
        assert!((&got).is_approx(&expected));

        let conjugated = (&a).conjugate();
        let mut tmp = None;
        let (view, conj) = operand(&conjugated, &mut tmp).unwrap();
        assert!(conj);
        assert_eq!(view.get(1, 2), 5.0);
        assert!(tmp.is_none());

        let sum = &a + &a;
        let (view, conj) = operand(&sum, &mut tmp).unwrap();
        assert!(!conj);
        assert_eq!(view.get(1, 2), 10.0);
        assert!(tmp.is_some());
    }

    #[test]
    fn test_runtime_refinement() {
        let a = MatrixX::<f64>::zeros(1, 4);
        let b = MatrixX::<f64>::zeros(4, 1);
        assert_eq!((&a * &b).kind(), ProductKind::Inner);
        assert_eq!((&b * &a).kind(), ProductKind::Outer);
        let m = MatrixX::<f64>::zeros(4, 4);
        assert_eq!((&m * &b).kind(), ProductKind::Gemv);
        assert_eq!((&a * &m).kind(), ProductKind::Gemv);
        assert_eq!((&m * &m).kind(), ProductKind::Gemm);
    }

    #[test]
    fn test_kernels_match_naive() {
        let a = MatrixX::<f64>::from_fn(5, 3, |i, j| (i as f64) - 0.5 * j as f64);
        let b = MatrixX::<f64>::from_fn(3, 4, |i, j| (i * j) as f64 + 1.0);
        let expected = naive(&a, &b);
        let c = (&a * &b).eval();
        assert!((&c).is_approx(&expected));

        let v = VectorX::<f64>::from_fn(3, |i| i as f64 + 1.0);
        let av = (&a * &v).eval();
        for i in 0..5 {
            assert_relative_eq!(av[i], (0..3).map(|k| a[(i, k)] * v[k]).sum::<f64>());
        }

        let r = RowVectorX::<f64>::from_fn(5, |j| j as f64);
        let ra = (&r * &a).eval();
        assert_eq!(ra.shape(), (1, 3));
        for j in 0..3 {
            assert_relative_eq!(ra[(0, j)], (0..5).map(|k| r[k] * a[(k, j)]).sum::<f64>());
        }
    }

    #[test]
    fn test_inner_and_outer() {
        let v = VectorX::<f64>::from_fn(3, |i| i as f64 + 1.0);
        let w = VectorX::<f64>::from_fn(3, |i| 2.0 - i as f64);
        let inner = (&v).transpose() * &w;
        assert_relative_eq!(inner.value(), 1.0 * 2.0 + 2.0 * 1.0 + 3.0 * 0.0);
        let outer = (&v * (&w).transpose()).eval();
        assert_eq!(outer.shape(), (3, 3));
        assert_relative_eq!(outer[(2, 0)], 6.0);
        assert!((&v * (&w).transpose()).try_value().is_err());
    }

    #[test]
    fn test_lazy_fixed_product() {
        let a = Matrix2::<i32>::from_rows([[1, 2], [3, 4]]);
        let b = Matrix2::<i32>::from_rows([[0, 1], [1, 0]]);
        let p = &a * &b;
        assert_eq!(p.kind(), ProductKind::Lazy);
        let c: Matrix2<i32> = Matrix2::from_expr(&p);
        assert_eq!(c, Matrix2::from_rows([[2, 1], [4, 3]]));
        let s: SMatrix<i32, 2, 2> = Matrix2::from_expr((&a).transpose() * &a);
        assert_eq!(s[(1, 1)], 2 * 2 + 4 * 4);
    }

    #[test]
    fn test_aliased_product_uses_temporary() {
        let a = MatrixX::<f64>::from_fn(3, 3, |i, j| (i + j) as f64);
        let b = MatrixX::<f64>::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        let expected = naive(&a, &b);

        let mut data = a.as_slice().to_vec();
        let ptr = data.as_mut_ptr();
        // SAFETY: both maps cover `data`, which outlives them and is not
        // touched otherwise until they are dropped.
        let (src, mut dst) = unsafe {
            (
                Map::from_raw_parts(ptr.cast_const(), 3, 3, 1, 3),
                MapMut::from_raw_parts(ptr, 3, 3, 1, 3),
            )
        };
        dst.assign(src * &b);
        assert_eq!(data, expected.as_slice());
    }

    #[test]
    fn test_noalias_accumulates() {
        let a = MatrixX::<f64>::identity(3, 3);
        let b = MatrixX::<f64>::from_element(3, 3, 2.0);
        let mut c = MatrixX::<f64>::from_element(3, 3, 1.0);
        c.noalias().try_add_assign(&a * &b).unwrap();
        assert_eq!(c, MatrixX::from_element(3, 3, 3.0));
        c.noalias().try_sub_assign(&a * &b).unwrap();
        assert_eq!(c, MatrixX::from_element(3, 3, 1.0));
    }

    #[test]
    fn test_nested_product_is_cached() {
        let a = MatrixX::<f64>::from_fn(4, 4, |i, j| (i * 4 + j) as f64);
        let b = MatrixX::<f64>::identity(4, 4);
        let sum = ((&a * &b) + &a).eval();
        assert_eq!(sum, MatrixX::from_fn(4, 4, |i, j| 2.0 * (i * 4 + j) as f64));
        let t = (&a * &b).transpose().eval();
        assert_eq!(t[(0, 1)], 4.0);
    }

    #[test]
    fn test_conjugated_operands_use_kernel_flags() {
        use crate::MatrixXcd;
        use num_complex::Complex64;
        let m = MatrixXcd::from_fn(3, 3, |i, j| Complex64::new(i as f64, j as f64));
        let p = ((&m).adjoint() * &m).eval();
        let expected = MatrixXcd::from_fn(3, 3, |i, j| {
            (0..3).map(|k| m[(k, i)].conj() * m[(k, j)]).sum()
        });
        assert!((&p).is_approx(&expected));
    }

    #[test]
    fn test_triangular_product() {
        let a = MatrixX::<f64>::from_fn(3, 3, |i, j| (1 + i * 3 + j) as f64);
        let b = MatrixX::<f64>::from_fn(3, 2, |i, j| (i + j) as f64);
        for mode in [
            TriangularMode::Upper,
            TriangularMode::Lower,
            TriangularMode::UnitUpper,
            TriangularMode::StrictlyLower,
        ] {
            let tri = (&a).triangular_view(mode);
            let dense = tri.eval();
            let expected = naive(&dense, &b);
            let got = ((&a).triangular_view(mode) * &b).eval();
            assert!((&got).is_approx(&expected), "{mode:?}");
        }
    }

    #[test]
    fn test_inner_dimension_mismatch() {
        let a = MatrixX::<f64>::zeros(2, 3);
        assert!(matches!(
            Product::try_new(&a, &a),
            Err(DenseError::ShapeMismatch { .. })
        ));
    }
}
