use approx::assert_relative_eq;
use dense::{
    Dyn, ExprMut, Map, Matrix, MatrixBase, MatrixX, Product, ProductKind, RowMajor, TriangularMode, VectorX,
    LAZY_PRODUCT_THRESHOLD,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn naive(a: &MatrixX<f64>, b: &MatrixX<f64>) -> MatrixX<f64> {
    MatrixX::from_fn(a.nrows(), b.ncols(), |i, j| (0..a.ncols()).map(|k| a[(i, k)] * b[(k, j)]).sum())
}

fn assert_close(got: &MatrixX<f64>, expected: &MatrixX<f64>) {
    assert_eq!(got.shape(), expected.shape());
    for j in 0..got.ncols() {
        for i in 0..got.nrows() {
            assert_relative_eq!(got[(i, j)], expected[(i, j)], epsilon = 1e-10);
        }
    }
}

#[test]
fn test_products_across_the_lazy_threshold() {
    let mut rng = StdRng::seed_from_u64(1);
    for &(m, k, n) in &[(1, 1, 1), (3, 5, 2), (8, 8, 8), (19, 20, 21), (25, 3, 25), (40, 33, 17)] {
        let a = MatrixX::<f64>::random_with(m, k, &mut rng);
        let b = MatrixX::<f64>::random_with(k, n, &mut rng);
        let c = (&a * &b).eval();
        assert_close(&c, &naive(&a, &b));
    }
}

#[test]
fn test_runtime_kind_of_dynamic_products() {
    let a = MatrixX::<f64>::zeros(30, 30);
    let x = VectorX::<f64>::zeros(30);
    assert_eq!((&a * &a).kind(), ProductKind::Gemm);
    assert_eq!((&a * &x).kind(), ProductKind::Gemv);
    assert_eq!(<Product<&MatrixX<f64>, &MatrixX<f64>>>::STATIC_KIND, ProductKind::Gemm);
    assert!(LAZY_PRODUCT_THRESHOLD > 0);
}

#[test]
fn test_row_major_destination() {
    let mut rng = StdRng::seed_from_u64(2);
    let a = MatrixX::<f64>::random_with(6, 4, &mut rng);
    let b = MatrixX::<f64>::random_with(4, 5, &mut rng);
    let mut c = Matrix::<f64, Dyn, Dyn, RowMajor>::zeros(6, 5);
    c.assign(&a * &b);
    let expected = naive(&a, &b);
    for i in 0..6 {
        for j in 0..5 {
            assert_relative_eq!(c[(i, j)], expected[(i, j)], epsilon = 1e-10);
        }
    }
}

#[test]
fn test_strided_operands() {
    let data: Vec<f64> = (0..48).map(|x| x as f64 * 0.25).collect();
    // every other row of a 12 x 4 column-major buffer
    let a = Map::with_strides(&data, 6, 4, 2, 12, 0).unwrap();
    let b = MatrixX::<f64>::from_fn(4, 3, |i, j| (i as f64) - (j as f64));
    let dense_a = MatrixX::<f64>::from_fn(6, 4, |i, j| data[2 * i + 12 * j]);
    let c = (a * &b).eval();
    assert_close(&c, &naive(&dense_a, &b));

    let t = ((&b).transpose() * a.transpose()).eval();
    assert_close(&t, &naive(&dense_a, &b).transpose().eval());
}

#[test]
fn test_accumulating_product() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = MatrixX::<f64>::random_with(7, 7, &mut rng);
    let b = MatrixX::<f64>::random_with(7, 7, &mut rng);
    let mut c = MatrixX::<f64>::identity(7, 7);
    c.noalias().try_add_assign(&a * &b).unwrap();
    c.noalias().try_sub_assign(&a * &b).unwrap();
    assert!(c.is_identity());
}

#[test]
fn test_product_inside_larger_expression() {
    let mut rng = StdRng::seed_from_u64(4);
    let a = MatrixX::<f64>::random_with(5, 5, &mut rng);
    let b = MatrixX::<f64>::random_with(5, 5, &mut rng);
    let got = ((&a * &b).transpose() * 2.0 - &a).eval();
    let ab = naive(&a, &b);
    let expected = MatrixX::from_fn(5, 5, |i, j| 2.0 * ab[(j, i)] - a[(i, j)]);
    assert_close(&got, &expected);
}

#[test]
fn test_triangular_product_matches_masked_gemm() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = MatrixX::<f64>::random_with(6, 6, &mut rng);
    let b = MatrixX::<f64>::random_with(6, 3, &mut rng);
    for mode in [TriangularMode::Upper, TriangularMode::UnitLower, TriangularMode::StrictlyLower] {
        let masked = (&a).triangular_view(mode).eval();
        let got = ((&a).triangular_view(mode) * &b).eval();
        assert_close(&got, &naive(&masked, &b));
    }
}
