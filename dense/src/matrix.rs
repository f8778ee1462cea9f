//! Owned dense matrices.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{AddAssign, DivAssign, Index, IndexMut, MulAssign, SubAssign};

use dense_kernel::{map_in_place, Element};
use dense_traits::{AddAssignOp, AssignOp, Packet, Scalar, SubAssignOp};
use dense_view::{
    assert_index, should_check, ColMajor, Const, DenseError, Dim, Dyn, Layout, MatMut, MatRef, Result, SameDim,
    StorageOrder, U1,
};
use rand::Rng;

use crate::assign::{assign_expr, fault};
use crate::expr::{Expr, ExprMut};
use crate::map::{Map, MapMut};
use crate::nest::NestByValue;
use crate::storage::{Allocate, Buffer};
use crate::traits::{Flags, Nesting};

/// `D` holding `n`, or [`DenseError::FixedDimension`].
pub(crate) fn dim_from<D: Dim>(n: usize) -> Result<D> {
    D::try_from_usize(n).ok_or(DenseError::FixedDimension {
        fixed: D::EXTENT.fixed_or(n),
        requested: n,
    })
}

/// A `rows x cols` matrix owning its coefficients.
///
/// `R` and `C` are [`Const`] for extents known at compile time and [`Dyn`]
/// otherwise; `O` is the storage order. Fully fixed matrices live inline,
/// others on the heap.
///
/// `Matrix` itself is a destination ([`ExprMut`]); a shared reference to it
/// is an expression, so `&a + &b` builds a lazy sum that borrows both.
pub struct Matrix<T, R = Dyn, C = Dyn, O = ColMajor>
where
    T: Scalar,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    data: <(R, C) as Allocate<T>>::Buffer,
    rows: R,
    cols: C,
    _order: PhantomData<O>,
}

impl<T, R, C, O> Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    pub fn from_element_generic(rows: R, cols: C, value: T) -> Self {
        let len = rows.value() * cols.value();
        Matrix {
            data: Buffer::filled(value, len),
            rows,
            cols,
            _order: PhantomData,
        }
    }

    pub fn zeros_generic(rows: R, cols: C) -> Self {
        Self::from_element_generic(rows, cols, T::zero())
    }

    /// `f(i, j)` for every coefficient, visited column by column.
    pub fn from_fn_generic(rows: R, cols: C, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut m = Self::zeros_generic(rows, cols);
        let (r, c) = m.shape();
        let data = m.data.as_mut_slice();
        for j in 0..c {
            for i in 0..r {
                data[O::linear_index(i, j, r, c)] = f(i, j);
            }
        }
        m
    }

    pub fn identity_generic(rows: R, cols: C) -> Self {
        Self::from_fn_generic(rows, cols, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Coefficients drawn by [`Scalar::sample`]: uniform in `[-1, 1)` for
    /// floating point parts, `[-10, 10]` for integers.
    pub fn random_generic<G: Rng + ?Sized>(rows: R, cols: C, rng: &mut G) -> Self {
        Self::from_fn_generic(rows, cols, |_, _| T::sample(rng))
    }

    /// Copy the first `rows * cols` entries of `data`, given in storage order.
    pub fn try_from_slice_generic(rows: R, cols: C, data: &[T]) -> Result<Self> {
        let needed = rows.value() * cols.value();
        if data.len() < needed {
            return Err(DenseError::BufferTooSmall {
                needed,
                len: data.len(),
            });
        }
        let mut m = Self::zeros_generic(rows, cols);
        m.data.as_mut_slice().copy_from_slice(&data[..needed]);
        Ok(m)
    }

    /// Evaluate `src` into a new matrix.
    ///
    /// Fails with [`DenseError::FixedDimension`] when a compile-time extent
    /// of `Self` disagrees with the expression's shape. When both extents are
    /// fixed the disagreement is a type error:
    ///
    /// ```compile_fail
    /// use dense::{Matrix2, Matrix3};
    ///
    /// let m2 = Matrix2::<f64>::identity();
    /// let _ = Matrix3::<f64>::try_from_expr(&m2);
    /// ```
    pub fn try_from_expr<E>(src: E) -> Result<Self>
    where
        E: Expr<Scalar = T>,
        E::Rows: SameDim<R>,
        E::Cols: SameDim<C>,
    {
        let rows = dim_from::<R>(src.nrows())?;
        let cols = dim_from::<C>(src.ncols())?;
        let mut m = Self::zeros_generic(rows, cols);
        assign_expr(&mut m, &src, AssignOp, false)?;
        Ok(m)
    }

    #[track_caller]
    pub fn from_expr<E>(src: E) -> Self
    where
        E: Expr<Scalar = T>,
        E::Rows: SameDim<R>,
        E::Cols: SameDim<C>,
    {
        Self::try_from_expr(src).unwrap_or_else(|e| fault(e))
    }

    /// Move `self` into an expression node that owns it.
    pub fn nest_by_value(self) -> NestByValue<T, R, C, O> {
        NestByValue::new(self)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows.value()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols.value()
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nrows() * self.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coefficients in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data.as_slice()[..self.len()]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        &mut self.data.as_mut_slice()[..len]
    }

    fn strides(&self) -> (isize, isize) {
        O::packed_strides(self.nrows(), self.ncols())
    }

    pub(crate) fn mat_ref(&self) -> MatRef<'_, T> {
        let (rs, cs) = self.strides();
        let (rows, cols) = self.shape();
        // SAFETY: the buffer holds `rows * cols` packed coefficients borrowed
        // for the lifetime of the view.
        unsafe { MatRef::from_raw_parts(self.data.as_slice().as_ptr(), rows, cols, rs, cs) }
    }

    pub(crate) fn mat_mut(&mut self) -> MatMut<'_, T> {
        let (rs, cs) = self.strides();
        let (rows, cols) = self.shape();
        // SAFETY: as in `mat_ref`, with the buffer borrowed mutably.
        unsafe { MatMut::from_raw_parts(self.data.as_mut_slice().as_mut_ptr(), rows, cols, rs, cs) }
    }

    /// Borrowed view with the same extents.
    pub fn view(&self) -> Map<'_, T, R, C> {
        Map::with_dims(self.mat_ref(), self.rows, self.cols)
    }

    pub fn view_mut(&mut self) -> MapMut<'_, T, R, C> {
        let (rows, cols) = (self.rows, self.cols);
        MapMut::with_dims(self.mat_mut(), rows, cols)
    }

    /// Writable `rows x cols` window at `(i, j)`.
    pub fn try_block_mut(&mut self, i: usize, j: usize, rows: usize, cols: usize) -> Result<MapMut<'_, T>> {
        check_window(self.shape(), i, j, rows, cols)?;
        Ok(MapMut::with_dims(self.mat_mut().subview(i, j, rows, cols), Dyn(rows), Dyn(cols)))
    }

    #[track_caller]
    pub fn block_mut(&mut self, i: usize, j: usize, rows: usize, cols: usize) -> MapMut<'_, T> {
        self.try_block_mut(i, j, rows, cols).unwrap_or_else(|e| fault(e))
    }

    #[track_caller]
    pub fn row_mut(&mut self, i: usize) -> MapMut<'_, T> {
        let cols = self.ncols();
        self.block_mut(i, 0, 1, cols)
    }

    #[track_caller]
    pub fn col_mut(&mut self, j: usize) -> MapMut<'_, T> {
        let rows = self.nrows();
        self.block_mut(0, j, rows, 1)
    }

    /// Reallocate as a zero-filled `rows x cols` matrix.
    pub fn try_resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        let r = dim_from::<R>(rows)?;
        let c = dim_from::<C>(cols)?;
        if (rows, cols) != self.shape() {
            log::debug!("resizing {}x{} matrix to {}x{}", self.nrows(), self.ncols(), rows, cols);
            *self = Self::zeros_generic(r, c);
        }
        Ok(())
    }

    #[track_caller]
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if let Err(e) = self.try_resize(rows, cols) {
            fault(e)
        }
    }

    /// Replace `self` by its transpose.
    ///
    /// Square matrices are handled through the assignment engine, which sees
    /// the source and destination share storage. Non-square matrices need
    /// both extents dynamic, or compile-time extents that match after the
    /// swap.
    pub fn try_transpose_in_place(&mut self) -> Result<()> {
        let (rows, cols) = self.shape();
        if rows == cols {
            let (rs, cs) = self.strides();
            let ptr = self.data.as_mut_slice().as_mut_ptr();
            // SAFETY: both views cover exactly this matrix's storage, which
            // stays mutably borrowed for the whole call. The transposed source
            // overlaps the destination at shuffled positions, so the engine
            // reads all of it into a temporary before writing.
            let (src, mut dst) = unsafe {
                (
                    Map::from_raw_parts(ptr.cast_const(), rows, cols, cs, rs),
                    MapMut::from_raw_parts(ptr, rows, cols, rs, cs),
                )
            };
            return assign_expr(&mut dst, &src, AssignOp, true);
        }
        let new_rows = dim_from::<R>(cols)?;
        let new_cols = dim_from::<C>(rows)?;
        let mut data = <<(R, C) as Allocate<T>>::Buffer as Buffer<T>>::filled(T::zero(), rows * cols);
        {
            let out = data.as_mut_slice();
            let src = self.data.as_slice();
            for j in 0..cols {
                for i in 0..rows {
                    out[O::linear_index(j, i, cols, rows)] = src[O::linear_index(i, j, rows, cols)];
                }
            }
        }
        self.data = data;
        self.rows = new_rows;
        self.cols = new_cols;
        Ok(())
    }

    #[track_caller]
    pub fn transpose_in_place(&mut self) {
        if let Err(e) = self.try_transpose_in_place() {
            fault(e)
        }
    }

    /// Replace `self` by its conjugate transpose.
    pub fn try_adjoint_in_place(&mut self) -> Result<()> {
        self.try_transpose_in_place()?;
        if T::IS_COMPLEX {
            map_in_place(self.mat_mut(), |x| x.conj());
        }
        Ok(())
    }

    #[track_caller]
    pub fn adjoint_in_place(&mut self) {
        if let Err(e) = self.try_adjoint_in_place() {
            fault(e)
        }
    }
}

/// `rows x cols` window at `(i, j)` fits in `shape`.
pub(crate) fn check_window(shape: (usize, usize), i: usize, j: usize, rows: usize, cols: usize) -> Result<()> {
    let fits = |start: usize, len: usize, total: usize| start.checked_add(len).is_some_and(|end| end <= total);
    if fits(i, rows, shape.0) && fits(j, cols, shape.1) {
        Ok(())
    } else {
        Err(DenseError::IndexOutOfBounds {
            row: i.saturating_add(rows),
            col: j.saturating_add(cols),
            rows: shape.0,
            cols: shape.1,
        })
    }
}

// ============================================================================
// Constructors by extent kind
// ============================================================================

impl<T: Element, O: StorageOrder> Matrix<T, Dyn, Dyn, O> {
    /// An empty `0 x 0` matrix.
    pub fn new() -> Self {
        Self::zeros(0, 0)
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::zeros_generic(Dyn(rows), Dyn(cols))
    }

    pub fn from_element(rows: usize, cols: usize, value: T) -> Self {
        Self::from_element_generic(Dyn(rows), Dyn(cols), value)
    }

    pub fn identity(rows: usize, cols: usize) -> Self {
        Self::identity_generic(Dyn(rows), Dyn(cols))
    }

    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> T) -> Self {
        Self::from_fn_generic(Dyn(rows), Dyn(cols), f)
    }

    /// Random coefficients from the thread-local generator.
    pub fn random(rows: usize, cols: usize) -> Self {
        Self::random_generic(Dyn(rows), Dyn(cols), &mut rand::thread_rng())
    }

    pub fn random_with<G: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut G) -> Self {
        Self::random_generic(Dyn(rows), Dyn(cols), rng)
    }

    /// Coefficients listed column by column.
    pub fn from_column_slice(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        let src = MatRef::col_major(data, rows, cols)?;
        Ok(Self::from_fn(rows, cols, |i, j| src.get(i, j)))
    }

    /// Coefficients listed row by row.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        let src = MatRef::row_major(data, rows, cols)?;
        Ok(Self::from_fn(rows, cols, |i, j| src.get(i, j)))
    }
}

impl<T: Element, O: StorageOrder> Default for Matrix<T, Dyn, Dyn, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element, const R: usize, const C: usize, O: StorageOrder> Matrix<T, Const<R>, Const<C>, O> {
    pub fn zeros() -> Self {
        Self::zeros_generic(Const, Const)
    }

    pub fn from_element(value: T) -> Self {
        Self::from_element_generic(Const, Const, value)
    }

    pub fn identity() -> Self {
        Self::identity_generic(Const, Const)
    }

    pub fn from_fn(f: impl FnMut(usize, usize) -> T) -> Self {
        Self::from_fn_generic(Const, Const, f)
    }

    pub fn random() -> Self {
        Self::random_generic(Const, Const, &mut rand::thread_rng())
    }

    pub fn random_with<G: Rng + ?Sized>(rng: &mut G) -> Self {
        Self::random_generic(Const, Const, rng)
    }

    /// Coefficients listed row by row, as they read in source code.
    pub fn from_rows(rows: [[T; C]; R]) -> Self {
        Self::from_fn(|i, j| rows[i][j])
    }

    pub fn from_column_slice(data: &[T]) -> Result<Self> {
        let src = MatRef::col_major(data, R, C)?;
        Ok(Self::from_fn(|i, j| src.get(i, j)))
    }

    pub fn from_row_slice(data: &[T]) -> Result<Self> {
        let src = MatRef::row_major(data, R, C)?;
        Ok(Self::from_fn(|i, j| src.get(i, j)))
    }
}

impl<T: Element, const R: usize, const C: usize, O: StorageOrder> Default for Matrix<T, Const<R>, Const<C>, O> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Element, const R: usize, O: StorageOrder> Matrix<T, Const<R>, U1, O> {
    /// Column vector from its entries.
    pub fn from_array(values: [T; R]) -> Self {
        Self::from_fn(|i, _| values[i])
    }
}

impl<T: Element, O: StorageOrder> Matrix<T, Dyn, U1, O> {
    /// Zero column vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self::zeros_generic(Dyn(n), Const)
    }

    pub fn from_fn(n: usize, mut f: impl FnMut(usize) -> T) -> Self {
        Self::from_fn_generic(Dyn(n), Const, |i, _| f(i))
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        Self::from_fn(values.len(), |i| values[i])
    }

    pub fn random(n: usize) -> Self {
        Self::random_generic(Dyn(n), Const, &mut rand::thread_rng())
    }

    pub fn random_with<G: Rng + ?Sized>(n: usize, rng: &mut G) -> Self {
        Self::random_generic(Dyn(n), Const, rng)
    }
}

impl<T: Element, O: StorageOrder> Matrix<T, U1, Dyn, O> {
    /// Zero row vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self::zeros_generic(Const, Dyn(n))
    }

    pub fn from_fn(n: usize, mut f: impl FnMut(usize) -> T) -> Self {
        Self::from_fn_generic(Const, Dyn(n), |_, j| f(j))
    }

    pub fn random_with<G: Rng + ?Sized>(n: usize, rng: &mut G) -> Self {
        Self::random_generic(Const, Dyn(n), rng)
    }
}

// ============================================================================
// Expression and destination protocols
// ============================================================================

impl<'a, T, R, C, O> Expr for &'a Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    const FLAGS: Flags = Flags::DIRECT_ACCESS
        .union(Flags::LVALUE)
        .union(Flags::PACKET_ACCESS)
        .union(Flags::LINEAR_ACCESS)
        .with_if(Flags::ROW_MAJOR, O::IS_ROW_MAJOR);
    const COST: usize = T::READ_COST;
    const NESTING: Nesting = Nesting::ByRef;

    #[inline]
    fn rows(&self) -> R {
        self.rows
    }

    #[inline]
    fn cols(&self) -> C {
        self.cols
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> T {
        self.data.as_slice()[O::linear_index(i, j, self.nrows(), self.ncols())]
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<T> {
        if O::IS_ROW_MAJOR {
            Packet::from_fn(|k| self.coeff(i + k, j))
        } else {
            Packet::load(&self.data.as_slice()[O::linear_index(i, j, self.nrows(), self.ncols())..])
        }
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<T> {
        if O::IS_ROW_MAJOR {
            Packet::load(&self.data.as_slice()[O::linear_index(i, j, self.nrows(), self.ncols())..])
        } else {
            Packet::from_fn(|k| self.coeff(i, j + k))
        }
    }

    #[inline(always)]
    fn coeff_linear(&self, k: usize) -> T {
        self.data.as_slice()[k]
    }

    #[inline(always)]
    fn packet_linear(&self, k: usize) -> Packet<T> {
        Packet::load(&self.data.as_slice()[k..])
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, T>> {
        Some(self.mat_ref())
    }
}

impl<T, R, C, O> ExprMut for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    fn target_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn target_view(&mut self) -> MatMut<'_, T> {
        self.mat_mut()
    }

    fn target_layout(&self) -> Layout {
        self.mat_ref().layout()
    }

    /// Only an empty matrix with a dynamic extent is reshaped.
    fn resize_target(&mut self, rows: usize, cols: usize) -> Result<()> {
        let expected = self.shape();
        if expected == (rows, cols) {
            return Ok(());
        }
        let resizable = !(R::EXTENT.is_fixed() && C::EXTENT.is_fixed());
        if resizable && self.is_empty() {
            return self.try_resize(rows, cols);
        }
        Err(DenseError::ShapeMismatch {
            expected,
            found: (rows, cols),
        })
    }
}

// ============================================================================
// Std traits
// ============================================================================

impl<T, R, C, O> Clone for Matrix<T, R, C, O>
where
    T: Scalar,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn clone(&self) -> Self {
        Matrix {
            data: self.data.clone(),
            rows: self.rows,
            cols: self.cols,
            _order: PhantomData,
        }
    }
}

impl<T, R, C, O> PartialEq for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.as_slice() == other.as_slice()
    }
}

impl<T, R, C, O> fmt::Debug for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<T>> = (0..self.nrows())
            .map(|i| (0..self.ncols()).map(|j| self.coeff(i, j)).collect())
            .collect();
        f.debug_struct("Matrix")
            .field("shape", &self.shape())
            .field("order", &O::default())
            .field("rows", &rows)
            .finish()
    }
}

impl<T, R, C, O> Index<(usize, usize)> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    type Output = T;

    #[track_caller]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert_index(i, j, self.nrows(), self.ncols());
        &self.data.as_slice()[O::linear_index(i, j, self.nrows(), self.ncols())]
    }
}

impl<T, R, C, O> IndexMut<(usize, usize)> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    #[track_caller]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        let (rows, cols) = self.shape();
        assert_index(i, j, rows, cols);
        &mut self.data.as_mut_slice()[O::linear_index(i, j, rows, cols)]
    }
}

/// Vector entry `k`; panics on a matrix with two extents above one.
impl<T, R, C, O> Index<usize> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    type Output = T;

    #[track_caller]
    fn index(&self, k: usize) -> &T {
        let (rows, cols) = self.shape();
        if rows != 1 && cols != 1 {
            fault(DenseError::NotAVector { rows, cols })
        }
        if should_check() && k >= self.len() {
            let (row, col) = if rows == 1 { (0, k) } else { (k, 0) };
            fault(DenseError::IndexOutOfBounds { row, col, rows, cols })
        }
        &self.data.as_slice()[k]
    }
}

impl<T, R, C, O> IndexMut<usize> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    #[track_caller]
    fn index_mut(&mut self, k: usize) -> &mut T {
        let (rows, cols) = self.shape();
        if rows != 1 && cols != 1 {
            fault(DenseError::NotAVector { rows, cols })
        }
        if should_check() && k >= self.len() {
            let (row, col) = if rows == 1 { (0, k) } else { (k, 0) };
            fault(DenseError::IndexOutOfBounds { row, col, rows, cols })
        }
        &mut self.data.as_mut_slice()[k]
    }
}

impl<T, R, C, O, E> AddAssign<E> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
    E: Expr<Scalar = T>,
    E::Rows: SameDim<R>,
    E::Cols: SameDim<C>,
{
    #[track_caller]
    fn add_assign(&mut self, rhs: E) {
        if let Err(e) = assign_expr(self, &rhs, AddAssignOp, true) {
            fault(e)
        }
    }
}

impl<T, R, C, O, E> SubAssign<E> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
    E: Expr<Scalar = T>,
    E::Rows: SameDim<R>,
    E::Cols: SameDim<C>,
{
    #[track_caller]
    fn sub_assign(&mut self, rhs: E) {
        if let Err(e) = assign_expr(self, &rhs, SubAssignOp, true) {
            fault(e)
        }
    }
}

impl<T, R, C, O> MulAssign<T> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn mul_assign(&mut self, rhs: T) {
        map_in_place(self.mat_mut(), |x| x * rhs);
    }
}

impl<T, R, C, O> DivAssign<T> for Matrix<T, R, C, O>
where
    T: Element,
    R: Dim,
    C: Dim,
    O: StorageOrder,
    (R, C): Allocate<T>,
{
    fn div_assign(&mut self, rhs: T) {
        map_in_place(self.mat_mut(), |x| x / rhs);
    }
}
