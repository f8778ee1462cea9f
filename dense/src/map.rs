//! Matrices over borrowed storage.
//!
//! [`Map`] and [`MapMut`] give the expression and destination protocols to
//! memory the caller owns: slices with arbitrary strides, or raw pointers.
//! Their extents are [`Dyn`] by default and can be pinned to compile-time
//! values with [`Map::from_view`].

use dense_kernel::{map_in_place, Element};
use dense_traits::{AddAssignOp, Packet, SubAssignOp, PACKET_LANES};
use dense_view::{Dim, Dyn, Layout, MatMut, MatRef, Result, SameDim};
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use crate::assign::{assign_expr, fault};
use crate::expr::{Expr, ExprMut};
use crate::matrix::dim_from;
use crate::traits::Flags;

fn pin_dims<R: Dim, C: Dim>(rows: usize, cols: usize) -> Result<(R, C)> {
    Ok((dim_from::<R>(rows)?, dim_from::<C>(cols)?))
}

/// Read-only matrix over borrowed strided storage.
#[derive(Debug, Clone, Copy)]
pub struct Map<'a, T, R = Dyn, C = Dyn> {
    view: MatRef<'a, T>,
    rows: R,
    cols: C,
}

impl<'a, T: Element> Map<'a, T> {
    /// Column-major `rows x cols` matrix over `data`.
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::with_dims(MatRef::col_major(data, rows, cols)?, Dyn(rows), Dyn(cols)))
    }

    pub fn from_slice_row_major(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::with_dims(MatRef::row_major(data, rows, cols)?, Dyn(rows), Dyn(cols)))
    }

    /// `data[offset + i * row_stride + j * col_stride]`; strides may be
    /// negative or zero.
    pub fn with_strides(
        data: &'a [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: usize,
    ) -> Result<Self> {
        let view = MatRef::from_slice(data, rows, cols, row_stride, col_stride, offset)?;
        Ok(Self::with_dims(view, Dyn(rows), Dyn(cols)))
    }

    /// Map raw memory.
    ///
    /// # Safety
    /// Same contract as [`MatRef::from_raw_parts`].
    pub unsafe fn from_raw_parts(ptr: *const T, rows: usize, cols: usize, row_stride: isize, col_stride: isize) -> Self {
        let view = MatRef::from_raw_parts(ptr, rows, cols, row_stride, col_stride);
        Self::with_dims(view, Dyn(rows), Dyn(cols))
    }
}

impl<'a, T: Element, R: Dim, C: Dim> Map<'a, T, R, C> {
    pub(crate) fn with_dims(view: MatRef<'a, T>, rows: R, cols: C) -> Self {
        Map { view, rows, cols }
    }

    /// Pin the extents of `view`; fails with [`crate::DenseError::FixedDimension`]
    /// when a compile-time extent disagrees.
    pub fn from_view(view: MatRef<'a, T>) -> Result<Self> {
        let (rows, cols) = pin_dims(view.nrows(), view.ncols())?;
        Ok(Self::with_dims(view, rows, cols))
    }

    pub fn as_view(&self) -> MatRef<'a, T> {
        self.view
    }
}

impl<'a, T: Element, R: Dim, C: Dim> Expr for Map<'a, T, R, C> {
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    /// Strides, row-major ones included, are only known at run time, so a
    /// map claims neither linear access nor a storage order.
    const FLAGS: Flags = Flags::DIRECT_ACCESS.union(Flags::PACKET_ACCESS);
    const COST: usize = T::READ_COST;

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
        self.view.get(i, j)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<T> {
        match self.view.col_run(i, j, PACKET_LANES) {
            Some(run) => Packet::load(run),
            None => Packet::from_fn(|k| self.view.get(i + k, j)),
        }
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<T> {
        match self.view.row_run(i, j, PACKET_LANES) {
            Some(run) => Packet::load(run),
            None => Packet::from_fn(|k| self.view.get(i, j + k)),
        }
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, T>> {
        Some(self.view)
    }
}

/// Writable matrix over borrowed strided storage.
#[derive(Debug)]
pub struct MapMut<'a, T, R = Dyn, C = Dyn> {
    view: MatMut<'a, T>,
    rows: R,
    cols: C,
}

impl<'a, T: Element> MapMut<'a, T> {
    pub fn from_slice(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::with_dims(MatMut::col_major(data, rows, cols)?, Dyn(rows), Dyn(cols)))
    }

    pub fn from_slice_row_major(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::with_dims(MatMut::row_major(data, rows, cols)?, Dyn(rows), Dyn(cols)))
    }

    pub fn with_strides(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: usize,
    ) -> Result<Self> {
        let view = MatMut::from_slice(data, rows, cols, row_stride, col_stride, offset)?;
        Ok(Self::with_dims(view, Dyn(rows), Dyn(cols)))
    }

    /// Map raw memory for writing.
    ///
    /// # Safety
    /// Same contract as [`MatMut::from_raw_parts`].
    pub unsafe fn from_raw_parts(ptr: *mut T, rows: usize, cols: usize, row_stride: isize, col_stride: isize) -> Self {
        let view = MatMut::from_raw_parts(ptr, rows, cols, row_stride, col_stride);
        Self::with_dims(view, Dyn(rows), Dyn(cols))
    }
}

impl<'a, T: Element, R: Dim, C: Dim> MapMut<'a, T, R, C> {
    pub(crate) fn with_dims(view: MatMut<'a, T>, rows: R, cols: C) -> Self {
        MapMut { view, rows, cols }
    }

    pub fn from_view(view: MatMut<'a, T>) -> Result<Self> {
        let (rows, cols) = pin_dims(view.nrows(), view.ncols())?;
        Ok(Self::with_dims(view, rows, cols))
    }

    pub fn as_view(&self) -> MatRef<'_, T> {
        self.view.rb()
    }

    pub fn as_view_mut(&mut self) -> MatMut<'_, T> {
        self.view.rb_mut()
    }

    /// Read-only reborrow.
    pub fn rb(&self) -> Map<'_, T, R, C> {
        Map::with_dims(self.view.rb(), self.rows, self.cols)
    }

    /// Writable `rows x cols` window at `(i, j)`.
    pub fn try_block_mut(&mut self, i: usize, j: usize, rows: usize, cols: usize) -> Result<MapMut<'_, T>> {
        crate::matrix::check_window((self.view.nrows(), self.view.ncols()), i, j, rows, cols)?;
        let view = self.view.rb_mut().subview(i, j, rows, cols);
        Ok(MapMut::with_dims(view, Dyn(rows), Dyn(cols)))
    }
}

impl<'a, T: Element, R: Dim, C: Dim> Expr for MapMut<'a, T, R, C> {
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    /// Same as [`Map`], plus [`Flags::LVALUE`].
    const FLAGS: Flags = Flags::DIRECT_ACCESS
        .union(Flags::LVALUE)
        .union(Flags::PACKET_ACCESS);
    const COST: usize = T::READ_COST;

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
        self.view.get(i, j)
    }

    #[inline(always)]
    fn packet_col(&self, i: usize, j: usize) -> Packet<T> {
        self.rb().packet_col(i, j)
    }

    #[inline(always)]
    fn packet_row(&self, i: usize, j: usize) -> Packet<T> {
        self.rb().packet_row(i, j)
    }

    #[inline]
    fn direct(&self) -> Option<MatRef<'_, T>> {
        Some(self.view.rb())
    }
}

impl<'a, T: Element, R: Dim, C: Dim> ExprMut for MapMut<'a, T, R, C> {
    type Scalar = T;
    type Rows = R;
    type Cols = C;

    fn target_shape(&self) -> (usize, usize) {
        (self.view.nrows(), self.view.ncols())
    }

    fn target_view(&mut self) -> MatMut<'_, T> {
        self.view.rb_mut()
    }

    fn target_layout(&self) -> Layout {
        self.view.layout()
    }
}

impl<'a, T, R, C, E> AddAssign<E> for MapMut<'a, T, R, C>
where
    T: Element,
    R: Dim,
    C: Dim,
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

impl<'a, T, R, C, E> SubAssign<E> for MapMut<'a, T, R, C>
where
    T: Element,
    R: Dim,
    C: Dim,
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

impl<'a, T: Element, R: Dim, C: Dim> MulAssign<T> for MapMut<'a, T, R, C> {
    fn mul_assign(&mut self, rhs: T) {
        map_in_place(self.view.rb_mut(), |x| x * rhs);
    }
}

impl<'a, T: Element, R: Dim, C: Dim> DivAssign<T> for MapMut<'a, T, R, C> {
    fn div_assign(&mut self, rhs: T) {
        map_in_place(self.view.rb_mut(), |x| x / rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::{select_traversal, Traversal};
    use crate::traits::AccessorsLevel;
    use crate::{Matrix, MatrixBase, MatrixX, RowMajor, U2, U3};
    use dense_view::DenseError;

    #[test]
    fn test_strided_map_reads() {
        let data: Vec<f64> = (0..12).map(|x| x as f64).collect();
        // every other row of a 4x3 column-major matrix
        let m = Map::with_strides(&data, 2, 3, 2, 4, 0).unwrap();
        assert_eq!(m.coeff(1, 2), 10.0);
        assert_eq!(m.sum(), 0.0 + 2.0 + 4.0 + 6.0 + 8.0 + 10.0);
    }

    #[test]
    fn test_pinned_extents() {
        let data = [1i32; 6];
        let view = MatRef::col_major(&data, 2, 3).unwrap();
        assert!(Map::<i32, U2, U3>::from_view(view).is_ok());
        assert_eq!(
            Map::<i32, U3, Dyn>::from_view(view).err(),
            Some(DenseError::FixedDimension { fixed: 3, requested: 2 })
        );
    }

    #[test]
    fn test_map_mut_compound_assignment() {
        let mut data = vec![1.0f32; 4];
        let other = [1.0f32, 2.0, 3.0, 4.0];
        {
            let mut m = MapMut::from_slice(&mut data, 2, 2).unwrap();
            m += Map::from_slice(&other, 2, 2).unwrap();
            m *= 2.0;
        }
        assert_eq!(data, vec![4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_row_major_map_stays_strided() {
        let data: Vec<i32> = (0..12).collect();
        let rm = Map::from_slice_row_major(&data, 3, 4).unwrap();
        assert!(!<Map<'_, i32> as Expr>::FLAGS.contains(Flags::LINEAR_ACCESS));
        assert!(!<Map<'_, i32> as Expr>::FLAGS.contains(Flags::ROW_MAJOR));
        assert_eq!(rm.coeff(1, 0), 4);

        let cm = MatrixX::<i32>::from_fn(3, 4, |i, j| (10 * i + j) as i32);
        let sum = rm + &cm;
        assert!(!AccessorsLevel::from_flags(flags_of(&sum)).is_direct());
        assert!(!flags_of(&sum).contains(Flags::LINEAR_ACCESS));

        let mut dst = MatrixX::<i32>::zeros(3, 4);
        let traversal = select_traversal(&dst.target_view(), &sum);
        assert!(!matches!(traversal, Traversal::Linear | Traversal::LinearVectorized));
        dst.assign(sum);
        assert_eq!(dst[(2, 1)], 9 + 21);
        assert_eq!(dst[(0, 3)], 3 + 3);

        let mut out = vec![0i32; 12];
        let mut rm_dst = MapMut::from_slice_row_major(&mut out, 3, 4).unwrap();
        rm_dst.assign(rm);
        assert_eq!(out, data);

        let mut packed = Matrix::<i32, Dyn, Dyn, RowMajor>::zeros(3, 4);
        packed.assign(rm + rm);
        assert_eq!(packed.as_slice(), &data.iter().map(|x| 2 * x).collect::<Vec<_>>()[..]);
    }

    fn flags_of<E: Expr>(_: &E) -> Flags {
        E::FLAGS
    }

    #[test]
    fn test_map_mut_sub_block() {
        let mut data = vec![0i64; 9];
        let mut m = MapMut::from_slice(&mut data, 3, 3).unwrap();
        m.try_block_mut(1, 0, 2, 2).unwrap().fill(5);
        assert!(m.try_block_mut(2, 2, 2, 1).is_err());
        assert_eq!(data, vec![0, 5, 5, 0, 5, 5, 0, 0, 0]);
    }
}
