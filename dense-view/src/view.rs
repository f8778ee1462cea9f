//! Borrowed 2-D strided views.
//!
//! - [`MatRef`]: read-only view, `Copy`
//! - [`MatMut`]: writable view
//! - [`Layout`] / [`Overlap`]: memory footprint of a view, used to detect
//!   aliasing between the source and destination of an assignment
//!
//! A view stores a pointer to coefficient `(0, 0)`, its shape and two signed
//! strides. It also records the offset range it may touch (the whole backing
//! slice for views built from slices); every access is checked against that
//! range, so a bad logical index can never leave the buffer.

use std::marker::PhantomData;

use crate::{DenseError, Result};

// ============================================================================
// Validation helpers
// ============================================================================

/// Offsets `[lo, hi)` reached by a `rows x cols` view relative to its origin.
fn offset_span(rows: usize, cols: usize, row_stride: isize, col_stride: isize) -> Result<(isize, isize)> {
    if rows == 0 || cols == 0 {
        return Ok((0, 0));
    }
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (dim, stride) in [(rows, row_stride), (cols, col_stride)] {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(DenseError::OffsetOverflow)?;
            if end >= 0 {
                hi = hi.checked_add(end).ok_or(DenseError::OffsetOverflow)?;
            } else {
                lo = lo.checked_add(end).ok_or(DenseError::OffsetOverflow)?;
            }
        }
    }
    Ok((lo, hi + 1))
}

/// Validate that every coefficient of the view lies in `[0, len)`.
fn validate_bounds(
    len: usize,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    offset: usize,
) -> Result<()> {
    let (lo, hi) = offset_span(rows, cols, row_stride, col_stride)?;
    if lo == hi {
        return Ok(());
    }
    let offset = isize::try_from(offset).map_err(|_| DenseError::OffsetOverflow)?;
    let min = offset.checked_add(lo).ok_or(DenseError::OffsetOverflow)?;
    let end = offset.checked_add(hi).ok_or(DenseError::OffsetOverflow)?;
    if min < 0 {
        return Err(DenseError::OffsetOverflow);
    }
    if end as usize > len {
        return Err(DenseError::BufferTooSmall {
            needed: end as usize,
            len,
        });
    }
    Ok(())
}

#[cold]
#[inline(never)]
#[track_caller]
fn outside_storage(offset: isize, guard: (isize, isize)) -> ! {
    panic!(
        "coefficient offset {offset} outside backing storage [{}, {})",
        guard.0, guard.1
    )
}

#[inline(always)]
#[track_caller]
fn guard_range(guard: (isize, isize), start: isize, len: usize) {
    let end = start + len as isize;
    if start < guard.0 || end > guard.1 {
        outside_storage(if start < guard.0 { start } else { end - 1 }, guard);
    }
}

// ============================================================================
// Layout / Overlap
// ============================================================================

/// How a source footprint relates to a destination footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Overlap {
    /// No shared memory.
    None,
    /// Shared memory, but every coefficient `(i, j)` of the source is the
    /// destination's own `(i, j)`: an in-place elementwise update is safe.
    SameIndex,
    /// Shared memory read at other positions than the ones written.
    Shuffled,
}

impl Overlap {
    /// Combine the overlap of two children.
    #[inline]
    pub fn max(self, other: Overlap) -> Overlap {
        std::cmp::max(self, other)
    }

    /// Overlap seen through a node that reads its child at other positions.
    #[inline]
    pub fn shuffled(self) -> Overlap {
        match self {
            Overlap::None => Overlap::None,
            _ => Overlap::Shuffled,
        }
    }
}

/// Memory footprint of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    base: usize,
    start: usize,
    end: usize,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
}

impl Layout {
    fn of<T>(ptr: *const T, rows: usize, cols: usize, row_stride: isize, col_stride: isize) -> Layout {
        let size = std::mem::size_of::<T>().max(1) as isize;
        let (lo, hi) = offset_span(rows, cols, row_stride, col_stride).unwrap_or((0, 0));
        let base = ptr as usize;
        Layout {
            base,
            start: base.wrapping_add_signed(lo * size),
            end: base.wrapping_add_signed(hi * size),
            rows,
            cols,
            row_stride,
            col_stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Classify how `self` (a source) overlaps `dst`.
    pub fn classify(&self, dst: &Layout) -> Overlap {
        if self.is_empty() || dst.is_empty() || self.end <= dst.start || dst.end <= self.start {
            return Overlap::None;
        }
        let same_rows = self.rows <= 1 || self.row_stride == dst.row_stride;
        let same_cols = self.cols <= 1 || self.col_stride == dst.col_stride;
        if self.base == dst.base
            && self.rows == dst.rows
            && self.cols == dst.cols
            && same_rows
            && same_cols
        {
            Overlap::SameIndex
        } else {
            Overlap::Shuffled
        }
    }
}

// ============================================================================
// MatRef
// ============================================================================

/// Read-only strided view of a `rows x cols` matrix.
pub struct MatRef<'a, T> {
    ptr: *const T,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    guard: (isize, isize),
    _marker: PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for MatRef<'_, T> {}
unsafe impl<T: Sync> Sync for MatRef<'_, T> {}

impl<T> Clone for MatRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatRef<'_, T> {}

impl<T> std::fmt::Debug for MatRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatRef")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("row_stride", &self.row_stride)
            .field("col_stride", &self.col_stride)
            .finish()
    }
}

impl<'a, T> MatRef<'a, T> {
    /// View `data[offset + i * row_stride + j * col_stride]`.
    pub fn from_slice(
        data: &'a [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), rows, cols, row_stride, col_stride, offset)?;
        let origin = offset as isize;
        Ok(Self {
            ptr: data.as_ptr().wrapping_add(offset),
            rows,
            cols,
            row_stride,
            col_stride,
            guard: (-origin, data.len() as isize - origin),
            _marker: PhantomData,
        })
    }

    pub fn col_major(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        Self::from_slice(data, rows, cols, 1, rows as isize, 0)
    }

    pub fn row_major(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        Self::from_slice(data, rows, cols, cols as isize, 1, 0)
    }

    /// View raw memory.
    ///
    /// # Safety
    /// Every coefficient `ptr + i * row_stride + j * col_stride` must be valid
    /// for reads during `'a`. Writes to that memory during `'a` must only
    /// happen through a [`MatMut`] handed to the assignment engine together
    /// with this view, never concurrently.
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        let guard = offset_span(rows, cols, row_stride, col_stride).unwrap_or((0, 0));
        Self {
            ptr,
            rows,
            cols,
            row_stride,
            col_stride,
            guard,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline(always)]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    /// Pointer to coefficient `(0, 0)`.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    #[inline(always)]
    fn offset(&self, i: usize, j: usize) -> isize {
        i as isize * self.row_stride + j as isize * self.col_stride
    }

    /// Columns are packed and adjacent.
    pub fn is_col_major_contiguous(&self) -> bool {
        self.row_stride == 1 && (self.cols <= 1 || self.col_stride == self.rows as isize)
    }

    /// Rows are packed and adjacent.
    pub fn is_row_major_contiguous(&self) -> bool {
        self.col_stride == 1 && (self.rows <= 1 || self.row_stride == self.cols as isize)
    }

    #[inline(always)]
    #[track_caller]
    pub fn get(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        let o = self.offset(i, j);
        guard_range(self.guard, o, 1);
        // SAFETY: `o` is inside the guarded range, which is valid for reads.
        unsafe { *self.ptr.wrapping_offset(o) }
    }

    /// Reference to coefficient `(i, j)` for the whole view lifetime.
    #[inline(always)]
    #[track_caller]
    pub fn get_ref(&self, i: usize, j: usize) -> &'a T {
        let o = self.offset(i, j);
        guard_range(self.guard, o, 1);
        // SAFETY: `o` is inside the guarded range, which is valid for reads.
        unsafe { &*self.ptr.wrapping_offset(o) }
    }

    /// `n` coefficients starting at `(i, j)` going down a unit-stride column.
    #[inline(always)]
    #[track_caller]
    pub fn col_run(&self, i: usize, j: usize, n: usize) -> Option<&'a [T]> {
        if self.row_stride != 1 {
            return None;
        }
        let o = self.offset(i, j);
        guard_range(self.guard, o, n);
        // SAFETY: `[o, o + n)` is inside the guarded range.
        Some(unsafe { std::slice::from_raw_parts(self.ptr.wrapping_offset(o), n) })
    }

    /// `n` coefficients starting at `(i, j)` going along a unit-stride row.
    #[inline(always)]
    #[track_caller]
    pub fn row_run(&self, i: usize, j: usize, n: usize) -> Option<&'a [T]> {
        self.transpose().col_run(j, i, n)
    }

    /// The whole view as one slice in its storage order, when packed.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.is_empty() {
            return Some(&[]);
        }
        if self.is_col_major_contiguous() || self.is_row_major_contiguous() {
            guard_range(self.guard, 0, self.len());
            // SAFETY: the packed footprint `[0, len)` is inside the guarded range.
            Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len()) })
        } else {
            None
        }
    }

    pub fn transpose(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            ..self
        }
    }

    /// `rows x cols` sub-view starting at `(i, j)`.
    ///
    /// The position is not validated against the parent shape; accesses stay
    /// guarded by the parent's storage range.
    pub fn subview(self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        let o = self.offset(i, j);
        Self {
            ptr: self.ptr.wrapping_offset(o),
            rows,
            cols,
            guard: (self.guard.0 - o, self.guard.1 - o),
            ..self
        }
    }

    /// Flip the row order, the column order, or both.
    pub fn reverse(self, rows: bool, cols: bool) -> Self {
        let mut v = self;
        if rows && v.rows > 0 {
            v = v.subview(v.rows - 1, 0, v.rows, v.cols);
            v.row_stride = -v.row_stride;
        }
        if cols && v.cols > 0 {
            v = v.subview(0, v.cols - 1, v.rows, v.cols);
            v.col_stride = -v.col_stride;
        }
        v
    }

    /// Main diagonal as a column.
    pub fn diagonal(self) -> Self {
        Self {
            rows: self.rows.min(self.cols),
            cols: 1,
            row_stride: self.row_stride + self.col_stride,
            col_stride: 0,
            ..self
        }
    }

    pub fn layout(&self) -> Layout {
        Layout::of(self.ptr, self.rows, self.cols, self.row_stride, self.col_stride)
    }
}

// ============================================================================
// MatMut
// ============================================================================

/// Writable strided view of a `rows x cols` matrix.
pub struct MatMut<'a, T> {
    ptr: *mut T,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    guard: (isize, isize),
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for MatMut<'_, T> {}

impl<T> std::fmt::Debug for MatMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatMut")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("row_stride", &self.row_stride)
            .field("col_stride", &self.col_stride)
            .finish()
    }
}

impl<'a, T> MatMut<'a, T> {
    pub fn from_slice(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), rows, cols, row_stride, col_stride, offset)?;
        let origin = offset as isize;
        let len = data.len() as isize;
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_add(offset),
            rows,
            cols,
            row_stride,
            col_stride,
            guard: (-origin, len - origin),
            _marker: PhantomData,
        })
    }

    pub fn col_major(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        Self::from_slice(data, rows, cols, 1, rows as isize, 0)
    }

    pub fn row_major(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        Self::from_slice(data, rows, cols, cols as isize, 1, 0)
    }

    /// Writable view of raw memory.
    ///
    /// # Safety
    /// Every coefficient must be valid for reads and writes during `'a`, and
    /// no other handle may write it meanwhile. Read-only views created with
    /// [`MatRef::from_raw_parts`] may overlap it.
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        let guard = offset_span(rows, cols, row_stride, col_stride).unwrap_or((0, 0));
        Self {
            ptr,
            rows,
            cols,
            row_stride,
            col_stride,
            guard,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline(always)]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn rb(&self) -> MatRef<'_, T> {
        MatRef {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            guard: self.guard,
            _marker: PhantomData,
        }
    }

    /// Reborrow mutably for a shorter lifetime.
    #[inline]
    pub fn rb_mut(&mut self) -> MatMut<'_, T> {
        MatMut {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            guard: self.guard,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    fn offset(&self, i: usize, j: usize) -> isize {
        i as isize * self.row_stride + j as isize * self.col_stride
    }

    #[inline(always)]
    #[track_caller]
    pub fn get(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        self.rb().get(i, j)
    }

    #[inline(always)]
    #[track_caller]
    pub fn write(&mut self, i: usize, j: usize, value: T) {
        let o = self.offset(i, j);
        guard_range(self.guard, o, 1);
        // SAFETY: `o` is inside the guarded range, which is valid for writes.
        unsafe { self.ptr.wrapping_offset(o).write(value) }
    }

    #[inline(always)]
    #[track_caller]
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        let o = self.offset(i, j);
        guard_range(self.guard, o, 1);
        // SAFETY: `o` is inside the guarded range; `&mut self` is unique.
        unsafe { &mut *self.ptr.wrapping_offset(o) }
    }

    /// Consume the view into a reference to coefficient `(i, j)`.
    #[inline(always)]
    #[track_caller]
    pub fn into_coeff_mut(self, i: usize, j: usize) -> &'a mut T {
        let o = self.offset(i, j);
        guard_range(self.guard, o, 1);
        // SAFETY: `o` is inside the guarded range; the view was the unique writer.
        unsafe { &mut *self.ptr.wrapping_offset(o) }
    }

    /// Mutable counterpart of [`MatRef::col_run`].
    #[inline(always)]
    #[track_caller]
    pub fn col_run_mut(&mut self, i: usize, j: usize, n: usize) -> Option<&mut [T]> {
        if self.row_stride != 1 {
            return None;
        }
        let o = self.offset(i, j);
        guard_range(self.guard, o, n);
        // SAFETY: `[o, o + n)` is inside the guarded range; `&mut self` is unique.
        Some(unsafe { std::slice::from_raw_parts_mut(self.ptr.wrapping_offset(o), n) })
    }

    #[inline(always)]
    #[track_caller]
    pub fn row_run_mut(&mut self, i: usize, j: usize, n: usize) -> Option<&mut [T]> {
        if self.col_stride != 1 {
            return None;
        }
        let o = self.offset(i, j);
        guard_range(self.guard, o, n);
        // SAFETY: `[o, o + n)` is inside the guarded range; `&mut self` is unique.
        Some(unsafe { std::slice::from_raw_parts_mut(self.ptr.wrapping_offset(o), n) })
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        let v = self.rb();
        if v.is_empty() {
            return Some(&mut []);
        }
        if v.is_col_major_contiguous() || v.is_row_major_contiguous() {
            let len = v.len();
            guard_range(self.guard, 0, len);
            // SAFETY: the packed footprint `[0, len)` is inside the guarded range.
            Some(unsafe { std::slice::from_raw_parts_mut(self.ptr, len) })
        } else {
            None
        }
    }

    pub fn transpose(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            ..self
        }
    }

    /// See [`MatRef::subview`].
    pub fn subview(self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        let o = self.offset(i, j);
        Self {
            ptr: self.ptr.wrapping_offset(o),
            rows,
            cols,
            guard: (self.guard.0 - o, self.guard.1 - o),
            ..self
        }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Copy,
    {
        for j in 0..self.cols {
            for i in 0..self.rows {
                self.write(i, j, value);
            }
        }
    }

    pub fn layout(&self) -> Layout {
        self.rb().layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_major_get() {
        let data: Vec<f64> = (0..6).map(|x| x as f64).collect();
        let v = MatRef::col_major(&data, 2, 3).unwrap();
        assert_eq!(v.get(1, 2), 5.0);
        assert_eq!(v.transpose().get(2, 1), 5.0);
        assert!(v.is_col_major_contiguous());
        assert!(v.transpose().is_row_major_contiguous());
    }

    #[test]
    fn test_validate_bounds() {
        let data = vec![0i32; 5];
        assert!(matches!(
            MatRef::col_major(&data, 2, 3),
            Err(DenseError::BufferTooSmall { needed: 6, len: 5 })
        ));
        assert!(MatRef::from_slice(&data, 2, 2, 1, 3, 0).is_ok());
        assert!(MatRef::from_slice(&data, 2, 2, -1, 1, 0).is_err());
        assert!(MatRef::from_slice(&data, 2, 2, -1, 1, 1).is_ok());
        assert!(MatRef::from_slice(&data, 0, 100, 1, 1, 0).is_ok());
    }

    #[test]
    fn test_subview_and_reverse() {
        let data: Vec<i32> = (0..12).collect();
        let v = MatRef::col_major(&data, 3, 4).unwrap();
        let b = v.subview(1, 1, 2, 2);
        assert_eq!(b.get(0, 0), 4);
        assert_eq!(b.get(1, 1), 8);
        let r = v.reverse(true, false);
        assert_eq!(r.get(0, 0), 2);
        assert_eq!(r.get(2, 3), 9);
        let rc = v.reverse(true, true);
        assert_eq!(rc.get(0, 0), 11);
        assert_eq!(v.diagonal().get(2, 0), 8);
    }

    #[test]
    #[should_panic(expected = "outside backing storage")]
    fn test_guard_catches_escape() {
        let data = vec![1.0f32; 4];
        let v = MatRef::col_major(&data, 2, 2).unwrap();
        let _ = v.get(2, 1);
    }

    #[test]
    fn test_runs() {
        let data: Vec<i32> = (0..6).collect();
        let v = MatRef::col_major(&data, 3, 2).unwrap();
        assert_eq!(v.col_run(0, 1, 3), Some(&[3, 4, 5][..]));
        assert_eq!(v.row_run(0, 0, 2), None);
        assert_eq!(v.transpose().row_run(1, 0, 3), Some(&[3, 4, 5][..]));
    }

    #[test]
    fn test_mat_mut_write() {
        let mut data = vec![0i64; 6];
        {
            let mut m = MatMut::row_major(&mut data, 2, 3).unwrap();
            m.write(1, 2, 7);
            *m.get_mut(0, 1) += 3;
            assert!(m.col_run_mut(0, 0, 1).is_none());
            if let Some(s) = m.row_run_mut(0, 0, 1) {
                s[0] = -1;
            }
            assert_eq!(m.row_run_mut(1, 0, 3).map(|s| s.len()), Some(3));
        }
        assert_eq!(data, vec![-1, 3, 0, 0, 0, 7]);
    }

    #[test]
    fn test_overlap_classification() {
        let data: Vec<f64> = vec![0.0; 16];
        let a = MatRef::col_major(&data, 4, 4).unwrap();
        let other: Vec<f64> = vec![0.0; 16];
        let b = MatRef::col_major(&other, 4, 4).unwrap();
        assert_eq!(a.layout().classify(&a.layout()), Overlap::SameIndex);
        assert_eq!(a.transpose().layout().classify(&a.layout()), Overlap::Shuffled);
        assert_eq!(b.layout().classify(&a.layout()), Overlap::None);
        assert_eq!(
            a.subview(0, 0, 2, 4).layout().classify(&a.subview(2, 0, 2, 4).layout()),
            Overlap::Shuffled
        );
        let left = a.subview(0, 0, 4, 2);
        let right = a.subview(0, 2, 4, 2);
        assert_eq!(left.layout().classify(&right.layout()), Overlap::None);
    }

    #[test]
    fn test_overlap_combinators() {
        assert_eq!(Overlap::None.max(Overlap::SameIndex), Overlap::SameIndex);
        assert_eq!(Overlap::SameIndex.shuffled(), Overlap::Shuffled);
        assert_eq!(Overlap::None.shuffled(), Overlap::None);
    }
}
