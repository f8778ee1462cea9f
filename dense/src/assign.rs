//! The assignment engine.
//!
//! Every write of an expression into a destination goes through
//! [`assign_expr`]:
//!
//! 1. **Shape**: an empty destination with a dynamic extent is resized for a
//!    plain assignment; any other mismatch is [`DenseError::ShapeMismatch`]
//! 2. **Aliasing**: a source that reads the destination's memory at other
//!    positions than the ones being written is evaluated into a temporary
//!    first ([`NoAlias`] skips the check)
//! 3. **Evaluation**: [`Expr::eval_into`], which products override to call
//!    the kernels and everything else leaves to [`traverse`]
//!
//! [`traverse`] picks one [`Traversal`] per assignment from the source's
//! flags and the destination's strides.

use std::ops::{AddAssign, SubAssign};

use dense_kernel::zip_assign;
use dense_traits::{AddAssignOp, AssignFunctor, AssignKind, AssignOp, Conj, Identity, Packet, SubAssignOp, PACKET_LANES};
use dense_view::{DenseError, MatMut, Overlap, Result, SameDim};
use log::{debug, trace};

use crate::expr::{direct_operand, Expr, ExprMut};
use crate::traits::{AccessorsLevel, Flags};
use crate::MatrixX;

/// Panic with `e`; the non-`try` entry points report errors this way.
#[cold]
#[track_caller]
pub(crate) fn fault(e: DenseError) -> ! {
    panic!("{e}")
}

/// Loop structure used to evaluate one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Both sides have strided storage; handed to the blocked kernel.
    Direct,
    /// One flat loop over packed storage, in packets.
    LinearVectorized,
    /// One flat loop over packed storage, scalar.
    Linear,
    /// Packets along the inner axis, which is a multiple of the packet width.
    InnerVectorized,
    /// Packets along the inner axis plus a scalar tail per slice.
    SliceVectorized,
    /// Scalar loops in the destination's storage order.
    Default,
}

/// Whether the destination's rows are the inner (fastest) axis.
fn rows_are_inner<T>(dst: &MatMut<'_, T>) -> bool {
    match (dst.nrows(), dst.ncols()) {
        (1, c) if c > 1 => true,
        (_, 1) => false,
        _ => dst.col_stride().unsigned_abs() < dst.row_stride().unsigned_abs(),
    }
}

/// Pick the traversal for `dst (op)= src`.
///
/// Only the layout of `dst` is inspected at run time; what `src` supports is
/// read from its type.
pub fn select_traversal<E: Expr>(dst: &MatMut<'_, E::Scalar>, _src: &E) -> Traversal {
    if AccessorsLevel::from_flags(E::FLAGS).is_direct() {
        return Traversal::Direct;
    }
    let row_wise = rows_are_inner(dst);
    let is_vector = dst.nrows() == 1 || dst.ncols() == 1;
    let packet = E::FLAGS.contains(Flags::PACKET_ACCESS);

    let dst_packed = if row_wise {
        dst.rb().is_row_major_contiguous()
    } else {
        dst.rb().is_col_major_contiguous()
    };
    let same_order = is_vector || E::FLAGS.contains(Flags::ROW_MAJOR) == row_wise;
    if dst_packed && same_order && E::FLAGS.contains(Flags::LINEAR_ACCESS) {
        let size = dst.nrows() * dst.ncols();
        return if packet && size >= PACKET_LANES {
            Traversal::LinearVectorized
        } else {
            Traversal::Linear
        };
    }

    let inner = if row_wise { dst.ncols() } else { dst.nrows() };
    if packet && inner >= PACKET_LANES {
        if inner % PACKET_LANES == 0 {
            Traversal::InnerVectorized
        } else {
            Traversal::SliceVectorized
        }
    } else {
        Traversal::Default
    }
}

/// `dst (func)= src` by coefficient, packet or kernel loops.
///
/// The caller has resolved aliasing; only the shape is checked here.
pub(crate) fn traverse<E, F>(mut dst: MatMut<'_, E::Scalar>, src: &E, func: F) -> Result<()>
where
    E: Expr,
    F: AssignFunctor<E::Scalar>,
{
    let expected = (dst.nrows(), dst.ncols());
    let found = src.shape();
    if expected != found {
        return Err(DenseError::ShapeMismatch { expected, found });
    }
    if dst.is_empty() {
        return Ok(());
    }

    let traversal = select_traversal(&dst, src);
    trace!(
        "assign {}x{} ({:?}) with {:?} traversal",
        expected.0,
        expected.1,
        F::KIND,
        traversal
    );
    let row_wise = rows_are_inner(&dst);
    match traversal {
        Traversal::Direct => match direct_operand(src) {
            Some((view, true)) => zip_assign::<_, Conj>(dst, view, |d, s| func.assign(d, s)),
            Some((view, false)) => zip_assign::<_, Identity>(dst, view, |d, s| func.assign(d, s)),
            None => {
                scalar_loops(&mut dst, src, func, row_wise);
                Ok(())
            }
        },
        Traversal::LinearVectorized | Traversal::Linear => {
            let vectorized = traversal == Traversal::LinearVectorized;
            match dst.as_mut_slice() {
                Some(d) => linear_loop(d, src, func, vectorized),
                None => scalar_loops(&mut dst, src, func, row_wise),
            }
            Ok(())
        }
        Traversal::InnerVectorized | Traversal::SliceVectorized => {
            if row_wise {
                packet_rows(&mut dst, src, func);
            } else {
                packet_cols(&mut dst, src, func);
            }
            Ok(())
        }
        Traversal::Default => {
            scalar_loops(&mut dst, src, func, row_wise);
            Ok(())
        }
    }
}

fn linear_loop<E: Expr, F: AssignFunctor<E::Scalar>>(d: &mut [E::Scalar], src: &E, func: F, vectorized: bool) {
    let n = d.len();
    let mut k = 0;
    if vectorized {
        while k + PACKET_LANES <= n {
            let p = func.assign_packet(Packet::load(&d[k..]), src.packet_linear(k));
            p.store(&mut d[k..]);
            k += PACKET_LANES;
        }
    }
    for (k, x) in d.iter_mut().enumerate().skip(k) {
        *x = func.assign(*x, src.coeff_linear(k));
    }
}

fn packet_cols<E: Expr, F: AssignFunctor<E::Scalar>>(dst: &mut MatMut<'_, E::Scalar>, src: &E, func: F) {
    let (rows, cols) = (dst.nrows(), dst.ncols());
    let aligned = rows - rows % PACKET_LANES;
    for j in 0..cols {
        for i in (0..aligned).step_by(PACKET_LANES) {
            let s = src.packet_col(i, j);
            match dst.col_run_mut(i, j, PACKET_LANES) {
                Some(run) => func.assign_packet(Packet::load(run), s).store(run),
                None => {
                    for k in 0..PACKET_LANES {
                        let v = func.assign(dst.get(i + k, j), s.lane(k));
                        dst.write(i + k, j, v);
                    }
                }
            }
        }
        for i in aligned..rows {
            let v = func.assign(dst.get(i, j), src.coeff(i, j));
            dst.write(i, j, v);
        }
    }
}

fn packet_rows<E: Expr, F: AssignFunctor<E::Scalar>>(dst: &mut MatMut<'_, E::Scalar>, src: &E, func: F) {
    let (rows, cols) = (dst.nrows(), dst.ncols());
    let aligned = cols - cols % PACKET_LANES;
    for i in 0..rows {
        for j in (0..aligned).step_by(PACKET_LANES) {
            let s = src.packet_row(i, j);
            match dst.row_run_mut(i, j, PACKET_LANES) {
                Some(run) => func.assign_packet(Packet::load(run), s).store(run),
                None => {
                    for k in 0..PACKET_LANES {
                        let v = func.assign(dst.get(i, j + k), s.lane(k));
                        dst.write(i, j + k, v);
                    }
                }
            }
        }
        for j in aligned..cols {
            let v = func.assign(dst.get(i, j), src.coeff(i, j));
            dst.write(i, j, v);
        }
    }
}

fn scalar_loops<E: Expr, F: AssignFunctor<E::Scalar>>(
    dst: &mut MatMut<'_, E::Scalar>,
    src: &E,
    func: F,
    row_wise: bool,
) {
    let (rows, cols) = (dst.nrows(), dst.ncols());
    if row_wise {
        for i in 0..rows {
            for j in 0..cols {
                let v = func.assign(dst.get(i, j), src.coeff(i, j));
                dst.write(i, j, v);
            }
        }
    } else {
        for j in 0..cols {
            for i in 0..rows {
                let v = func.assign(dst.get(i, j), src.coeff(i, j));
                dst.write(i, j, v);
            }
        }
    }
}

/// `dst (func)= src` with shape resolution and, when `check_alias` is set,
/// evaluation through a temporary if `src` reads `dst` at shuffled
/// positions.
pub(crate) fn assign_expr<D, E, F>(dst: &mut D, src: &E, func: F, check_alias: bool) -> Result<()>
where
    D: ExprMut + ?Sized,
    E: Expr<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let (rows, cols) = src.shape();
    if dst.target_shape() != (rows, cols) {
        if F::KIND == AssignKind::Replace {
            dst.resize_target(rows, cols)?;
        } else {
            return Err(DenseError::ShapeMismatch {
                expected: dst.target_shape(),
                found: (rows, cols),
            });
        }
    }
    if check_alias && src.overlap(&dst.target_layout()) == Overlap::Shuffled {
        debug!("source reads the {rows}x{cols} destination at shuffled positions, evaluating into a temporary");
        let tmp = evaluate_unaliased(src)?;
        return (&tmp).eval_into(dst.target_view(), func);
    }
    src.eval_into(dst.target_view(), func)
}

/// `src` evaluated into fresh storage.
pub(crate) fn evaluate_unaliased<E: Expr>(src: &E) -> Result<MatrixX<E::Scalar>> {
    let mut tmp = MatrixX::zeros(src.nrows(), src.ncols());
    src.eval_into(tmp.target_view(), AssignOp)?;
    Ok(tmp)
}

/// A destination whose assignments skip the aliasing check.
///
/// Obtained from [`ExprMut::noalias`]. The caller asserts that the source
/// never reads the destination's memory at other positions than the ones
/// being written; products then write their result straight into the
/// destination instead of a temporary.
pub struct NoAlias<'a, D: ?Sized> {
    dst: &'a mut D,
}

impl<'a, D: ExprMut + ?Sized> NoAlias<'a, D> {
    pub(crate) fn new(dst: &'a mut D) -> Self {
        NoAlias { dst }
    }

    pub fn try_assign<E>(self, src: E) -> Result<()>
    where
        E: Expr<Scalar = D::Scalar>,
        E::Rows: SameDim<D::Rows>,
        E::Cols: SameDim<D::Cols>,
    {
        assign_expr(self.dst, &src, AssignOp, false)
    }

    #[track_caller]
    pub fn assign<E>(self, src: E)
    where
        E: Expr<Scalar = D::Scalar>,
        E::Rows: SameDim<D::Rows>,
        E::Cols: SameDim<D::Cols>,
    {
        if let Err(e) = self.try_assign(src) {
            fault(e)
        }
    }

    pub fn try_add_assign<E>(self, src: E) -> Result<()>
    where
        E: Expr<Scalar = D::Scalar>,
        E::Rows: SameDim<D::Rows>,
        E::Cols: SameDim<D::Cols>,
    {
        assign_expr(self.dst, &src, AddAssignOp, false)
    }

    pub fn try_sub_assign<E>(self, src: E) -> Result<()>
    where
        E: Expr<Scalar = D::Scalar>,
        E::Rows: SameDim<D::Rows>,
        E::Cols: SameDim<D::Cols>,
    {
        assign_expr(self.dst, &src, SubAssignOp, false)
    }
}

impl<'a, D, E> AddAssign<E> for NoAlias<'a, D>
where
    D: ExprMut + ?Sized,
    E: Expr<Scalar = D::Scalar>,
    E::Rows: SameDim<D::Rows>,
    E::Cols: SameDim<D::Cols>,
{
    #[track_caller]
    fn add_assign(&mut self, rhs: E) {
        if let Err(e) = assign_expr(&mut *self.dst, &rhs, AddAssignOp, false) {
            fault(e)
        }
    }
}

impl<'a, D, E> SubAssign<E> for NoAlias<'a, D>
where
    D: ExprMut + ?Sized,
    E: Expr<Scalar = D::Scalar>,
    E::Rows: SameDim<D::Rows>,
    E::Cols: SameDim<D::Cols>,
{
    #[track_caller]
    fn sub_assign(&mut self, rhs: E) {
        if let Err(e) = assign_expr(&mut *self.dst, &rhs, SubAssignOp, false) {
            fault(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Map, MapMut, MatrixBase, MatrixX, RowMajor};
    use crate::{CwiseNullary, Matrix};
    use dense_traits::functor::ConstantOp;
    use dense_view::{Dyn, MatRef};

    #[test]
    fn test_traversal_selection() {
        let a = MatrixX::<f64>::zeros(8, 8);
        let mut d = MatrixX::<f64>::zeros(8, 8);
        let view = d.target_view();
        assert_eq!(select_traversal(&view, &&a), Traversal::Direct);
        assert_eq!(select_traversal(&view, &(&a + &a)), Traversal::LinearVectorized);
        assert_eq!(select_traversal(&view, &(&a).transpose().map(|x| x)), Traversal::Default);
        assert_eq!(
            select_traversal(&view, &(&a).block(0, 0, 8, 8).cwise_abs()),
            Traversal::InnerVectorized
        );

        let r = Matrix::<f64, Dyn, Dyn, RowMajor>::zeros(8, 8);
        // a transposed row-major matrix reads in column-major order
        assert_eq!(
            select_traversal(&view, &(&r).transpose().cwise_abs()),
            Traversal::LinearVectorized
        );
        assert_eq!(select_traversal(&view, &(&r).cwise_abs()), Traversal::InnerVectorized);

        let ones = CwiseNullary::<ConstantOp<f64>, f64, Dyn, Dyn>::new(Dyn(6), Dyn(8), ConstantOp(1.0));
        let mut tall = MatrixX::<f64>::zeros(7, 8);
        let mut window = tall.block_mut(0, 0, 6, 8);
        assert_eq!(select_traversal(&window.target_view(), &ones), Traversal::SliceVectorized);
    }

    #[test]
    fn test_every_traversal_gives_the_same_result() {
        let a = MatrixX::<i32>::from_fn(7, 9, |i, j| (i * 10 + j) as i32);
        let expected = MatrixX::<i32>::from_fn(7, 9, |i, j| 2 * (i * 10 + j) as i32 + 1);
        let ones = CwiseNullary::<ConstantOp<i32>, i32, Dyn, Dyn>::new(Dyn(7), Dyn(9), ConstantOp(1));

        let mut packed = MatrixX::<i32>::zeros(7, 9);
        packed.assign(&a + &a + &ones);
        assert_eq!(packed, expected);

        let mut row_major = Matrix::<i32, Dyn, Dyn, RowMajor>::zeros(7, 9);
        row_major.assign(&a + &a + &ones);
        assert!((&row_major).equals(&expected));

        let mut buffer = vec![0i32; 8 * 9];
        let mut strided = MapMut::with_strides(&mut buffer, 7, 9, 1, 8, 0).unwrap();
        strided.assign(&a + &a + &ones);
        assert!(strided.rb().equals(&expected));
    }

    #[test]
    fn test_resize_only_empty_dynamic() {
        let a = MatrixX::<f64>::identity(3, 3);
        let mut empty = MatrixX::<f64>::new();
        empty.assign(&a);
        assert_eq!(empty, a);

        let mut wrong = MatrixX::<f64>::zeros(2, 2);
        assert_eq!(
            wrong.try_assign(&a),
            Err(DenseError::ShapeMismatch {
                expected: (2, 2),
                found: (3, 3)
            })
        );
        let mut empty = MatrixX::<f64>::new();
        assert!(empty.try_add_assign(&a).is_err());
    }

    #[test]
    fn test_alias_through_raw_maps_uses_temporary() {
        let mut data: Vec<i64> = (0..9).collect();
        let ptr = data.as_mut_ptr();
        // SAFETY: both maps cover `data`, which outlives them and is not
        // touched otherwise until they are dropped.
        let (src, mut dst) = unsafe {
            (
                Map::from_raw_parts(ptr.cast_const(), 3, 3, 3, 1),
                MapMut::from_raw_parts(ptr, 3, 3, 1, 3),
            )
        };
        dst.assign(src);
        assert_eq!(data, vec![0, 3, 6, 1, 4, 7, 2, 5, 8]);
    }

    #[test]
    fn test_same_index_overlap_is_in_place() {
        let mut m = MatrixX::<f64>::from_element(2, 2, 1.0);
        let view = MatRef::col_major(m.as_slice(), 2, 2).unwrap();
        assert_eq!(view.layout().classify(&m.target_layout()), Overlap::SameIndex);
        m += MatrixX::<f64>::from_element(2, 2, 1.0).view();
        assert_eq!(m[(1, 1)], 2.0);
    }
}
