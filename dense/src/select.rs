//! Coefficient-wise choice between two expressions.

use dense_view::{DenseError, Layout, Overlap, Result};
use num_traits::Zero;

use crate::expr::Expr;
use crate::traits::Flags;

/// `then(i, j)` where `cond(i, j)` is non-zero, `otherwise(i, j)` elsewhere.
///
/// The condition fixes the node's extents; both branches must match its
/// run-time shape.
#[derive(Debug, Clone, Copy)]
pub struct Select<Cnd, Th, El> {
    cond: Cnd,
    then: Th,
    otherwise: El,
}

impl<Cnd, Th, El> Select<Cnd, Th, El>
where
    Cnd: Expr,
    Th: Expr,
    El: Expr<Scalar = Th::Scalar>,
{
    pub fn try_new(cond: Cnd, then: Th, otherwise: El) -> Result<Self> {
        for found in [then.shape(), otherwise.shape()] {
            if found != cond.shape() {
                return Err(DenseError::ShapeMismatch {
                    expected: cond.shape(),
                    found,
                });
            }
        }
        Ok(Select {
            cond,
            then,
            otherwise,
        })
    }
}

impl<Cnd, Th, El> Expr for Select<Cnd, Th, El>
where
    Cnd: Expr,
    Th: Expr,
    El: Expr<Scalar = Th::Scalar>,
{
    type Scalar = Th::Scalar;
    type Rows = Cnd::Rows;
    type Cols = Cnd::Cols;

    const FLAGS: Flags = Cnd::FLAGS.intersect(Flags::ROW_MAJOR);
    const COST: usize = Cnd::COST + if Th::COST > El::COST { Th::COST } else { El::COST };

    #[inline]
    fn rows(&self) -> Cnd::Rows {
        self.cond.rows()
    }

    #[inline]
    fn cols(&self) -> Cnd::Cols {
        self.cond.cols()
    }

    #[inline(always)]
    fn coeff(&self, i: usize, j: usize) -> Th::Scalar {
        if self.cond.coeff(i, j).is_zero() {
            self.otherwise.coeff(i, j)
        } else {
            self.then.coeff(i, j)
        }
    }

    fn overlap(&self, dst: &Layout) -> Overlap {
        self.cond
            .overlap(dst)
            .max(self.then.overlap(dst))
            .max(self.otherwise.overlap(dst))
    }
}
