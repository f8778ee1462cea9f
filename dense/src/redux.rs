//! Full reductions of an expression to one value.
//!
//! Direct-access sources go to the strided kernel reductions. Other sources
//! are folded in packets when they support linear packet access, and
//! coefficient by coefficient in their preferred order otherwise.

use dense_kernel::Element;
use dense_traits::{Conj, Identity, Reducer, PACKET_LANES};

use crate::expr::{direct_operand, Expr};
use crate::traits::Flags;

/// Fold every coefficient of `src` with `reducer`.
pub fn redux<E, Rd>(src: &E, reducer: Rd) -> Rd::Output
where
    E: Expr,
    Rd: Reducer<E::Scalar>,
{
    let n = src.size();
    if n == 0 {
        return reducer.finish(None, 0);
    }
    if let Some((view, conj)) = direct_operand(src) {
        let lift = |x| Some(reducer.lift(x));
        let combine = |a: Option<Rd::Acc>, b: Option<Rd::Acc>| match (a, b) {
            (Some(a), Some(b)) => Some(reducer.combine(a, b)),
            (a, None) => a,
            (None, b) => b,
        };
        let acc = if conj {
            dense_kernel::reduce::<_, Conj, _>(view, lift, combine, None)
        } else {
            dense_kernel::reduce::<_, Identity, _>(view, lift, combine, None)
        };
        return reducer.finish(acc, n);
    }
    if E::FLAGS.contains(Flags::PACKET_ACCESS.union(Flags::LINEAR_ACCESS)) && n >= PACKET_LANES {
        return reducer.finish(Some(packet_fold(src, &reducer, n)), n);
    }
    let (rows, cols) = src.shape();
    let mut acc = None;
    let mut push = |x| {
        let x = reducer.lift(x);
        acc = Some(match acc {
            Some(a) => reducer.combine(a, x),
            None => x,
        });
    };
    if E::FLAGS.contains(Flags::ROW_MAJOR) {
        for i in 0..rows {
            for j in 0..cols {
                push(src.coeff(i, j));
            }
        }
    } else {
        for j in 0..cols {
            for i in 0..rows {
                push(src.coeff(i, j));
            }
        }
    }
    reducer.finish(acc, n)
}

/// Packet-wise fold over `n >= PACKET_LANES` linear coefficients.
fn packet_fold<E, Rd>(src: &E, reducer: &Rd, n: usize) -> Rd::Acc
where
    E: Expr,
    Rd: Reducer<E::Scalar>,
{
    let mut acc = reducer.lift_packet(src.packet_linear(0));
    let mut k = PACKET_LANES;
    while k + PACKET_LANES <= n {
        acc = reducer.combine_packet(acc, reducer.lift_packet(src.packet_linear(k)));
        k += PACKET_LANES;
    }
    let mut total = (1..PACKET_LANES).fold(acc.lane(0), |a, l| reducer.combine(a, acc.lane(l)));
    for k in k..n {
        total = reducer.combine(total, reducer.lift(src.coeff_linear(k)));
    }
    total
}

/// Sum of all coefficients, through the SIMD kernel for plain storage.
pub fn sum<E: Expr>(src: &E) -> E::Scalar
where
    E::Scalar: Element,
{
    match direct_operand(src) {
        Some((view, false)) => dense_kernel::sum(view),
        _ => redux(src, dense_traits::redux::SumRedux),
    }
}
