//! Functors combining a destination coefficient with a source coefficient.

use crate::packet::Packet;
use crate::scalar::Scalar;

/// How a destination coefficient is updated; product kernels map this onto
/// their `alpha`/`beta` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    /// `dst = src`
    Replace,
    /// `dst += src`
    Add,
    /// `dst -= src`
    Sub,
}

impl AssignKind {
    /// Whether the old destination value takes part in the update.
    pub const fn reads_dst(self) -> bool {
        !matches!(self, AssignKind::Replace)
    }
}

pub trait AssignFunctor<T: Scalar>: Copy + Default {
    const KIND: AssignKind;

    fn assign(&self, dst: T, src: T) -> T;

    #[inline(always)]
    fn assign_packet(&self, dst: Packet<T>, src: Packet<T>) -> Packet<T> {
        dst.zip_with(src, |d, s| self.assign(d, s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignOp;

impl<T: Scalar> AssignFunctor<T> for AssignOp {
    const KIND: AssignKind = AssignKind::Replace;

    #[inline(always)]
    fn assign(&self, _dst: T, src: T) -> T {
        src
    }

    #[inline(always)]
    fn assign_packet(&self, _dst: Packet<T>, src: Packet<T>) -> Packet<T> {
        src
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddAssignOp;

impl<T: Scalar> AssignFunctor<T> for AddAssignOp {
    const KIND: AssignKind = AssignKind::Add;

    #[inline(always)]
    fn assign(&self, dst: T, src: T) -> T {
        dst + src
    }

    #[inline(always)]
    fn assign_packet(&self, dst: Packet<T>, src: Packet<T>) -> Packet<T> {
        dst + src
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubAssignOp;

impl<T: Scalar> AssignFunctor<T> for SubAssignOp {
    const KIND: AssignKind = AssignKind::Sub;

    #[inline(always)]
    fn assign(&self, dst: T, src: T) -> T {
        dst - src
    }

    #[inline(always)]
    fn assign_packet(&self, dst: Packet<T>, src: Packet<T>) -> Packet<T> {
        dst - src
    }
}
