//! Compile-time and run-time matrix extents.
//!
//! A dimension is either [`Const<N>`], fixed in the type, or [`Dyn`], carried
//! as a value and set at construction or resize. Both implement [`Dim`];
//! generic code asks [`Dim::EXTENT`] instead of comparing against a sentinel.

use std::fmt::Debug;

/// Static description of one extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    Fixed(usize),
    Dynamic,
}

impl Extent {
    pub const fn is_fixed(self) -> bool {
        matches!(self, Extent::Fixed(_))
    }

    /// The fixed value, or `default` for a dynamic extent.
    pub const fn fixed_or(self, default: usize) -> usize {
        match self {
            Extent::Fixed(n) => n,
            Extent::Dynamic => default,
        }
    }

    pub const fn is_fixed_to(self, n: usize) -> bool {
        match self {
            Extent::Fixed(m) => m == n,
            Extent::Dynamic => false,
        }
    }
}

/// One matrix extent.
pub trait Dim: Copy + Debug + PartialEq + Send + Sync + 'static {
    const EXTENT: Extent;

    fn value(&self) -> usize;

    /// `None` if `n` conflicts with a fixed extent.
    fn try_from_usize(n: usize) -> Option<Self>;
}

/// Extent fixed at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Const<const N: usize>;

/// Extent chosen at run time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dyn(pub usize);

impl<const N: usize> Dim for Const<N> {
    const EXTENT: Extent = Extent::Fixed(N);

    #[inline(always)]
    fn value(&self) -> usize {
        N
    }

    #[inline]
    fn try_from_usize(n: usize) -> Option<Self> {
        (n == N).then_some(Const)
    }
}

impl Dim for Dyn {
    const EXTENT: Extent = Extent::Dynamic;

    #[inline(always)]
    fn value(&self) -> usize {
        self.0
    }

    #[inline]
    fn try_from_usize(n: usize) -> Option<Self> {
        Some(Dyn(n))
    }
}

/// Static compatibility of two extents.
///
/// Implemented only for pairs that may agree: two equal constants, a constant
/// and a dynamic extent, or two dynamic extents. Two different constants have
/// no impl, so combining them is a compile-time error. `Output` keeps the more
/// specific of the two.
pub trait SameDim<D: Dim>: Dim {
    type Output: Dim;

    /// Merge two run-time extents; `None` if they differ.
    fn same(self, other: D) -> Option<Self::Output>;

    /// Merge two extents already known to agree.
    fn merge(self, other: D) -> Self::Output;
}

impl<const N: usize> SameDim<Const<N>> for Const<N> {
    type Output = Const<N>;

    #[inline]
    fn same(self, _other: Const<N>) -> Option<Const<N>> {
        Some(Const)
    }

    #[inline(always)]
    fn merge(self, _other: Const<N>) -> Const<N> {
        Const
    }
}

impl<const N: usize> SameDim<Dyn> for Const<N> {
    type Output = Const<N>;

    #[inline]
    fn same(self, other: Dyn) -> Option<Const<N>> {
        Const::try_from_usize(other.0)
    }

    #[inline(always)]
    fn merge(self, _other: Dyn) -> Const<N> {
        Const
    }
}

impl<const N: usize> SameDim<Const<N>> for Dyn {
    type Output = Const<N>;

    #[inline]
    fn same(self, _other: Const<N>) -> Option<Const<N>> {
        Const::try_from_usize(self.0)
    }

    #[inline(always)]
    fn merge(self, _other: Const<N>) -> Const<N> {
        Const
    }
}

impl SameDim<Dyn> for Dyn {
    type Output = Dyn;

    #[inline]
    fn same(self, other: Dyn) -> Option<Dyn> {
        (self.0 == other.0).then_some(self)
    }

    #[inline(always)]
    fn merge(self, _other: Dyn) -> Dyn {
        self
    }
}

/// Dimension aliases for common fixed sizes.
pub type U1 = Const<1>;
pub type U2 = Const<2>;
pub type U3 = Const<3>;
pub type U4 = Const<4>;
