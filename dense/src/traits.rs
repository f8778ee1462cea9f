//! Static per-expression metadata.
//!
//! Every expression type carries a [`Flags`] set, a per-coefficient cost and a
//! [`Nesting`] tag as associated constants of [`crate::Expr`]. Nothing here has
//! run-time state. The engine reads these constants, through
//! [`AccessorsLevel::from_flags`], to pick a traversal and to decide whether a
//! product operand is read in place.

use std::fmt;

/// Structural capabilities of an expression type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Coefficients are laid out (or best produced) row by row.
    pub const ROW_MAJOR: Flags = Flags(1 << 0);
    /// The coefficients are a strided view of memory, possibly read with a
    /// pending conjugation. [`crate::Expr::direct_conj`] returns `Some` for
    /// every value of a type with this flag.
    pub const DIRECT_ACCESS: Flags = Flags(1 << 1);
    /// Coefficients can be written through the expression.
    pub const LVALUE: Flags = Flags(1 << 2);
    /// `PACKET_LANES` consecutive coefficients can be produced at once.
    pub const PACKET_ACCESS: Flags = Flags(1 << 3);
    /// Coefficients can be addressed by one index in storage order.
    pub const LINEAR_ACCESS: Flags = Flags(1 << 4);
    /// Must be evaluated into a temporary before a parent reads it.
    pub const EVAL_BEFORE_NESTING: Flags = Flags(1 << 5);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    #[inline]
    pub const fn intersect(self, other: Flags) -> Flags {
        Flags(self.0 & other.0)
    }

    #[inline]
    pub const fn without(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    /// All bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// `self` with `other` added when `cond` holds.
    #[inline]
    pub const fn with_if(self, other: Flags, cond: bool) -> Flags {
        if cond {
            self.union(other)
        } else {
            self
        }
    }

    /// Toggle [`Flags::ROW_MAJOR`].
    #[inline]
    pub const fn flip_order(self) -> Flags {
        Flags(self.0 ^ Flags::ROW_MAJOR.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 6] = [
            (Flags::ROW_MAJOR, "ROW_MAJOR"),
            (Flags::DIRECT_ACCESS, "DIRECT_ACCESS"),
            (Flags::LVALUE, "LVALUE"),
            (Flags::PACKET_ACCESS, "PACKET_ACCESS"),
            (Flags::LINEAR_ACCESS, "LINEAR_ACCESS"),
            (Flags::EVAL_BEFORE_NESTING, "EVAL_BEFORE_NESTING"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// Which flavor of the coefficient access protocol a type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessorsLevel {
    /// Coefficients are computed on demand.
    ReadOnly,
    /// Coefficients can be written but have no stable address.
    Write,
    /// Read-only strided storage.
    Direct,
    /// Writable strided storage.
    DirectWrite,
}

impl AccessorsLevel {
    pub const fn from_flags(flags: Flags) -> AccessorsLevel {
        let direct = flags.contains(Flags::DIRECT_ACCESS);
        let lvalue = flags.contains(Flags::LVALUE);
        match (direct, lvalue) {
            (true, true) => AccessorsLevel::DirectWrite,
            (true, false) => AccessorsLevel::Direct,
            (false, true) => AccessorsLevel::Write,
            (false, false) => AccessorsLevel::ReadOnly,
        }
    }

    pub const fn is_direct(self) -> bool {
        matches!(self, AccessorsLevel::Direct | AccessorsLevel::DirectWrite)
    }
}

/// How a parent node holds this expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    /// The parent owns a copy of the node (temporaries, views).
    ByValue,
    /// The parent borrows it; the borrow checker keeps the referent alive.
    ByRef,
}
