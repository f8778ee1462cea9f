//! Configurable logical bounds and shape checks.
//!
//! Memory safety never depends on this setting: every view access is guarded
//! against leaving its backing storage. The policy decides whether an index
//! that lies outside `[0, rows) x [0, cols)` but still inside the buffer is
//! reported, which otherwise silently reads a neighbouring coefficient.

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::{DenseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CheckPolicy {
    /// Check in every build profile.
    Always = 0,
    /// Check only when `debug_assertions` are enabled.
    DebugOnly = 1,
    /// Never check logical indices.
    Never = 2,
}

impl CheckPolicy {
    fn from_u8(v: u8) -> CheckPolicy {
        match v {
            0 => CheckPolicy::Always,
            2 => CheckPolicy::Never,
            _ => CheckPolicy::DebugOnly,
        }
    }

    #[inline]
    pub fn is_active(self) -> bool {
        match self {
            CheckPolicy::Always => true,
            CheckPolicy::DebugOnly => cfg!(debug_assertions),
            CheckPolicy::Never => false,
        }
    }
}

static GLOBAL_POLICY: AtomicU8 = AtomicU8::new(CheckPolicy::DebugOnly as u8);

thread_local! {
    static SCOPED_POLICY: Cell<Option<CheckPolicy>> = const { Cell::new(None) };
}

/// The policy in effect on this thread.
pub fn check_policy() -> CheckPolicy {
    SCOPED_POLICY
        .with(Cell::get)
        .unwrap_or_else(|| CheckPolicy::from_u8(GLOBAL_POLICY.load(Ordering::Relaxed)))
}

/// Set the process-wide policy; returns the previous one.
pub fn set_check_policy(policy: CheckPolicy) -> CheckPolicy {
    CheckPolicy::from_u8(GLOBAL_POLICY.swap(policy as u8, Ordering::Relaxed))
}

/// Run `f` with `policy` overriding the process-wide setting on this thread.
pub fn with_check_policy<R>(policy: CheckPolicy, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<CheckPolicy>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let prev = self.0;
            SCOPED_POLICY.with(|p| p.set(prev));
        }
    }
    let _restore = Restore(SCOPED_POLICY.with(|p| p.replace(Some(policy))));
    f()
}

#[inline]
pub fn should_check() -> bool {
    check_policy().is_active()
}

/// Always-on index check.
#[inline]
pub fn check_index(row: usize, col: usize, rows: usize, cols: usize) -> Result<()> {
    if row < rows && col < cols {
        Ok(())
    } else {
        Err(DenseError::IndexOutOfBounds {
            row,
            col,
            rows,
            cols,
        })
    }
}

/// Index check governed by the current policy; panics on violation.
#[inline(always)]
#[track_caller]
pub fn assert_index(row: usize, col: usize, rows: usize, cols: usize) {
    if should_check() {
        if let Err(e) = check_index(row, col, rows, cols) {
            index_fault(e);
        }
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn index_fault(e: DenseError) -> ! {
    panic!("{e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_override_restores() {
        let outer = check_policy();
        with_check_policy(CheckPolicy::Never, || {
            assert_eq!(check_policy(), CheckPolicy::Never);
            assert!(!should_check());
            with_check_policy(CheckPolicy::Always, || assert!(should_check()));
            assert_eq!(check_policy(), CheckPolicy::Never);
        });
        assert_eq!(check_policy(), outer);
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(1, 2, 2, 3).is_ok());
        assert!(matches!(
            check_index(2, 0, 2, 3),
            Err(DenseError::IndexOutOfBounds { row: 2, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_assert_index_always() {
        with_check_policy(CheckPolicy::Always, || assert_index(0, 3, 3, 3));
    }

    #[test]
    fn test_assert_index_never() {
        with_check_policy(CheckPolicy::Never, || assert_index(9, 9, 3, 3));
    }

    /// Column-major read of a `rows x cols` matrix guarded by the policy.
    fn read(data: &[i32], rows: usize, cols: usize, i: usize, j: usize) -> i32 {
        assert_index(i, j, rows, cols);
        data[j * rows + i]
    }

    #[test]
    fn test_never_reads_neighbouring_coefficient() {
        let data = [0, 1, 2, 10, 11, 12];
        // row 3 of a 3 x 2 matrix lands on (0, 1)
        let got = with_check_policy(CheckPolicy::Never, || read(&data, 3, 2, 3, 0));
        assert_eq!(got, 10);
        let checked = std::panic::catch_unwind(|| {
            with_check_policy(CheckPolicy::Always, || read(&data, 3, 2, 3, 0))
        });
        assert!(checked.is_err());
    }

    #[test]
    fn test_scope_wins_over_global() {
        let prev = set_check_policy(CheckPolicy::Always);
        assert_eq!(check_policy(), CheckPolicy::Always);
        let skipped = with_check_policy(CheckPolicy::Never, || {
            assert!(!should_check());
            assert_index(5, 5, 1, 1);
            true
        });
        assert!(skipped);
        assert!(should_check());
        assert_eq!(set_check_policy(prev), CheckPolicy::Always);
    }

    #[test]
    fn test_scope_restored_after_panic() {
        let before = SCOPED_POLICY.with(Cell::get);
        let result = std::panic::catch_unwind(|| {
            with_check_policy(CheckPolicy::Never, || panic!("inside scope"));
        });
        assert!(result.is_err());
        assert_eq!(SCOPED_POLICY.with(Cell::get), before);
    }
}
