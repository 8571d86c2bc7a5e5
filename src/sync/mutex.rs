//! Mutex implementation
//!
//! A non-recursive binary lock. Lock failure is reported to the caller,
//! which may retry, busy-wait, or pend on an event of its own; there is
//! no owner tracking and no priority inheritance.

use crate::critical::CriticalCell;
use crate::error::{KernelError, KernelResult};
use crate::types::NestingCtr;

/// Binary lock (0 = unlocked, 1 = locked)
pub struct Mutex {
    count: CriticalCell<NestingCtr>,
}

impl Mutex {
    /// Create a new, unlocked mutex
    pub const fn new() -> Self {
        Mutex {
            count: CriticalCell::new(0),
        }
    }

    /// Reset the mutex to unlocked
    pub fn init(&self) {
        self.count.with(|count| *count = 0);
    }

    /// Acquire the lock
    ///
    /// Fails with [`KernelError::MutexLocked`] if already locked;
    /// recursion is not allowed.
    pub fn lock(&self) -> KernelResult<()> {
        self.count.with(|count| {
            if *count != 0 {
                return Err(KernelError::MutexLocked);
            }
            *count = 1;
            Ok(())
        })
    }

    /// Release the lock
    ///
    /// Fails with [`KernelError::MutexNotLocked`] if not locked.
    pub fn unlock(&self) -> KernelResult<()> {
        self.count.with(|count| {
            if *count == 0 {
                return Err(KernelError::MutexNotLocked);
            }
            *count = 0;
            Ok(())
        })
    }

    /// Check if the mutex is locked
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.count.with(|count| *count != 0)
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}
