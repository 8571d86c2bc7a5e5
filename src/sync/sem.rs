//! Semaphore implementation
//!
//! Counting semaphores for task synchronization and resource counting.
//! `lock` takes a count, `unlock` gives one back and wakes the
//! longest-waiting task. A binary semaphore is `max == 1`.

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use crate::core::event::WaitList;
use crate::core::kernel::{self, KERNEL, SCHED};
use crate::critical::{critical_section, is_isr_context};
use crate::error::{KernelError, KernelResult};
use crate::types::{SemCtr, Tick};

/// Semaphore state; see [`Semaphore`] for the shareable wrapper
pub struct RawSemaphore {
    count: SemCtr,
    max: SemCtr,
    /// Tasks waiting for the count to rise
    event: WaitList,
}

impl RawSemaphore {
    /// Create a new semaphore with an initial count and a maximum
    pub const fn new(count: SemCtr, max: SemCtr) -> Self {
        RawSemaphore {
            count,
            max,
            event: WaitList::new(),
        }
    }

    /// Initialize/reset the semaphore
    pub fn init(&mut self, count: SemCtr, max: SemCtr) {
        critical_section(|_cs| {
            self.count = count;
            self.max = max;
            self.event.init();
        });
    }

    /// Take the semaphore (non-blocking)
    pub fn lock(&mut self) -> KernelResult<()> {
        critical_section(|_cs| {
            if self.count == 0 {
                return Err(KernelError::SemUnavailable);
            }
            self.count -= 1;
            Ok(())
        })
    }

    /// Give the semaphore, waking the longest-waiting task
    pub fn unlock(&mut self) -> KernelResult<()> {
        kernel::lock_sched();
        let result = critical_section(|cs| {
            if self.count == self.max {
                return Err(KernelError::SemOverflow);
            }
            self.count += 1;
            unsafe { self.event.unblock_one(cs) };
            Ok(())
        });
        kernel::unlock_sched();
        result
    }

    /// Block the current task until the count rises
    ///
    /// Re-checks the count under the scheduler lock so a give between
    /// the failed take and this call is not lost.
    pub fn pend_lock(&mut self, ticks: Tick) -> KernelResult<()> {
        if ticks == 0 {
            return Ok(());
        }
        if is_isr_context() {
            return Err(KernelError::PendFromIsr);
        }
        if !KERNEL.is_initialized() {
            return Err(KernelError::NotInitialized);
        }

        kernel::lock_sched();
        let claimed = critical_section(|cs| {
            if self.count > 0 {
                return Ok(None);
            }
            let cur = NonNull::new(SCHED.borrow_mut(cs).current_task).ok_or(KernelError::NoCurrentTask)?;
            unsafe { self.event.pre_pend(cur) };
            Ok(Some(cur))
        });
        match claimed {
            Ok(Some(cur)) => {
                critical_section(|cs| unsafe { self.event.pend(cur, ticks, cs) });
            }
            Ok(None) => {}
            Err(e) => {
                kernel::unlock_sched();
                return Err(e);
            }
        }
        kernel::unlock_sched();
        Ok(())
    }

    /// Take the semaphore; on failure with `ticks != 0`, pend
    ///
    /// Returns the non-blocking result; a woken task retries on its next
    /// dispatch.
    pub fn lock_pend(&mut self, ticks: Tick) -> KernelResult<()> {
        match self.lock() {
            Ok(()) => Ok(()),
            Err(e) => {
                if ticks != 0 {
                    self.pend_lock(ticks)?;
                }
                Err(e)
            }
        }
    }

    /// Get current count
    pub fn count(&self) -> SemCtr {
        critical_section(|_cs| self.count)
    }

    /// Get the maximum count
    #[inline]
    pub fn max(&self) -> SemCtr {
        self.max
    }
}

impl Default for RawSemaphore {
    fn default() -> Self {
        Self::new(0, SemCtr::MAX)
    }
}

// ============ Safe Wrapper ============

/// Shareable semaphore handle for `static` placement
pub struct Semaphore {
    inner: UnsafeCell<RawSemaphore>,
}

unsafe impl Sync for Semaphore {}
unsafe impl Send for Semaphore {}

impl Semaphore {
    pub const fn new(count: SemCtr, max: SemCtr) -> Self {
        Semaphore {
            inner: UnsafeCell::new(RawSemaphore::new(count, max)),
        }
    }

    pub fn init(&self, count: SemCtr, max: SemCtr) {
        unsafe { (*self.inner.get()).init(count, max) }
    }

    pub fn lock(&self) -> KernelResult<()> {
        unsafe { (*self.inner.get()).lock() }
    }

    pub fn unlock(&self) -> KernelResult<()> {
        unsafe { (*self.inner.get()).unlock() }
    }

    pub fn lock_pend(&self, ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).lock_pend(ticks) }
    }

    pub fn pend_lock(&self, ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).pend_lock(ticks) }
    }

    #[inline]
    pub fn count(&self) -> SemCtr {
        unsafe { (*self.inner.get()).count() }
    }

    #[inline]
    pub fn max(&self) -> SemCtr {
        unsafe { (*self.inner.get()).max() }
    }
}
