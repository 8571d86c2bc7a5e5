//! Global kernel state and initialization
//!
//! This module manages the global kernel state: the tick counter and
//! scheduler-lock nesting (lock-free atomics) and the scheduling
//! structures (critical-section protected).

use core::ptr::{self, NonNull};

use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::assert::kernel_assert;
use crate::config::{CFG_KERNEL_MODE, CFG_NUM_PRIORITIES, NO_TASK_PRIO};
use crate::core::list::List;
use crate::critical::{critical_section, is_isr_context, CriticalCell};
use crate::error::{KernelError, KernelResult};
use crate::prio::PrioTable;
use crate::task::Task;
use crate::types::{KernelMode, NestingCtr, Prio, Tick};

// ============ Kernel State Structures ============

/// Atomic kernel flags
pub struct KernelFlags {
    initialized: AtomicBool,
    tick_counter: AtomicU32,
    sched_lock_nesting: AtomicU8,
    mode: AtomicU8,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            tick_counter: AtomicU32::new(0),
            sched_lock_nesting: AtomicU8::new(0),
            mode: AtomicU8::new(KernelMode::Cooperative as u8),
        }
    }

    pub(crate) fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.tick_counter.store(0, Ordering::SeqCst);
        self.sched_lock_nesting.store(0, Ordering::SeqCst);
    }

    /// Check if the kernel is initialized
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Get current tick count
    #[inline(always)]
    pub fn tick_get(&self) -> Tick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    /// Get scheduler lock nesting level
    #[inline(always)]
    pub fn sched_lock_nesting(&self) -> NestingCtr {
        self.sched_lock_nesting.load(Ordering::SeqCst)
    }

    /// Get the scheduling mode
    #[inline(always)]
    pub fn mode(&self) -> KernelMode {
        match self.mode.load(Ordering::Relaxed) {
            0 => KernelMode::Cooperative,
            _ => KernelMode::Preemptive,
        }
    }

    /// Increment and return the tick count (wrapping)
    #[inline(always)]
    pub(crate) fn tick_increment(&self) -> Tick {
        self.tick_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Set initialized flag
    #[inline(always)]
    pub(crate) fn set_initialized(&self, val: bool) {
        self.initialized.store(val, Ordering::SeqCst);
    }

    /// Set the scheduling mode
    #[inline(always)]
    pub(crate) fn set_mode(&self, mode: KernelMode) {
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    /// Lock the scheduler
    pub(crate) fn try_sched_lock(&self) -> KernelResult<()> {
        let nesting = self.sched_lock_nesting.load(Ordering::SeqCst);
        if nesting == NestingCtr::MAX {
            return Err(KernelError::LockNestingOvf);
        }
        self.sched_lock_nesting.store(nesting + 1, Ordering::SeqCst);
        Ok(())
    }

    /// Unlock the scheduler, returning the remaining nesting level
    pub(crate) fn try_sched_unlock(&self) -> KernelResult<NestingCtr> {
        let nesting = self.sched_lock_nesting.load(Ordering::SeqCst);
        if nesting == 0 {
            return Err(KernelError::SchedNotLocked);
        }
        self.sched_lock_nesting.store(nesting - 1, Ordering::SeqCst);
        Ok(nesting - 1)
    }
}

/// Global kernel flags instance
pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

/// Scheduler state
///
/// The scheduler node of every task is on exactly one of these lists (or
/// detached while the task is mid-transition inside a critical section).
pub struct SchedState {
    pub(crate) prio_tbl: PrioTable,
    pub(crate) rdy_list: [List; CFG_NUM_PRIORITIES],
    pub(crate) suspended_list: List,
    /// Timed waits, sorted ascending by wake tick. Two lists: deadlines
    /// beyond the tick wrap point go to the overflow list, and the lists
    /// swap roles when the tick counter wraps.
    pub(crate) delayed_list: [List; 2],
    pub(crate) delayed_current: usize,
    pub(crate) current_task: *mut Task,
    pub(crate) current_prio: Prio,
}

impl SchedState {
    const fn new() -> Self {
        Self {
            prio_tbl: PrioTable::new(),
            rdy_list: [List::NEW; CFG_NUM_PRIORITIES],
            suspended_list: List::new(),
            delayed_list: [List::NEW; 2],
            delayed_current: 0,
            current_task: ptr::null_mut(),
            current_prio: NO_TASK_PRIO,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.prio_tbl.init();
        for list in self.rdy_list.iter_mut() {
            list.init();
        }
        self.suspended_list.init();
        for list in self.delayed_list.iter_mut() {
            list.init();
        }
        self.delayed_current = 0;
        self.current_task = ptr::null_mut();
        self.current_prio = NO_TASK_PRIO;
    }

    /// Insert a task's scheduler node into the proper delayed list,
    /// sorted ascending by wake tick.
    ///
    /// # Safety
    /// Caller must hold the critical section; the task's scheduler node
    /// must be detached.
    pub(crate) unsafe fn delayed_insert(&mut self, task: NonNull<Task>, wake: Tick) {
        let now = KERNEL.tick_get();
        let idx = if wake < now {
            // Deadline past the wrap point
            1 - self.delayed_current
        } else {
            self.delayed_current
        };

        let t = task.as_ptr();
        unsafe { (*t).wake_tick = wake };
        let node = NonNull::from(unsafe { &mut (*t).sched_node });

        let list = &mut self.delayed_list[idx];
        let mut cur = list.get_first();
        while let Some(c) = cur {
            let owner = unsafe { (*c.as_ptr()).owner() };
            if unsafe { (*owner).wake_tick } > wake {
                unsafe { list.insert_before(c.as_ptr(), node) };
                return;
            }
            cur = unsafe { list.next_of(c) };
        }
        unsafe { list.insert_last(node) };
    }
}

/// Global scheduler state instance
pub(crate) static SCHED: CriticalCell<SchedState> = CriticalCell::new(SchedState::new());

// ============ Public API ============

/// Initialize the kernel
///
/// Must be called before any other kernel function and before the tick
/// interrupt is enabled. Resets the tick counter, the ready/suspended/
/// delayed lists, and the scheduling mode.
pub fn init() {
    critical_section(|cs| {
        KERNEL.reset();
        SCHED.borrow_mut(cs).reset();
        KERNEL.set_mode(CFG_KERNEL_MODE);
        KERNEL.set_initialized(true);
    });
    crate::trace!("kernel initialized");
}

/// Get the currently running task, if any
pub fn get_current_task() -> Option<NonNull<Task>> {
    critical_section(|cs| NonNull::new(SCHED.borrow_mut(cs).current_task))
}

/// Get the active scheduling mode
pub fn kernel_mode() -> KernelMode {
    KERNEL.mode()
}

/// Override the build-time scheduling mode
///
/// Intended for host tests and board bring-up. Must be called before the
/// tick interrupt is enabled.
pub fn set_kernel_mode(mode: KernelMode) {
    KERNEL.set_mode(mode);
}

/// Lock the scheduler
///
/// While locked, [`crate::sched::sched`] switches no tasks; interrupts
/// stay enabled. Locks nest.
pub fn sched_lock() -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::NotInitialized);
    }

    if is_isr_context() {
        return Err(KernelError::SchedLockFromIsr);
    }

    critical_section(|_cs| KERNEL.try_sched_lock())
}

/// Unlock the scheduler
///
/// In preemptive mode, dropping the last nesting level invokes the
/// scheduler so that tasks made ready while locked get dispatched.
pub fn sched_unlock() -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::NotInitialized);
    }

    if is_isr_context() {
        return Err(KernelError::SchedLockFromIsr);
    }

    let remaining = critical_section(|_cs| KERNEL.try_sched_unlock())?;
    if remaining == 0 && KERNEL.mode() == KernelMode::Preemptive {
        crate::core::sched::sched();
    }
    Ok(())
}

// ============ Internal lock helpers ============

/// Scheduler lock for kernel-internal multi-step transitions.
pub(crate) fn lock_sched() {
    let r = critical_section(|_cs| KERNEL.try_sched_lock());
    kernel_assert(r.is_ok(), "scheduler lock nesting overflow");
}

/// Release the internal scheduler lock; runs the scheduler when the lock
/// drops to zero in preemptive mode.
pub(crate) fn unlock_sched() {
    match critical_section(|_cs| KERNEL.try_sched_unlock()) {
        Ok(0) => {
            if KERNEL.mode() == KernelMode::Preemptive {
                crate::core::sched::sched();
            }
        }
        Ok(_) => {}
        Err(_) => kernel_assert(false, "scheduler unlock without matching lock"),
    }
}
