//! Event wait lists
//!
//! A blocking primitive parks tasks on a [`WaitList`] until the event
//! fires or a timeout expires. Blocking is split into two steps so the
//! caller can re-check its wait condition with interrupts briefly
//! re-enabled without losing a wakeup:
//!
//! 1. [`WaitList::pre_pend`] claims the wake slot by enqueueing the
//!    task's event node (FIFO).
//! 2. [`WaitList::pend`] commits the block: it records the wake
//!    deadline and takes the task off its ready list. If the event fired
//!    in between, the event node is already gone and the task stays
//!    ready.
//!
//! Waking is always one task per call; the producer decides how many
//! wakes its action is worth.

use core::ptr::NonNull;

use crate::config::MAX_DELAY;
use crate::core::kernel::{KERNEL, SCHED};
use crate::core::list::List;
use crate::core::sched::{make_ready, make_unready};
use crate::critical::CriticalSection;
use crate::task::Task;
use crate::types::Tick;

/// FIFO list of tasks blocked on one event
pub struct WaitList {
    list: List,
}

impl WaitList {
    /// Create a new, uninitialized wait list
    pub const fn new() -> Self {
        WaitList { list: List::new() }
    }

    /// Initialize/reset the wait list
    pub fn init(&mut self) {
        self.list.init();
    }

    /// Check if any task is waiting
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Claim a wake slot: enqueue the task's event node at the tail
    ///
    /// Detaches the node from any prior wait list first.
    ///
    /// # Safety
    /// Caller must hold the critical section and the scheduler lock;
    /// `task` must be valid.
    pub(crate) unsafe fn pre_pend(&mut self, task: NonNull<Task>) {
        let t = task.as_ptr();
        let ev = unsafe { &mut (*t).event_node };
        if ev.is_attached() {
            unsafe { (*ev.list()).remove(NonNull::from(&mut *ev)) };
        }
        unsafe { self.list.insert_last(NonNull::from(&mut *ev)) };
    }

    /// Commit the block started by [`WaitList::pre_pend`]
    ///
    /// If the event node is no longer on this list the event already
    /// fired and the task stays ready. Otherwise the task leaves its
    /// ready list and, unless `ticks` is [`MAX_DELAY`], its wake
    /// deadline is set to `tick + ticks`.
    ///
    /// The current task keeps executing until its function returns; it
    /// is only skipped by subsequent scheduling passes.
    ///
    /// # Safety
    /// Caller must hold the scheduler lock; `task` must be valid.
    pub(crate) unsafe fn pend(&mut self, task: NonNull<Task>, ticks: Tick, cs: &CriticalSection) {
        let t = task.as_ptr();
        let target: *mut List = &mut self.list;
        if unsafe { (*t).event_node.list() } != target {
            return;
        }

        let sched = SCHED.borrow_mut(cs);
        unsafe { make_unready(sched, task) };

        if ticks == MAX_DELAY {
            unsafe { sched.suspended_list.insert_last(NonNull::from(&mut (*t).sched_node)) };
        } else {
            let wake = KERNEL.tick_get().wrapping_add(ticks);
            unsafe { sched.delayed_insert(task, wake) };
        }
    }

    /// Wake the longest-waiting task, if any
    ///
    /// Removes the head event node, cancels the task's timeout, and
    /// moves it to its priority's ready list. A task already on its
    /// ready list (woken between pre-pend and pend) is left alone.
    ///
    /// # Safety
    /// Caller must hold the critical section and the scheduler lock.
    pub(crate) unsafe fn unblock_one(&mut self, cs: &CriticalSection) {
        let Some(node) = self.list.get_first() else {
            return;
        };
        unsafe { self.list.remove(node) };

        let owner = unsafe { (*node.as_ptr()).owner() };
        if let Some(task) = NonNull::new(owner) {
            let sched = SCHED.borrow_mut(cs);
            unsafe { make_ready(sched, task) };
        }
    }
}

// SAFETY: wait lists are only touched within critical sections
unsafe impl Send for WaitList {}
unsafe impl Sync for WaitList {}
