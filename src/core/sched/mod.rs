//! Scheduler module
//!
//! Priority-based dispatch with round-robin rotation inside each
//! priority level. Every task runs to completion on the single kernel
//! stack: dispatch is a plain function call, and preemption (when
//! enabled) is a nested [`sched`] invocation that returns before the
//! interrupted task resumes.

use core::ptr::NonNull;

use crate::config::NO_TASK_PRIO;
use crate::core::kernel::{self, SchedState};
use crate::core::list::List;
use crate::critical::CriticalSection;
use crate::task::Task;
use crate::types::KernelMode;

/// Main scheduling point
///
/// Repeatedly selects the highest-priority ready task whose priority is
/// strictly greater than that of the task it interrupts (any task when
/// idle), rotates it to the back of its ready list, and calls its
/// function with interrupts enabled. Returns when no strictly
/// higher-priority work remains.
///
/// In cooperative mode a nested call returns immediately; new work runs
/// only after the current task completes. In preemptive mode nested
/// calls run higher-priority tasks on top of the current one. Does
/// nothing while the scheduler lock is held.
pub fn sched() {
    if !kernel::KERNEL.is_initialized() {
        return;
    }

    if kernel::KERNEL.sched_lock_nesting() > 0 {
        return;
    }

    loop {
        let func;
        let param;
        let prev_task;
        let prev_prio;

        {
            let cs = CriticalSection::enter();
            let sched = kernel::SCHED.borrow_mut(&cs);

            if kernel::KERNEL.mode() == KernelMode::Cooperative
                && sched.current_prio != NO_TASK_PRIO
            {
                return;
            }

            let Some(prio) = sched.prio_tbl.get_highest() else {
                return;
            };
            if prio <= sched.current_prio {
                return;
            }

            let Some(node) = sched.rdy_list[prio as usize].get_first() else {
                // Stale bitmap bit
                sched.prio_tbl.remove(prio);
                continue;
            };

            // Round-robin within the priority: the dispatched task moves
            // to the back of its ready list.
            unsafe {
                sched.rdy_list[prio as usize].remove(node);
                sched.rdy_list[prio as usize].insert_last(node);
            }

            let task = unsafe { (*node.as_ptr()).owner() };
            prev_task = sched.current_task;
            prev_prio = sched.current_prio;
            sched.current_task = task;
            sched.current_prio = prio;

            func = unsafe { (*task).func };
            param = unsafe { (*task).param };
        }

        // Interrupts are enabled while the task body runs.
        if let Some(f) = func {
            f(param);
        }

        {
            let cs = CriticalSection::enter();
            let sched = kernel::SCHED.borrow_mut(&cs);
            sched.current_task = prev_task;
            sched.current_prio = prev_prio;
        }
    }
}

/// Move a task onto its priority's ready list
///
/// Detaches the scheduler node from whatever list holds it first; a task
/// already on its ready list is left where it is.
///
/// # Safety
/// Caller must hold the critical section; `task` must be valid.
pub(crate) unsafe fn make_ready(sched: &mut SchedState, task: NonNull<Task>) {
    let t = task.as_ptr();
    let prio = unsafe { (*t).prio };
    let ready: *mut List = &mut sched.rdy_list[prio as usize];

    let node = unsafe { &mut (*t).sched_node };
    if node.list() == ready {
        return;
    }
    if node.is_attached() {
        unsafe { (*node.list()).remove(NonNull::from(&mut *node)) };
    }

    unsafe { sched.rdy_list[prio as usize].insert_last(NonNull::from(&mut (*t).sched_node)) };
    sched.prio_tbl.insert(prio);
}

/// Detach a task's scheduler node from whatever list holds it
///
/// Clears the priority bitmap bit when the last task leaves a ready
/// list.
///
/// # Safety
/// Caller must hold the critical section; `task` must be valid.
pub(crate) unsafe fn make_unready(sched: &mut SchedState, task: NonNull<Task>) {
    let t = task.as_ptr();
    let node = unsafe { &mut (*t).sched_node };
    if !node.is_attached() {
        return;
    }

    let list = node.list();
    unsafe { (*list).remove(NonNull::from(&mut *node)) };

    let prio = unsafe { (*t).prio };
    let ready: *mut List = &mut sched.rdy_list[prio as usize];
    if list == ready && sched.rdy_list[prio as usize].is_empty() {
        sched.prio_tbl.remove(prio);
    }
}
