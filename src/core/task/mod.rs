//! Task management module
//!
//! Provides task creation, suspension, and resumption. Tasks are never
//! destroyed; a task that should stop running suspends itself or pends
//! forever.

mod tcb;

pub use tcb::Task;

use core::ptr::NonNull;

use crate::assert::kernel_assert;
use crate::config::{HIGH_PRIORITY, LOW_PRIORITY};
use crate::core::kernel::{self, KERNEL, SCHED};
use crate::core::sched::{make_ready, make_unready};
use crate::critical::critical_section;
use crate::error::{KernelError, KernelResult};
use crate::types::{Prio, TaskFn};

/// Create a new task and append it to its priority's ready list
///
/// The record must be a `'static` task not currently known to the
/// kernel. A priority outside `[LOW_PRIORITY, HIGH_PRIORITY]` is a
/// contract violation and trips the assertion hook.
///
/// Safe from any context, including a task body or an ISR.
///
/// # Example
/// ```ignore
/// static mut WORKER: Task = Task::new();
///
/// fn worker(_: *mut ()) {
///     // poll, then pend/delay/suspend before returning
/// }
///
/// // In main, after init():
/// create_task(2, unsafe { &mut *addr_of_mut!(WORKER) }, worker, core::ptr::null_mut());
/// ```
pub fn create_task(prio: Prio, task: &'static mut Task, func: TaskFn, param: *mut ()) {
    kernel_assert(KERNEL.is_initialized(), "create_task before kernel init");
    kernel_assert(
        prio >= LOW_PRIORITY && prio <= HIGH_PRIORITY,
        "task priority out of range",
    );

    kernel::lock_sched();
    critical_section(|cs| {
        task.init();
        task.func = Some(func);
        task.param = param;
        task.prio = prio;

        let sched = SCHED.borrow_mut(cs);
        unsafe { make_ready(sched, NonNull::from(&mut *task)) };
    });
    crate::trace!("task created at priority {}", prio);
    kernel::unlock_sched();
}

/// Suspend a task (`None` = the current task)
///
/// The task moves to the suspended list and will not be dispatched until
/// [`resume`]d or woken by an event it was pending on. Suspending the
/// current task takes effect when its function returns; the kernel never
/// unwinds a running task.
pub fn suspend(task: Option<NonNull<Task>>) -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::NotInitialized);
    }

    critical_section(|cs| {
        let sched = SCHED.borrow_mut(cs);
        let t = match task {
            Some(t) => t,
            None => NonNull::new(sched.current_task).ok_or(KernelError::NoCurrentTask)?,
        };

        unsafe {
            make_unready(sched, t);
            sched
                .suspended_list
                .insert_last(NonNull::from(&mut (*t.as_ptr()).sched_node));
        }
        Ok(())
    })
}

/// Resume a task
///
/// If the task is not already on its priority's ready list it is moved
/// there at the tail. A pending task stops waiting: its event node is
/// detached and its timeout cancelled.
pub fn resume(task: NonNull<Task>) -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::NotInitialized);
    }

    kernel::lock_sched();
    critical_section(|cs| {
        let t = task.as_ptr();

        let ev = unsafe { &mut (*t).event_node };
        if ev.is_attached() {
            unsafe { (*ev.list()).remove(NonNull::from(&mut *ev)) };
        }

        let sched = SCHED.borrow_mut(cs);
        unsafe { make_ready(sched, task) };
    });
    kernel::unlock_sched();
    Ok(())
}
