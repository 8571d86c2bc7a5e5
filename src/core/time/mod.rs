//! Time management module
//!
//! Tick handling, task delays, and timeout expiry.

use core::ptr::NonNull;

use crate::config::{CFG_TICK_RATE_HZ, MAX_DELAY};
use crate::core::kernel::{self, SchedState, KERNEL, SCHED};
use crate::core::sched::{make_ready, make_unready};
use crate::critical::{critical_section, is_isr_context};
use crate::error::{KernelError, KernelResult};
use crate::task::Task;
use crate::types::Tick;

/// Get current tick count
#[inline]
pub fn get_tick() -> Tick {
    KERNEL.tick_get()
}

/// Delay the current task
///
/// The task's scheduler node moves to the delayed list until
/// `tick + ticks`; with [`MAX_DELAY`] it parks on the suspended list
/// until resumed. Run-to-completion semantics: the call returns
/// immediately and the delay takes effect when the task function
/// returns.
pub fn delay(ticks: Tick) -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::NotInitialized);
    }

    if is_isr_context() {
        return Err(KernelError::PendFromIsr);
    }

    if ticks == 0 {
        return Ok(());
    }

    critical_section(|cs| {
        let sched = SCHED.borrow_mut(cs);
        let cur = NonNull::new(sched.current_task).ok_or(KernelError::NoCurrentTask)?;

        unsafe { make_unready(sched, cur) };

        if ticks == MAX_DELAY {
            unsafe {
                sched
                    .suspended_list
                    .insert_last(NonNull::from(&mut (*cur.as_ptr()).sched_node));
            }
        } else {
            let wake = KERNEL.tick_get().wrapping_add(ticks);
            unsafe { sched.delayed_insert(cur, wake) };
        }
        Ok(())
    })
}

/// Delay the current task by milliseconds
///
/// Rounds down to whole ticks; a nonzero `ms` shorter than one tick
/// still delays one tick.
pub fn delay_ms(ms: u32) -> KernelResult<()> {
    let ticks = ((ms as u64 * CFG_TICK_RATE_HZ as u64) / 1000) as Tick;
    if ms != 0 && ticks == 0 {
        return delay(1);
    }
    delay(ticks)
}

/// Tick handler
///
/// Called from the timer ISR (or directly by host tests). Advances the
/// tick and moves every task whose timeout expired back to its ready
/// list; a task still on a wait list leaves it, so the retry of its
/// blocked operation reports the timeout. In preemptive mode the
/// scheduler runs before this returns, so woken higher-priority tasks
/// complete before the interrupted task resumes.
pub fn tick_interrupt() {
    if !KERNEL.is_initialized() {
        return;
    }

    kernel::lock_sched();
    critical_section(|cs| {
        let sched = SCHED.borrow_mut(cs);
        let tick = KERNEL.tick_increment();

        if tick == 0 {
            // Tick wrapped: the overflow list becomes current. Anything
            // left on the old current list expired at the wrap boundary
            // and is drained below before the swap takes effect.
            let old = sched.delayed_current;
            while let Some(node) = sched.delayed_list[old].get_first() {
                let owner = unsafe { (*node.as_ptr()).owner() };
                wake_expired(sched, owner);
            }
            sched.delayed_current = 1 - old;
        }

        loop {
            let idx = sched.delayed_current;
            let Some(node) = sched.delayed_list[idx].get_first() else {
                break;
            };
            let owner = unsafe { (*node.as_ptr()).owner() };
            if unsafe { (*owner).wake_tick } > tick {
                break;
            }
            wake_expired(sched, owner);
        }
    });
    kernel::unlock_sched();
}

/// Timeout expiry: detach the task from any wait list and make it ready.
///
/// A task already woken by its event has left the delayed list and is
/// never seen here, so an event wake wins over a same-tick deadline.
fn wake_expired(sched: &mut SchedState, owner: *mut Task) {
    let ev = unsafe { &mut (*owner).event_node };
    if ev.is_attached() {
        unsafe { (*ev.list()).remove(NonNull::from(&mut *ev)) };
    }
    if let Some(task) = NonNull::new(owner) {
        unsafe { make_ready(sched, task) };
    }
}
