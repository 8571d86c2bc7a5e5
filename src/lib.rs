//! Single-stack run-to-completion RTOS kernel in Rust
//!
//! A small, portable real-time kernel providing:
//! - Priority-based cooperative or nested-preemptive scheduling of
//!   run-to-completion tasks over one hardware stack
//! - A periodic tick with per-task timeouts
//! - Synchronization primitives (byte queue, mutex, semaphore) that
//!   tasks may block on with timeout

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod sync;
pub mod port;

// ============ Re-exports ============

pub use core::assert;
pub use core::assert::{kernel_assert, set_assert_hook, AssertHook};
pub use core::config;
pub use core::config::*;
pub use core::critical;
pub use core::error;
pub use core::error::{KernelError, KernelResult};
#[cfg(any(feature = "queue", feature = "sem"))]
pub use core::event;
pub use core::kernel;
pub use core::kernel::{get_current_task, init, kernel_mode, sched_lock, sched_unlock, set_kernel_mode};
pub use core::list;
pub use core::prio;
pub use core::sched;
pub use core::sched::sched;
pub use core::task;
pub use core::task::{create_task, resume, suspend, Task};
pub use core::time;
pub use core::time::{delay, delay_ms, get_tick, tick_interrupt};
pub use core::types;
pub use core::types::*;

#[cfg(feature = "queue")]
pub use sync::queue;
#[cfg(feature = "queue")]
pub use sync::queue::Queue;
#[cfg(feature = "mutex")]
pub use sync::mutex;
#[cfg(feature = "mutex")]
pub use sync::mutex::Mutex;
#[cfg(feature = "sem")]
pub use sync::sem;
#[cfg(feature = "sem")]
pub use sync::sem::Semaphore;
