//! Compile-time configuration
//!
//! These constants control the behavior and resource limits of the kernel.

use crate::types::{KernelMode, Prio, Tick};

/// Number of task priority levels
pub const CFG_NUM_PRIORITIES: usize = 8;

/// Lowest task priority
pub const LOW_PRIORITY: Prio = 0;

/// Highest task priority
pub const HIGH_PRIORITY: Prio = (CFG_NUM_PRIORITIES - 1) as Prio;

/// Scheduler priority when no task is running
pub const NO_TASK_PRIO: Prio = -1;

/// Timeout value that pends forever
pub const MAX_DELAY: Tick = Tick::MAX;

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Default scheduling mode
///
/// Cooperative unless the `preemptive` cargo feature is enabled. The mode
/// can be overridden at runtime with [`crate::kernel::set_kernel_mode`]
/// before the tick interrupt is enabled.
pub const CFG_KERNEL_MODE: KernelMode = if cfg!(feature = "preemptive") {
    KernelMode::Preemptive
} else {
    KernelMode::Cooperative
};
