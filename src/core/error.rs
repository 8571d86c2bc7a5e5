//! Error types
//!
//! Uses Rust's Result pattern instead of C-style status codes. Resource
//! unavailability is an `Err` value the caller acts on; contract
//! violations go through the assertion hook instead (see
//! [`crate::assert`]).

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum KernelError {
    // ============ Kernel state errors ============
    /// Kernel not initialized
    NotInitialized,
    /// No task is currently running
    NoCurrentTask,

    // ============ Context errors ============
    /// Cannot pend from ISR context
    PendFromIsr,
    /// Cannot lock/unlock the scheduler from ISR context
    SchedLockFromIsr,

    // ============ Scheduler lock errors ============
    /// Scheduler lock nesting overflow
    LockNestingOvf,
    /// Scheduler is not locked
    SchedNotLocked,

    // ============ Queue errors ============
    /// Queue is full
    QueueFull,
    /// Queue is empty
    QueueEmpty,

    // ============ Mutex errors ============
    /// Mutex is already locked
    MutexLocked,
    /// Mutex is not locked
    MutexNotLocked,

    // ============ Semaphore errors ============
    /// Semaphore count is zero
    SemUnavailable,
    /// Semaphore count is at its maximum
    SemOverflow,
}

/// Result type alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
