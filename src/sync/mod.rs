//! Synchronization primitives
//!
//! Contains the byte queue, mutex, and semaphore.

#[cfg(feature = "queue")]
pub mod queue;

#[cfg(feature = "mutex")]
pub mod mutex;

#[cfg(feature = "sem")]
pub mod sem;
