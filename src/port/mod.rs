//! Port layer - CPU-specific implementations
//!
//! Provides interrupt control and the system tick timer wiring. The
//! kernel itself never touches hardware directly; everything below goes
//! through this module.

#[cfg(target_arch = "arm")]
pub mod cortex_m;

#[cfg(target_arch = "arm")]
pub use self::cortex_m::*;

// Stub implementations for non-ARM targets (for testing)
#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use portable_atomic::{AtomicU32, Ordering};

    /// Simulated interrupt-disable depth, so critical sections nest the
    /// same way they do on hardware.
    static INT_DISABLE_DEPTH: AtomicU32 = AtomicU32::new(0);

    /// Check whether interrupts are enabled
    #[inline]
    pub fn interrupts_enabled() -> bool {
        INT_DISABLE_DEPTH.load(Ordering::SeqCst) == 0
    }

    /// Disable interrupts
    #[inline]
    pub fn interrupts_disable() {
        INT_DISABLE_DEPTH.fetch_add(1, Ordering::SeqCst);
    }

    /// Enable interrupts
    ///
    /// # Safety
    /// Must not be called while kernel state is mid-mutation; the
    /// critical-section guard calls this on drop.
    #[inline]
    pub unsafe fn interrupts_enable() {
        INT_DISABLE_DEPTH.store(0, Ordering::SeqCst);
    }

    /// No tick timer on the host; tests call
    /// [`crate::time::tick_interrupt`] directly.
    pub fn systick_init(_reload: u32) {}
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
