//! Cortex-M port implementation
//!
//! Interrupt control via PRIMASK and the SysTick timer as the kernel
//! tick source. There is no context-switch machinery here: the kernel
//! runs every task on the one hardware stack.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::register::primask;

/// Check whether interrupts are enabled
#[inline(always)]
pub fn interrupts_enabled() -> bool {
    primask::read().is_active()
}

/// Disable interrupts
#[inline(always)]
pub fn interrupts_disable() {
    cortex_m::interrupt::disable();
}

/// Enable interrupts
///
/// # Safety
/// Must not be called inside a critical section except by the
/// critical-section guard itself when it restores the saved state.
#[inline(always)]
pub unsafe fn interrupts_enable() {
    unsafe { cortex_m::interrupt::enable() }
}

/// Initialize SysTick for tick generation
///
/// # Arguments
/// * `reload` - Core clock cycles per tick
///
/// # Example
/// For a 16MHz clock with a 1000Hz tick rate: reload = 16_000_000 / 1000
pub fn systick_init(reload: u32) {
    let mut p = unsafe { cortex_m::Peripherals::steal() };

    p.SYST.set_reload(reload - 1);
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// SysTick interrupt handler
#[no_mangle]
pub extern "C" fn SysTick() {
    crate::time::tick_interrupt();
}
