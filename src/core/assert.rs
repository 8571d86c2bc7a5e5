//! Assertion hook
//!
//! Contract violations (bad task priority, malformed queue geometry) are
//! not recoverable in-kernel. They are routed through a host-supplied
//! hook that must not return; the default hook panics. Tests install a
//! hook of their own or catch the panic.

use crate::critical::CriticalCell;

/// Assertion hook type. Invoked on contract violation; must not return.
pub type AssertHook = fn(&'static str) -> !;

fn default_assert_hook(msg: &'static str) -> ! {
    panic!("kernel assertion failed: {}", msg);
}

static ASSERT_HOOK: CriticalCell<AssertHook> =
    CriticalCell::new(default_assert_hook as AssertHook);

/// Install the assertion hook.
pub fn set_assert_hook(hook: AssertHook) {
    ASSERT_HOOK.with(|h| *h = hook);
}

/// Check a kernel contract, invoking the assertion hook on violation.
#[inline]
pub fn kernel_assert(cond: bool, msg: &'static str) {
    if !cond {
        assert_failed(msg);
    }
}

fn assert_failed(msg: &'static str) -> ! {
    crate::error!("kernel assertion failed: {}", msg);
    let hook = ASSERT_HOOK.with(|h| *h);
    hook(msg)
}
