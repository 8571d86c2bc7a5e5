//! Bounded byte queue with two-phase locking
//!
//! Fixed-item-size circular buffer supporting concurrent producers and
//! consumers with the data copies performed outside the critical
//! section. An operation first reserves a slot under a short critical
//! section (adjusting `free`/`used` and bumping an in-flight lock
//! counter), then copies with interrupts enabled, then commits.
//!
//! On a single stack, overlapping operations nest: a writer that
//! preempts another writer finishes first. The first reserver therefore
//! commits last and publishes the whole in-flight batch at once, so a
//! reader can never observe a partially written slot, and items are
//! consumed in reservation order (FIFO of the successful calls).

use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};

use crate::assert::kernel_assert;
use crate::core::event::WaitList;
use crate::core::kernel::{self, KERNEL, SCHED};
use crate::critical::{critical_section, is_isr_context, CriticalSection};
use crate::error::{KernelError, KernelResult};
use crate::types::Tick;

/// Queue state; see [`Queue`] for the shareable wrapper
pub struct RawQueue {
    buf: *mut u8,
    buf_end: *mut u8,
    /// Read position
    head: *mut u8,
    /// Write position
    tail: *mut u8,
    item_size: usize,
    /// Slots available to writers
    free: usize,
    /// Items available to readers
    used: usize,
    /// Writes in flight (reserved, not yet published)
    w_lock: usize,
    /// Reads in flight
    r_lock: usize,
    /// Tasks waiting for data
    event_read: WaitList,
    /// Tasks waiting for space
    event_write: WaitList,
}

impl RawQueue {
    /// Create a new, uninitialized queue
    pub const fn new() -> Self {
        RawQueue {
            buf: ptr::null_mut(),
            buf_end: ptr::null_mut(),
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            item_size: 0,
            free: 0,
            used: 0,
            w_lock: 0,
            r_lock: 0,
            event_read: WaitList::new(),
            event_write: WaitList::new(),
        }
    }

    /// Initialize the queue over a caller-owned buffer
    ///
    /// # Safety
    /// `buf` must be valid for reads and writes of `length * item_size`
    /// bytes for as long as the queue is in use, and nothing else may
    /// touch it.
    pub unsafe fn init(&mut self, buf: *mut u8, length: usize, item_size: usize) {
        self.buf = buf;
        self.buf_end = unsafe { buf.add(length * item_size) };
        self.head = buf;
        self.tail = buf;
        self.item_size = item_size;
        self.free = length;
        self.used = 0;
        self.w_lock = 0;
        self.r_lock = 0;
        self.event_read.init();
        self.event_write.init();
    }

    #[inline]
    fn advance(&self, p: *mut u8) -> *mut u8 {
        let next = unsafe { p.add(self.item_size) };
        if next == self.buf_end {
            self.buf
        } else {
            next
        }
    }

    /// Write one item (non-blocking)
    ///
    /// `buf.len()` must equal the item size.
    pub fn write(&mut self, buf: &[u8]) -> KernelResult<()> {
        kernel_assert(buf.len() == self.item_size, "queue write buffer size mismatch");

        let slot;
        let my_lock;
        {
            let _cs = CriticalSection::enter();
            if self.free == 0 {
                return Err(KernelError::QueueFull);
            }
            // Reserve the tail slot
            slot = self.tail;
            self.tail = self.advance(self.tail);
            self.free -= 1;
            my_lock = self.w_lock;
            self.w_lock += 1;
            kernel::lock_sched();
        }

        // The reservation protects the slot; a writer that preempts this
        // copy completes before it resumes.
        unsafe { ptr::copy_nonoverlapping(buf.as_ptr(), slot, self.item_size) };

        critical_section(|cs| {
            if my_lock == 0 {
                // First reserver commits last: publish the batch
                self.used += self.w_lock;
                self.w_lock = 0;
            }
            unsafe { self.event_read.unblock_one(cs) };
        });
        kernel::unlock_sched();
        Ok(())
    }

    /// Read one item (non-blocking)
    ///
    /// `buf.len()` must equal the item size.
    pub fn read(&mut self, buf: &mut [u8]) -> KernelResult<()> {
        kernel_assert(buf.len() == self.item_size, "queue read buffer size mismatch");

        let slot;
        let my_lock;
        {
            let _cs = CriticalSection::enter();
            if self.used == 0 {
                return Err(KernelError::QueueEmpty);
            }
            // Reserve the head slot
            slot = self.head;
            self.head = self.advance(self.head);
            self.used -= 1;
            my_lock = self.r_lock;
            self.r_lock += 1;
            kernel::lock_sched();
        }

        unsafe { ptr::copy_nonoverlapping(slot, buf.as_mut_ptr(), self.item_size) };

        critical_section(|cs| {
            if my_lock == 0 {
                self.free += self.r_lock;
                self.r_lock = 0;
            }
            unsafe { self.event_write.unblock_one(cs) };
        });
        kernel::unlock_sched();
        Ok(())
    }

    /// Block the current task until the queue has data
    ///
    /// Re-checks the condition under the scheduler lock so a wakeup
    /// between the failed read and this call is not lost. With
    /// run-to-completion tasks the block takes effect when the task
    /// function returns; the woken task retries its read.
    pub fn pend_read(&mut self, ticks: Tick) -> KernelResult<()> {
        if ticks == 0 {
            return Ok(());
        }
        if is_isr_context() {
            return Err(KernelError::PendFromIsr);
        }
        if !KERNEL.is_initialized() {
            return Err(KernelError::NotInitialized);
        }

        kernel::lock_sched();
        let claimed = critical_section(|cs| {
            if self.used > 0 {
                return Ok(None);
            }
            let cur = NonNull::new(SCHED.borrow_mut(cs).current_task).ok_or(KernelError::NoCurrentTask)?;
            unsafe { self.event_read.pre_pend(cur) };
            Ok(Some(cur))
        });
        match claimed {
            Ok(Some(cur)) => {
                critical_section(|cs| unsafe { self.event_read.pend(cur, ticks, cs) });
            }
            Ok(None) => {}
            Err(e) => {
                kernel::unlock_sched();
                return Err(e);
            }
        }
        kernel::unlock_sched();
        Ok(())
    }

    /// Block the current task until the queue has space
    pub fn pend_write(&mut self, ticks: Tick) -> KernelResult<()> {
        if ticks == 0 {
            return Ok(());
        }
        if is_isr_context() {
            return Err(KernelError::PendFromIsr);
        }
        if !KERNEL.is_initialized() {
            return Err(KernelError::NotInitialized);
        }

        kernel::lock_sched();
        let claimed = critical_section(|cs| {
            if self.free > 0 {
                return Ok(None);
            }
            let cur = NonNull::new(SCHED.borrow_mut(cs).current_task).ok_or(KernelError::NoCurrentTask)?;
            unsafe { self.event_write.pre_pend(cur) };
            Ok(Some(cur))
        });
        match claimed {
            Ok(Some(cur)) => {
                critical_section(|cs| unsafe { self.event_write.pend(cur, ticks, cs) });
            }
            Ok(None) => {}
            Err(e) => {
                kernel::unlock_sched();
                return Err(e);
            }
        }
        kernel::unlock_sched();
        Ok(())
    }

    /// Read one item; on failure with `ticks != 0`, pend for data
    ///
    /// Returns the non-blocking result. Task bodies call this in a loop:
    /// a woken task is re-dispatched and retries.
    pub fn read_pend(&mut self, buf: &mut [u8], ticks: Tick) -> KernelResult<()> {
        match self.read(buf) {
            Ok(()) => Ok(()),
            Err(e) => {
                if ticks != 0 {
                    self.pend_read(ticks)?;
                }
                Err(e)
            }
        }
    }

    /// Write one item; on failure with `ticks != 0`, pend for space
    pub fn write_pend(&mut self, buf: &[u8], ticks: Tick) -> KernelResult<()> {
        match self.write(buf) {
            Ok(()) => Ok(()),
            Err(e) => {
                if ticks != 0 {
                    self.pend_write(ticks)?;
                }
                Err(e)
            }
        }
    }

    /// Items available to readers
    pub fn used(&self) -> usize {
        critical_section(|_cs| self.used)
    }

    /// Slots available to writers
    pub fn free(&self) -> usize {
        critical_section(|_cs| self.free)
    }

    /// Queue capacity in items
    ///
    /// Counts reserved in-flight slots too, so this is constant.
    pub fn length(&self) -> usize {
        critical_section(|_cs| self.used + self.free + self.w_lock + self.r_lock)
    }

    /// Item size in bytes
    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Check if no items are available
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Check if no slots are available
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }
}

impl Default for RawQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Safe Wrapper ============

/// Shareable queue handle for `static` placement
pub struct Queue {
    inner: UnsafeCell<RawQueue>,
}

unsafe impl Sync for Queue {}
unsafe impl Send for Queue {}

impl Queue {
    pub const fn new() -> Self {
        Queue {
            inner: UnsafeCell::new(RawQueue::new()),
        }
    }

    /// Initialize the queue over a caller-owned buffer
    ///
    /// The buffer length must be a nonzero multiple of `item_size`;
    /// violations trip the assertion hook.
    pub fn init(&self, buffer: &'static mut [u8], item_size: usize) {
        kernel_assert(item_size != 0, "queue item size must be nonzero");
        kernel_assert(!buffer.is_empty(), "queue buffer must not be empty");
        kernel_assert(
            buffer.len() % item_size == 0,
            "queue buffer length must be a multiple of the item size",
        );

        let length = buffer.len() / item_size;
        critical_section(|_cs| unsafe {
            (*self.inner.get()).init(buffer.as_mut_ptr(), length, item_size)
        });
    }

    pub fn write(&self, buf: &[u8]) -> KernelResult<()> {
        unsafe { (*self.inner.get()).write(buf) }
    }

    pub fn read(&self, buf: &mut [u8]) -> KernelResult<()> {
        unsafe { (*self.inner.get()).read(buf) }
    }

    pub fn write_pend(&self, buf: &[u8], ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).write_pend(buf, ticks) }
    }

    pub fn read_pend(&self, buf: &mut [u8], ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).read_pend(buf, ticks) }
    }

    pub fn pend_read(&self, ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).pend_read(ticks) }
    }

    pub fn pend_write(&self, ticks: Tick) -> KernelResult<()> {
        unsafe { (*self.inner.get()).pend_write(ticks) }
    }

    #[inline]
    pub fn used(&self) -> usize {
        unsafe { (*self.inner.get()).used() }
    }

    #[inline]
    pub fn free(&self) -> usize {
        unsafe { (*self.inner.get()).free() }
    }

    #[inline]
    pub fn length(&self) -> usize {
        unsafe { (*self.inner.get()).length() }
    }

    #[inline]
    pub fn item_size(&self) -> usize {
        unsafe { (*self.inner.get()).item_size() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        unsafe { (*self.inner.get()).is_empty() }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        unsafe { (*self.inner.get()).is_full() }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
