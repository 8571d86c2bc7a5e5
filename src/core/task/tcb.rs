//! Task record definition
//!
//! There is no per-task stack: the task record is a function pointer, a
//! parameter, a priority, and the two intrusive nodes the kernel parks
//! the task on. The scheduler node lives on a ready, suspended, or
//! delayed list; the event node on at most one wait list.

use core::ptr;

use crate::core::list::Node;
use crate::types::{Prio, TaskFn, Tick};

/// Task record
pub struct Task {
    /// Task function, run to completion on each dispatch
    pub(crate) func: Option<TaskFn>,
    /// Opaque parameter passed to the task function
    pub(crate) param: *mut (),
    /// Task priority
    pub(crate) prio: Prio,
    /// Absolute tick at which a timed wait expires
    pub(crate) wake_tick: Tick,
    /// Node for the ready/suspended/delayed lists
    pub(crate) sched_node: Node,
    /// Node for event wait lists
    pub(crate) event_node: Node,
}

impl Task {
    /// Create a new, uninitialized task record
    pub const fn new() -> Self {
        Task {
            func: None,
            param: ptr::null_mut(),
            prio: 0,
            wake_tick: 0,
            sched_node: Node::new(),
            event_node: Node::new(),
        }
    }

    /// Reset the record to default values
    pub(crate) fn init(&mut self) {
        *self = Self::new();
        let this: *mut Task = self;
        self.sched_node.set_owner(this);
        self.event_node.set_owner(this);
    }

    /// Get the task priority
    #[inline]
    pub fn priority(&self) -> Prio {
        self.prio
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Task {}
unsafe impl Sync for Task {}
