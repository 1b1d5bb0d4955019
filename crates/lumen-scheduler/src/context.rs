//! The handle a running task's body closure is given each step. Its only
//! job is collecting `spawn` requests issued *during* a step — the
//! scheduler itself is borrowed mutably while driving the closure, so a
//! nested `spawn` can't reach back into it directly; requests are queued
//! here and drained by the scheduler right after the step returns.

use crate::task::{TaskBody, TaskStep};

pub(crate) struct PendingSpawn {
    pub body: TaskBody,
}

/// Passed to a task's body on every step. Calling `spawn` from within a
/// running task allocates a new frame whose parent is the task currently
/// executing.
pub struct TaskContext<'a> {
    pending: &'a mut Vec<PendingSpawn>,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(pending: &'a mut Vec<PendingSpawn>) -> Self {
        Self { pending }
    }

    pub fn spawn(&mut self, body: impl FnMut(&mut TaskContext) -> TaskStep + 'static) {
        self.pending.push(PendingSpawn { body: Box::new(body) });
    }
}
