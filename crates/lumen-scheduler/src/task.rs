//! `CallFrame`: an instruction pointer, a value-stack, a parent link, a
//! state tag, a stored-value slot for wake-up data, and an index. The
//! bytecode VM that would own an instruction pointer and value-stack lives
//! elsewhere, so a task's executable payload is a single Rust closure
//! driven one step at a time — the idiomatic stand-in for "resume where
//! the last yield left off" without a real coroutine/generator primitive
//! in stable Rust.

use std::os::unix::io::RawFd;

use crate::context::TaskContext;

/// Opaque task handle, stable for the task's lifetime. An index is never
/// reused once allocated, so this is a plain monotonic counter rather than
/// a generational/slot-map index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Spawned,
    Running,
    Suspended,
    Done,
}

/// What a task's step function hands back to the scheduler each time it's
/// driven: a plain round-robin continuation, one of the three blocking
/// waits, or completion.
pub enum YieldValue {
    /// Round-robin advance: re-enqueue and let the next ready task run.
    Continue,
    /// `op=SLEEP`: wait until at least `seconds` from now.
    Sleep(f64),
    /// `op=WAIT_IO_READ`: wait until `fd` is readable.
    WaitIoRead(RawFd),
    /// `op=WAIT_IO_WRITE`: wait until `fd` is writable.
    WaitIoWrite(RawFd),
}

/// Wire codes for the yield op: these integers are observable, and
/// downstream user code constructs them by literal. Kept as `u8`
/// constants rather than folded into `YieldValue`'s discriminants, since
/// the two are independently meaningful — `YieldValue` is this crate's
/// internal vocabulary, these are the bytes a caller is allowed to
/// depend on.
pub const OP_SLEEP: u8 = 1;
pub const OP_WAIT_IO_READ: u8 = 2;
pub const OP_WAIT_IO_WRITE: u8 = 4;

/// What a task body hands back from one call: either it yielded (see
/// [`YieldValue`]) or it ran to completion.
pub enum TaskStep {
    Yield(YieldValue),
    Done,
}

/// One task's closure body. Called once per scheduling quantum; returns
/// what it did (see [`TaskStep`]) and may ask to spawn children through
/// the [`TaskContext`] it's handed.
pub(crate) type TaskBody = Box<dyn FnMut(&mut TaskContext) -> TaskStep>;

pub(crate) struct CallFrame {
    pub id: TaskId,
    pub parent: Option<TaskId>,
    pub index: usize,
    pub state: TaskState,
    /// Set to `true` on every wake path (expired sleeper or ready fd);
    /// read and cleared by nothing in this layer — it's the hook a VM
    /// integration would use to push a wake-up value onto the task's
    /// value stack.
    pub stored: bool,
    pub body: TaskBody,
}
