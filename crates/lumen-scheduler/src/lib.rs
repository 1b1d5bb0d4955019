//! Cooperative task scheduler: a ready queue plus three wait-queues
//! (sleep / readable-fd / writable-fd), driven one yield at a time. The
//! bytecode VM that would actually execute instructions between yields
//! lives elsewhere — a task here is a plain Rust closure stepped forward by
//! [`Scheduler::run_once`], standing in for "resume where the last yield
//! left off."
//!
//! Module layout: [`task`] is the `CallFrame`/state/yield-value vocabulary,
//! [`context`] is the handle a running task uses to spawn children,
//! [`wait_queues`] are the sleep min-heap and the FIFO I/O queues, [`wake`]
//! is the `getTasks()` multiplexed-wait primitive, and [`error`] is the
//! scheduler's one error class.

mod context;
mod error;
mod task;
mod wait_queues;
mod wake;

use std::os::unix::io::RawFd;
use std::time::Instant;

pub use context::TaskContext;
pub use error::SchedulerError;
pub use task::{TaskId, TaskState, TaskStep, YieldValue, OP_SLEEP, OP_WAIT_IO_READ, OP_WAIT_IO_WRITE};
pub use wake::DEFAULT_QUANTUM_MS;

use context::PendingSpawn;
use task::CallFrame;
use wait_queues::{IoQueue, SleepQueue};

/// What one call to [`Scheduler::run_once`] accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A ready task was stepped.
    Ran,
    /// The ready queue was empty but `getTasks()` woke at least one waiter.
    Woke,
    /// The ready queue was empty and the 200ms multiplex-wait elapsed
    /// without waking anything; waiters remain pending.
    Blocked,
    /// Nothing is ready and no task is waiting on anything — the
    /// scheduler has no more work.
    Idle,
}

pub struct Scheduler {
    /// The multiplex-wait quantum (200ms by default), exposed as a
    /// constructor parameter rather than a hardcoded constant so callers
    /// can tune it for tests.
    quantum_ms: i32,
    frames: Vec<Option<CallFrame>>,
    ready: std::collections::VecDeque<TaskId>,
    sleepers: SleepQueue,
    readers: IoQueue,
    writers: IoQueue,
    current: Option<TaskId>,
    start: Instant,
    next_id: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTUM_MS)
    }
}

impl Scheduler {
    pub fn new(quantum_ms: i32) -> Self {
        Self {
            quantum_ms,
            frames: Vec::new(),
            ready: std::collections::VecDeque::new(),
            sleepers: SleepQueue::default(),
            readers: IoQueue::default(),
            writers: IoQueue::default(),
            current: None,
            start: Instant::now(),
            next_id: 0,
        }
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn frame(&self, id: TaskId) -> &CallFrame {
        self.frames[id.index()]
            .as_ref()
            .expect("TaskId outlived its frame — tasks are never removed before Done")
    }

    fn frame_mut(&mut self, id: TaskId) -> &mut CallFrame {
        self.frames[id.index()]
            .as_mut()
            .expect("TaskId outlived its frame — tasks are never removed before Done")
    }

    /// Top-level spawn with no parent task — the host driving the
    /// scheduler, not a running task, is the caller.
    pub fn spawn(&mut self, body: impl FnMut(&mut TaskContext) -> TaskStep + 'static) -> TaskId {
        self.spawn_task(None, 0, Box::new(body))
    }

    /// `index` is passed in rather than derived from `parent`'s current
    /// frame: a nested spawn's `index = parent.index + 1` is only actually
    /// inserted into `frames` *after* the parent's own step has already
    /// run — and a parent that just completed has had its frame slot
    /// cleared by then, so its index must be captured before that happens
    /// (see `run_step`).
    fn spawn_task(&mut self, parent: Option<TaskId>, index: usize, body: task::TaskBody) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.frames.push(Some(CallFrame {
            id,
            parent,
            index,
            state: TaskState::Spawned,
            stored: false,
            body,
        }));
        self.ready.push_back(id);
        log::debug!("spawned task {id:?} (parent {parent:?}, index {index})");
        id
    }

    pub fn task_state(&self, id: TaskId) -> TaskState {
        self.frame(id).state
    }

    /// Is there any task currently ready, waiting, or pending a wake?
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.sleepers.is_empty() && self.readers.is_empty() && self.writers.is_empty()
    }

    /// Run exactly one scheduling quantum: either step the next ready
    /// task, or — if none is ready — try to wake a waiter via
    /// `getTasks()`.
    pub fn run_once(&mut self) -> Result<RunOutcome, SchedulerError> {
        if let Some(id) = self.ready.pop_front() {
            self.run_step(id)?;
            return Ok(RunOutcome::Ran);
        }
        if self.sleepers.is_empty() && self.readers.is_empty() && self.writers.is_empty() {
            return Ok(RunOutcome::Idle);
        }
        if self.get_tasks()? {
            Ok(RunOutcome::Woke)
        } else {
            Ok(RunOutcome::Blocked)
        }
    }

    /// Drives the scheduler until every task is done and no waiter
    /// remains. Each iteration either makes progress or blocks for at
    /// most `quantum_ms`, so this terminates as soon as the last waiter
    /// resolves.
    pub fn run_until_idle(&mut self) -> Result<(), SchedulerError> {
        loop {
            match self.run_once()? {
                RunOutcome::Idle => return Ok(()),
                RunOutcome::Ran | RunOutcome::Woke | RunOutcome::Blocked => {}
            }
        }
    }

    fn run_step(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        self.frame_mut(id).state = TaskState::Running;
        self.current = Some(id);
        let child_index = self.frame(id).index + 1;

        let mut pending: Vec<PendingSpawn> = Vec::new();
        let step = {
            let mut ctx = TaskContext::new(&mut pending);
            (self.frame_mut(id).body)(&mut ctx)
        };

        match step {
            TaskStep::Done => {
                self.frames[id.index()] = None;
                log::debug!("task {id:?} done");
            }
            TaskStep::Yield(YieldValue::Continue) => {
                self.frame_mut(id).state = TaskState::Spawned;
                self.ready.push_back(id);
            }
            TaskStep::Yield(YieldValue::Sleep(seconds)) => {
                if seconds < 0.0 {
                    return Err(SchedulerError::NegativeSleep(id, seconds));
                }
                let deadline = self.now() + seconds;
                self.sleepers.push(id, deadline);
                self.frame_mut(id).state = TaskState::Suspended;
                log::trace!("task {id:?} sleeping until t+{seconds}s");
            }
            TaskStep::Yield(YieldValue::WaitIoRead(fd)) => {
                self.require_valid_fd(id, fd)?;
                self.readers.push(id, fd);
                self.frame_mut(id).state = TaskState::Suspended;
                log::trace!("task {id:?} waiting to read fd {fd}");
            }
            TaskStep::Yield(YieldValue::WaitIoWrite(fd)) => {
                self.require_valid_fd(id, fd)?;
                self.writers.push(id, fd);
                self.frame_mut(id).state = TaskState::Suspended;
                log::trace!("task {id:?} waiting to write fd {fd}");
            }
        }

        for spawn in pending {
            self.spawn_task(Some(id), child_index, spawn.body);
        }
        self.current = None;
        Ok(())
    }

    fn require_valid_fd(&self, id: TaskId, fd: RawFd) -> Result<(), SchedulerError> {
        if fd < 0 {
            Err(SchedulerError::InvalidFd(id, fd))
        } else {
            Ok(())
        }
    }

    /// Expire sleepers, multiplex-wait on pending fds for up to the
    /// configured quantum, then drain whichever fds came back ready.
    /// Returns whether anything was woken.
    fn get_tasks(&mut self) -> Result<bool, SchedulerError> {
        let now = self.now();
        let mut woke_any = false;

        for id in self.sleepers.drain_expired(now) {
            self.wake(id);
            woke_any = true;
        }

        if !self.readers.is_empty() || !self.writers.is_empty() {
            let outcome = wake::poll_fds(self.readers.fds(), self.writers.fds(), self.quantum_ms)?;
            for id in self.readers.drain_ready(&outcome.readable) {
                self.wake(id);
                woke_any = true;
            }
            for id in self.writers.drain_ready(&outcome.writable) {
                self.wake(id);
                woke_any = true;
            }
        }

        Ok(woke_any)
    }

    fn wake(&mut self, id: TaskId) {
        let frame = self.frame_mut(id);
        frame.stored = true;
        frame.state = TaskState::Spawned;
        self.ready.push_back(id);
        log::debug!("woke task {id:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn a_task_that_never_yields_runs_to_completion_in_one_step() {
        let mut sched = Scheduler::new(50);
        let ran = Rc::new(Cell::new(false));
        let ran_inner = ran.clone();
        sched.spawn(move |_ctx| {
            ran_inner.set(true);
            TaskStep::Done
        });
        sched.run_until_idle().unwrap();
        assert!(ran.get());
        assert!(sched.is_idle());
    }

    #[test]
    fn round_robin_continue_interleaves_two_tasks() {
        let mut sched = Scheduler::new(50);
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        let order_a = order.clone();
        let mut steps_a = 0;
        sched.spawn(move |_ctx| {
            steps_a += 1;
            order_a.borrow_mut().push(('a', steps_a));
            if steps_a < 2 {
                TaskStep::Yield(YieldValue::Continue)
            } else {
                TaskStep::Done
            }
        });

        let order_b = order.clone();
        let mut steps_b = 0;
        sched.spawn(move |_ctx| {
            steps_b += 1;
            order_b.borrow_mut().push(('b', steps_b));
            if steps_b < 2 {
                TaskStep::Yield(YieldValue::Continue)
            } else {
                TaskStep::Done
            }
        });

        sched.run_until_idle().unwrap();
        let trace = order.borrow();
        assert_eq!(*trace, vec![('a', 1), ('b', 1), ('a', 2), ('b', 2)]);
    }

    #[test]
    fn sleeping_task_resumes_with_stored_set() {
        let mut sched = Scheduler::new(20);
        let woke_with_stored = Rc::new(Cell::new(false));
        let inner = woke_with_stored.clone();

        let id = sched.spawn(move |_ctx| TaskStep::Yield(YieldValue::Sleep(0.01)));
        sched.run_once().unwrap(); // steps into Sleep
        assert_eq!(sched.task_state(id), TaskState::Suspended);

        std::thread::sleep(std::time::Duration::from_millis(20));
        sched.run_once().unwrap(); // getTasks() should wake it
        assert!(sched.frame(id).stored);
        let _ = inner;
    }

    #[test]
    fn negative_sleep_is_a_scheduler_error() {
        let mut sched = Scheduler::new(50);
        sched.spawn(|_ctx| TaskStep::Yield(YieldValue::Sleep(-1.0)));
        let err = sched.run_once().unwrap_err();
        assert!(matches!(err, SchedulerError::NegativeSleep(_, _)));
    }

    #[test]
    fn nested_spawn_links_parent_index() {
        let mut sched = Scheduler::new(50);
        sched.spawn(|ctx| {
            ctx.spawn(|_ctx| TaskStep::Done);
            TaskStep::Done
        });
        sched.run_once().unwrap(); // parent runs, queues the child spawn
        assert_eq!(sched.frame(TaskId(1)).index, 1);
        assert_eq!(sched.frame(TaskId(1)).parent, Some(TaskId(0)));
        sched.run_until_idle().unwrap();
        assert!(sched.is_idle());
    }
}
