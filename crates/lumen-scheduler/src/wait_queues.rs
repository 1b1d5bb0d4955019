//! The three wait-queues: sleepers, readable-fd waiters, writable-fd
//! waiters. Sleepers are a deadline-ordered min-heap rather than a linear
//! scan; the I/O queues stay plain FIFO vecs since fairness only matters
//! among sleepers and a linear scan over pending fds is exactly what the
//! multiplexed wait syscall needs built anyway.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::os::unix::io::RawFd;

use crate::task::TaskId;

/// One pending sleeper, ordered by `(deadline, insertion_seq)` so a
/// `BinaryHeap` (a max-heap) used with `Reverse` behaves as a min-heap that
/// also breaks deadline ties in insertion order: sleepers with identical
/// deadlines wake in the order they were queued.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SleepEntry {
    deadline: f64,
    seq: u64,
    task: TaskId,
}

impl Eq for SleepEntry {}

impl Ord for SleepEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for SleepEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub(crate) struct SleepQueue {
    heap: BinaryHeap<std::cmp::Reverse<SleepEntry>>,
    next_seq: u64,
}

impl SleepQueue {
    pub fn push(&mut self, task: TaskId, deadline: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(std::cmp::Reverse(SleepEntry { deadline, seq, task }));
    }

    pub fn peek_deadline(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.0.deadline)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pops every sleeper whose deadline has passed `now`, in wake order.
    pub fn drain_expired(&mut self, now: f64) -> Vec<TaskId> {
        let mut woken = Vec::new();
        while let Some(std::cmp::Reverse(entry)) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            let std::cmp::Reverse(entry) = self.heap.pop().expect("just peeked Some");
            woken.push(entry.task);
        }
        woken
    }
}

/// Readers/writers plus their fd vectors, collapsed into one FIFO
/// structure per queue — a task only ever waits on one fd at a time, so
/// pairing task and fd together is simpler than parallel arrays.
#[derive(Default)]
pub(crate) struct IoQueue {
    entries: std::collections::VecDeque<(TaskId, RawFd)>,
}

impl IoQueue {
    pub fn push(&mut self, task: TaskId, fd: RawFd) {
        self.entries.push_back((task, fd));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.entries.iter().map(|(_, fd)| *fd)
    }

    /// Removes and returns every entry whose fd is in `ready_fds`, in FIFO
    /// order relative to each other.
    pub fn drain_ready(&mut self, ready_fds: &[RawFd]) -> Vec<TaskId> {
        let mut woken = Vec::new();
        self.entries.retain(|(task, fd)| {
            if ready_fds.contains(fd) {
                woken.push(*task);
                false
            } else {
                true
            }
        });
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> TaskId {
        TaskId(n)
    }

    #[test]
    fn sleepers_wake_in_deadline_order() {
        let mut q = SleepQueue::default();
        q.push(id(1), 5.0);
        q.push(id(2), 1.0);
        q.push(id(3), 3.0);
        assert_eq!(q.drain_expired(10.0), vec![id(2), id(3), id(1)]);
    }

    #[test]
    fn sleepers_with_equal_deadlines_wake_in_insertion_order() {
        let mut q = SleepQueue::default();
        q.push(id(1), 2.0);
        q.push(id(2), 2.0);
        q.push(id(3), 2.0);
        assert_eq!(q.drain_expired(2.0), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn drain_expired_leaves_future_sleepers_queued() {
        let mut q = SleepQueue::default();
        q.push(id(1), 1.0);
        q.push(id(2), 100.0);
        assert_eq!(q.drain_expired(1.0), vec![id(1)]);
        assert!(!q.is_empty());
        assert_eq!(q.peek_deadline(), Some(100.0));
    }

    #[test]
    fn io_queue_drains_only_ready_fds() {
        let mut q = IoQueue::default();
        q.push(id(1), 3);
        q.push(id(2), 4);
        q.push(id(3), 5);
        let woken = q.drain_ready(&[4]);
        assert_eq!(woken, vec![id(2)]);
        assert_eq!(q.fds().collect::<Vec<_>>(), vec![3, 5]);
    }
}
