//! The scheduler's runtime-error class: raised on a malformed yield value.
//! Distinct from parser/checker diagnostics — there's no "keep going" here,
//! a bad yield stops the task that produced it.

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("task {0:?} yielded a negative sleep duration: {1}")]
    NegativeSleep(crate::task::TaskId, f64),

    #[error("task {0:?} waited on an invalid file descriptor: {1}")]
    InvalidFd(crate::task::TaskId, std::os::unix::io::RawFd),

    #[error("multiplexed I/O wait failed: {0}")]
    Poll(#[source] std::io::Error),
}
