//! Real-fd wake tests: a task waits on an actual pipe, a byte is
//! written from the test, and the scheduler's `getTasks()` wakes it
//! through `poll(2)` rather than a mock.

use std::os::unix::io::RawFd;

use lumen_scheduler::{Scheduler, TaskState, TaskStep, YieldValue};

/// Opens an anonymous pipe and hands back its `(read_fd, write_fd)`.
fn pipe() -> (RawFd, RawFd) {
    let mut fds = [0 as RawFd; 2];
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe() failed: {}", std::io::Error::last_os_error());
    (fds[0], fds[1])
}

fn close(fd: RawFd) {
    unsafe { libc::close(fd) };
}

#[test]
fn task_waiting_to_read_wakes_once_the_pipe_has_data() {
    let (read_fd, write_fd) = pipe();
    let mut sched = Scheduler::new(20);

    let mut waited_once = false;
    let id = sched.spawn(move |_ctx| {
        if !waited_once {
            waited_once = true;
            TaskStep::Yield(YieldValue::WaitIoRead(read_fd))
        } else {
            TaskStep::Done
        }
    });

    sched.run_once().unwrap(); // steps into WaitIoRead
    assert_eq!(sched.task_state(id), TaskState::Suspended);

    let byte = [1u8];
    let written = unsafe { libc::write(write_fd, byte.as_ptr().cast(), 1) };
    assert_eq!(written, 1);

    sched.run_until_idle().unwrap();
    assert!(sched.is_idle());

    close(read_fd);
    close(write_fd);
}

#[test]
fn task_waiting_to_write_wakes_immediately_since_pipes_start_writable() {
    let (read_fd, write_fd) = pipe();
    let mut sched = Scheduler::new(20);

    let mut waited_once = false;
    let id = sched.spawn(move |_ctx| {
        if !waited_once {
            waited_once = true;
            TaskStep::Yield(YieldValue::WaitIoWrite(write_fd))
        } else {
            TaskStep::Done
        }
    });

    sched.run_once().unwrap(); // steps into WaitIoWrite
    assert_eq!(sched.task_state(id), TaskState::Suspended);

    sched.run_until_idle().unwrap();
    assert!(sched.is_idle());

    close(read_fd);
    close(write_fd);
}

#[test]
fn two_readers_on_distinct_pipes_both_wake_from_one_poll() {
    let (read_a, write_a) = pipe();
    let (read_b, write_b) = pipe();
    let mut sched = Scheduler::new(20);

    let mut a_done = false;
    sched.spawn(move |_ctx| {
        if !a_done {
            a_done = true;
            TaskStep::Yield(YieldValue::WaitIoRead(read_a))
        } else {
            TaskStep::Done
        }
    });
    let mut b_done = false;
    sched.spawn(move |_ctx| {
        if !b_done {
            b_done = true;
            TaskStep::Yield(YieldValue::WaitIoRead(read_b))
        } else {
            TaskStep::Done
        }
    });

    sched.run_once().unwrap();
    sched.run_once().unwrap();

    let byte = [9u8];
    unsafe {
        libc::write(write_a, byte.as_ptr().cast(), 1);
        libc::write(write_b, byte.as_ptr().cast(), 1);
    }

    sched.run_until_idle().unwrap();
    assert!(sched.is_idle());

    for fd in [read_a, write_a, read_b, write_b] {
        close(fd);
    }
}

#[test]
fn waiting_on_a_negative_fd_is_a_scheduler_error() {
    let mut sched = Scheduler::new(20);
    sched.spawn(|_ctx| TaskStep::Yield(YieldValue::WaitIoRead(-1)));
    let err = sched.run_once().unwrap_err();
    assert!(matches!(err, lumen_scheduler::SchedulerError::InvalidFd(_, -1)));
}

#[test]
fn two_sleeping_tasks_both_resume_well_under_a_second() {
    // Two tasks each sleep briefly once; both should resume and the
    // whole run should stay well under a second even with the
    // default-sized scheduling quantum.
    let start = std::time::Instant::now();
    let mut sched = Scheduler::new(20);

    for _ in 0..2 {
        let mut slept = false;
        sched.spawn(move |_ctx| {
            if !slept {
                slept = true;
                TaskStep::Yield(YieldValue::Sleep(0.05))
            } else {
                TaskStep::Done
            }
        });
    }

    sched.run_until_idle().unwrap();
    assert!(sched.is_idle());
    assert!(start.elapsed() < std::time::Duration::from_millis(500));
}
