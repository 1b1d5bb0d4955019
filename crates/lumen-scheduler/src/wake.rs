//! The wake algorithm: expire sleepers, then multiplex-wait on pending
//! fds. The multiplexed wait uses `libc::poll` rather than `select` —
//! `select` requires computing the highest fd plus one as its bound, an
//! easy off-by-one to get wrong, while `poll` takes an fd list directly
//! and has no such bound to get wrong.

use std::os::unix::io::RawFd;

use crate::error::SchedulerError;

/// The multiplex-wait quantum: block for up to 200 ms before giving up
/// on this round and letting the caller retry.
pub const DEFAULT_QUANTUM_MS: i32 = 200;

pub(crate) struct PollOutcome {
    pub readable: Vec<RawFd>,
    pub writable: Vec<RawFd>,
}

/// Blocks for up to `timeout_ms` waiting for any of `readers`/`writers` to
/// become ready. Returns immediately with empty vectors if both are
/// empty — nothing to multiplex, so there's nothing to wait for either.
pub(crate) fn poll_fds(
    readers: impl Iterator<Item = RawFd>,
    writers: impl Iterator<Item = RawFd>,
    timeout_ms: i32,
) -> Result<PollOutcome, SchedulerError> {
    let mut pollfds: Vec<libc::pollfd> = Vec::new();

    for fd in readers {
        pollfds.push(libc::pollfd { fd, events: libc::POLLIN, revents: 0 });
    }
    for fd in writers {
        pollfds.push(libc::pollfd { fd, events: libc::POLLOUT, revents: 0 });
    }

    if pollfds.is_empty() {
        return Ok(PollOutcome { readable: Vec::new(), writable: Vec::new() });
    }

    // SAFETY: `pollfds` is a valid, exclusively-owned buffer of `nfds`
    // `pollfd` entries for the duration of the call, matching `poll(2)`'s
    // contract.
    let rc = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, timeout_ms) };
    if rc < 0 {
        return Err(SchedulerError::Poll(std::io::Error::last_os_error()));
    }

    let mut readable = Vec::new();
    let mut writable = Vec::new();
    for pfd in &pollfds {
        if pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 && pfd.events & libc::POLLIN != 0 {
            readable.push(pfd.fd);
        }
        if pfd.revents & (libc::POLLOUT | libc::POLLHUP | libc::POLLERR) != 0 && pfd.events & libc::POLLOUT != 0 {
            writable.push(pfd.fd);
        }
    }
    Ok(PollOutcome { readable, writable })
}
