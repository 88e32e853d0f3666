//! Child processes cloned into new namespaces
//!
//! This module uses `unsafe` for clone(2), which is inherently unsafe
//! but the only way to start a child in a fresh user namespace.

#![allow(unsafe_code)]

use nix::errno::Errno;
use nix::sched::{clone, CloneFlags};
use nix::sys::wait::{waitpid, WaitStatus};
use nsprobe_core::{Error, ProcessId, Result};
use tracing::{debug, info, warn};

use crate::checkpoint::{checkpoint, CheckpointWaiter, CheckpointWaker};

/// Exit code of a child whose checkpoint wait failed
const WAIT_FAILED: isize = 1;

/// A cloned child parked on a checkpoint
///
/// The child stays blocked until [`ChildProcess::release`] is called or the
/// guard is dropped; dropping also reaps it, so no exit path leaves an
/// orphaned or zombie child behind.
#[derive(Debug)]
pub struct ChildProcess {
    pid: ProcessId,
    waker: Option<CheckpointWaker>,
    reaped: bool,
    // Owned per invocation; the child runs on its own copy of it
    _stack: Vec<u8>,
}

impl ChildProcess {
    /// Clone a child with `flags` that waits on a checkpoint, then exits 0
    ///
    /// # Errors
    /// Returns [`Error::Broken`] carrying the errno if clone(2) fails
    pub fn spawn(flags: CloneFlags, stack_size: usize) -> Result<Self> {
        let (waiter, waker) = checkpoint()?;
        let waker_fd = waker.as_raw_fd();
        let mut waiter = Some(waiter);
        let mut stack = vec![0u8; stack_size];

        let entry = Box::new(move || -> isize {
            // Drop our copy of the write end so EOF arrives if the parent dies
            // SAFETY: the descriptor was inherited and is not used again here
            unsafe {
                libc::close(waker_fd);
            }
            match waiter.take().map(CheckpointWaiter::wait) {
                Some(Ok(())) => 0,
                _ => WAIT_FAILED,
            }
        });

        debug!(flags = ?flags, stack_size, "Cloning child");

        // SAFETY: without CLONE_VM the child runs on a copy of the address
        // space, so the closure and stack are private to it
        let pid = unsafe { clone(entry, &mut stack, flags, Some(libc::SIGCHLD)) }
            .map_err(|e| Error::broken("clone() failed", e))?;

        info!(pid = %pid, flags = ?flags, "👶 Child created");

        Ok(Self {
            pid: pid.into(),
            waker: Some(waker),
            reaped: false,
            _stack: stack,
        })
    }

    /// Child's process id
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Check if the child has been released
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.waker.is_none()
    }

    /// Release the child from its checkpoint; later calls do nothing
    ///
    /// # Errors
    /// Returns error if the checkpoint cannot be woken
    pub fn release(&mut self) -> Result<()> {
        match self.waker.take() {
            Some(waker) => {
                debug!(pid = %self.pid, "Releasing child");
                waker.wake()
            }
            None => Ok(()),
        }
    }

    /// Release the child and wait for it to exit
    ///
    /// # Errors
    /// Returns error if waitpid(2) fails or the child did not exit with 0
    pub fn wait(mut self) -> Result<()> {
        self.release()?;
        let status = self.reap()?;

        match status {
            WaitStatus::Exited(_, 0) => Ok(()),
            other => Err(Error::Namespace {
                message: format!("Child {} ended abnormally: {other:?}", self.pid),
            }),
        }
    }

    fn reap(&mut self) -> Result<WaitStatus> {
        loop {
            match waitpid(self.pid.as_nix_pid(), None) {
                Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    self.reaped = true;
                    debug!(pid = %self.pid, status = ?status, "Child reaped");
                    return Ok(status);
                }
                Ok(status) => {
                    debug!(pid = %self.pid, status = ?status, "Child status");
                }
                Err(Errno::EINTR) => {}
                Err(e) => {
                    self.reaped = true;
                    return Err(Error::broken(format!("waitpid({}) failed", self.pid), e));
                }
            }
        }
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(pid = %self.pid, error = %e, "Could not release child");
        }
        if !self.reaped {
            if let Err(e) = self.reap() {
                warn!(pid = %self.pid, error = %e, "Could not reap child");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_STACK_SIZE;

    #[test]
    fn test_spawn_release_wait() {
        let mut child = ChildProcess::spawn(CloneFlags::empty(), DEFAULT_STACK_SIZE).unwrap();
        assert!(!child.is_released());
        assert_ne!(child.pid(), ProcessId::current());

        child.release().unwrap();
        assert!(child.is_released());

        // Second release is a no-op
        child.release().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_child_blocks_until_released() {
        let child = ChildProcess::spawn(CloneFlags::empty(), DEFAULT_STACK_SIZE).unwrap();
        let pid = child.pid().as_nix_pid();

        let status = waitpid(pid, Some(nix::sys::wait::WaitPidFlag::WNOHANG)).unwrap();
        assert_eq!(status, WaitStatus::StillAlive);

        child.wait().unwrap();
    }

    #[test]
    fn test_drop_releases_and_reaps() {
        let child = ChildProcess::spawn(CloneFlags::empty(), DEFAULT_STACK_SIZE).unwrap();
        let pid = child.pid().as_nix_pid();
        drop(child);

        // Already reaped by the guard
        assert_eq!(waitpid(pid, None), Err(Errno::ECHILD));
    }
}
