//! Single-use rendezvous between a parent and one child
//!
//! A pipe: the child blocks reading one byte, the parent writes it. If the
//! parent goes away without waking, every write end closes and the child
//! reads EOF, which also counts as a release.

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use nsprobe_core::{Error, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, RawFd};

use crate::handle::io_errno;

/// Create a checkpoint, returning the waiting and waking halves
///
/// # Errors
/// Returns error if pipe2(2) fails
pub fn checkpoint() -> Result<(CheckpointWaiter, CheckpointWaker)> {
    let (read, write) =
        pipe2(OFlag::O_CLOEXEC).map_err(|e| Error::broken("pipe2() failed", e))?;

    Ok((
        CheckpointWaiter {
            pipe: File::from(read),
        },
        CheckpointWaker {
            pipe: File::from(write),
        },
    ))
}

/// Child side of a checkpoint
#[derive(Debug)]
pub struct CheckpointWaiter {
    pipe: File,
}

impl CheckpointWaiter {
    /// Block until the parent wakes this checkpoint or goes away
    ///
    /// # Errors
    /// Returns error if the read fails for any reason but `EINTR`
    pub fn wait(mut self) -> Result<()> {
        let mut buf = [0u8; 1];
        loop {
            match self.pipe.read(&mut buf) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::broken("checkpoint wait failed", io_errno(&e))),
            }
        }
    }
}

/// Parent side of a checkpoint
#[derive(Debug)]
pub struct CheckpointWaker {
    pipe: File,
}

impl CheckpointWaker {
    /// Raw descriptor of the write end, so a child can close its copy
    #[must_use]
    pub fn as_raw_fd(&self) -> RawFd {
        self.pipe.as_raw_fd()
    }

    /// Release the waiting child
    ///
    /// # Errors
    /// Returns error if the write fails
    pub fn wake(mut self) -> Result<()> {
        self.pipe
            .write_all(&[1])
            .map_err(|e| Error::broken("checkpoint wake failed", io_errno(&e)))
    }
}
