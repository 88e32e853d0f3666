//! Error types for nsprobe
//!
//! Every error a test returns is an abort: the runner turns it into exactly one
//! reported result at the level given by [`Error::level`].

use nix::errno::Errno;
use thiserror::Error;

use crate::report::ResultLevel;

/// nsprobe error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Namespace operation failed
    #[error("Namespace error: {message}")]
    Namespace {
        /// Error message
        message: String,
    },

    /// The running system lacks a facility the test needs
    #[error("{message}")]
    Unsupported {
        /// Error message
        message: String,
    },

    /// Unexpected system call failure
    #[error("{message}: {errno}")]
    Broken {
        /// Error message
        message: String,
        /// Underlying error code
        errno: Errno,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// System error from nix
    #[error("System error: {0}")]
    System(#[from] nix::Error),

    /// Test did not finish in time
    #[error("Test timed out after {seconds}s")]
    Timeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Task join error
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Shorthand for [`Error::Unsupported`]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Broken`]
    pub fn broken(message: impl Into<String>, errno: Errno) -> Self {
        Self::Broken {
            message: message.into(),
            errno,
        }
    }

    /// Result level the runner reports when a test aborts with this error
    #[must_use]
    pub const fn level(&self) -> ResultLevel {
        match self {
            Self::Unsupported { .. } => ResultLevel::Conf,
            _ => ResultLevel::Broken,
        }
    }

    /// Underlying error code, if the error carries one
    #[must_use]
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Broken { errno, .. } | Self::System(errno) => Some(*errno),
            Self::Io(e) => e.raw_os_error().map(Errno::from_raw),
            _ => None,
        }
    }
}

/// Result type alias for nsprobe operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_conf() {
        let err = Error::unsupported("namespace not available");
        assert_eq!(err.level(), ResultLevel::Conf);
        assert_eq!(err.to_string(), "namespace not available");
        assert!(err.errno().is_none());
    }

    #[test]
    fn test_broken_keeps_errno() {
        let err = Error::broken("ioctl(NS_GET_USERNS) failed", Errno::EPERM);
        assert_eq!(err.level(), ResultLevel::Broken);
        assert_eq!(err.errno(), Some(Errno::EPERM));
        assert!(err.to_string().starts_with("ioctl(NS_GET_USERNS) failed: EPERM"));
    }

    #[test]
    fn test_io_error_errno() {
        let err = Error::from(std::io::Error::from_raw_os_error(libc::ENOENT));
        assert_eq!(err.level(), ResultLevel::Broken);
        assert_eq!(err.errno(), Some(Errno::ENOENT));
    }
}
