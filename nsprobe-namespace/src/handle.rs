//! Namespace handles and their resource identity

use nix::errno::Errno;
use nsprobe_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Device and inode pair naming a kernel object
///
/// Two handles refer to the same namespace iff their identities are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Device number
    pub dev: u64,
    /// Inode number
    pub ino: u64,
}

impl ResourceIdentity {
    /// Create from raw values
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Identity of an open file
    ///
    /// # Errors
    /// Returns error if fstat(2) fails
    pub fn of(file: &File) -> std::io::Result<Self> {
        let meta = file.metadata()?;
        Ok(Self::new(meta.dev(), meta.ino()))
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev={} ino={}", self.dev, self.ino)
    }
}

/// Open file descriptor referring to a namespace
#[derive(Debug)]
pub struct NamespaceHandle {
    file: File,
    origin: PathBuf,
}

impl NamespaceHandle {
    /// Open a namespace file read-only
    ///
    /// # Errors
    /// Returns [`Error::Broken`] carrying the errno if open(2) fails
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::broken(format!("open({}) failed", path.display()), io_errno(&e))
        })?;

        tracing::debug!(path = %path.display(), "Opened namespace handle");

        Ok(Self {
            file,
            origin: path.to_path_buf(),
        })
    }

    /// Wrap a descriptor obtained some other way, e.g. from an ioctl
    pub fn from_file(file: File, origin: impl Into<PathBuf>) -> Self {
        Self {
            file,
            origin: origin.into(),
        }
    }

    /// Underlying file
    #[must_use]
    pub const fn file(&self) -> &File {
        &self.file
    }

    /// Where this handle came from
    #[must_use]
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Resource identity of the namespace
    ///
    /// # Errors
    /// Returns [`Error::Broken`] carrying the errno if fstat(2) fails
    pub fn identity(&self) -> Result<ResourceIdentity> {
        let identity = ResourceIdentity::of(&self.file).map_err(|e| {
            Error::broken(
                format!("fstat({}) failed", self.origin.display()),
                io_errno(&e),
            )
        })?;

        tracing::debug!(
            origin = %self.origin.display(),
            dev = identity.dev,
            ino = identity.ino,
            "Namespace identity"
        );

        Ok(identity)
    }
}

/// Errno carried by an I/O error, `EIO` if it has none
pub(crate) fn io_errno(err: &std::io::Error) -> Errno {
    err.raw_os_error().map_or(Errno::EIO, Errno::from_raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_own_namespace() {
        let path = Path::new("/proc/self/ns/user");
        if !path.exists() {
            return;
        }

        let a = NamespaceHandle::open(path).unwrap();
        let b = NamespaceHandle::open(path).unwrap();

        assert_eq!(a.identity().unwrap(), b.identity().unwrap());
        assert_eq!(a.origin(), path);
    }

    #[test]
    fn test_different_kinds_differ() {
        let user = Path::new("/proc/self/ns/user");
        let net = Path::new("/proc/self/ns/net");
        if !user.exists() || !net.exists() {
            return;
        }

        let user = NamespaceHandle::open(user).unwrap().identity().unwrap();
        let net = NamespaceHandle::open(net).unwrap().identity().unwrap();
        assert_ne!(user, net);
    }

    #[test]
    fn test_open_missing_is_broken() {
        let err = NamespaceHandle::open("/proc/self/ns/does-not-exist").unwrap_err();
        assert_eq!(err.errno(), Some(Errno::ENOENT));
        assert!(err.to_string().contains("open(/proc/self/ns/does-not-exist) failed"));
    }

    #[test]
    fn test_identity_display() {
        let id = ResourceIdentity::new(4, 4_026_531_837);
        assert_eq!(id.to_string(), "dev=4 ino=4026531837");
    }
}
