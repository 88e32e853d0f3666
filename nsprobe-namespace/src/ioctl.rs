//! `NS_GET_*` ioctls on namespace file descriptors
//!
//! See ioctl_ns(2). All requests are `_IO(0xb7, n)`; the ones returning a
//! namespace hand back a new file descriptor owned by the caller.

#![allow(unsafe_code)]

use nix::errno::Errno;
use nix::unistd::Uid;
use std::fs::File;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::config::NamespaceKind;

const NSIO: u8 = 0xb7;

nix::ioctl_none!(
    /// Raw `NS_GET_USERNS`
    ns_get_userns,
    NSIO,
    0x1
);
nix::ioctl_none!(
    /// Raw `NS_GET_PARENT`
    ns_get_parent,
    NSIO,
    0x2
);
nix::ioctl_none!(
    /// Raw `NS_GET_NSTYPE`
    ns_get_nstype,
    NSIO,
    0x3
);

/// Take ownership of a descriptor returned by the kernel
fn adopt(raw: libc::c_int) -> File {
    // SAFETY: the ioctl succeeded, so `raw` is a fresh descriptor nobody else owns
    File::from(unsafe { OwnedFd::from_raw_fd(raw) })
}

/// Owning user namespace of the namespace behind `ns` (`NS_GET_USERNS`)
///
/// # Errors
/// `ENOTTY` on kernels without the ioctl, `EPERM` if the owner is outside
/// the caller's user namespace.
pub fn owning_user_ns(ns: &File) -> Result<File, Errno> {
    // SAFETY: `ns` is a valid open descriptor for the duration of the call
    let raw = unsafe { ns_get_userns(ns.as_raw_fd()) }?;
    Ok(adopt(raw))
}

/// Parent of a hierarchical (PID or user) namespace (`NS_GET_PARENT`)
///
/// # Errors
/// `EINVAL` for non-hierarchical kinds, `EPERM` at the top of the visible tree.
pub fn parent_ns(ns: &File) -> Result<File, Errno> {
    // SAFETY: see `owning_user_ns`
    let raw = unsafe { ns_get_parent(ns.as_raw_fd()) }?;
    Ok(adopt(raw))
}

/// Kind of the namespace behind `ns` (`NS_GET_NSTYPE`)
///
/// # Errors
/// `ENOTTY` on kernels without the ioctl, `EINVAL` for an unknown type.
pub fn ns_type(ns: &File) -> Result<NamespaceKind, Errno> {
    // SAFETY: see `owning_user_ns`
    let raw = unsafe { ns_get_nstype(ns.as_raw_fd()) }?;
    NamespaceKind::from_clone_flag(raw).ok_or(Errno::EINVAL)
}

/// Uid of the creator of a user namespace (`NS_GET_OWNER_UID`)
///
/// # Errors
/// `EINVAL` if `ns` is not a user namespace.
pub fn owner_uid(ns: &File) -> Result<Uid, Errno> {
    let mut uid: libc::uid_t = 0;
    // SAFETY: the kernel writes a single uid_t through the pointer
    let ret = unsafe {
        libc::ioctl(
            ns.as_raw_fd(),
            nix::request_code_none!(NSIO, 0x4),
            &raw mut uid,
        )
    };
    Errno::result(ret)?;
    Ok(Uid::from_raw(uid))
}

/// Resolves the owning user namespace of a namespace handle
///
/// This allows for different implementations:
/// - [`IoctlQuery`] - the kernel's `NS_GET_USERNS`
/// - test doubles that simulate old kernels or broken answers
pub trait OwnerQuery: Send {
    /// Return a handle on the user namespace owning `ns`
    ///
    /// # Errors
    /// Returns the errno of the failed query
    fn owning_user_ns(&self, ns: &File) -> Result<File, Errno>;
}

/// Queries the kernel through `NS_GET_USERNS`
#[derive(Debug, Clone, Copy, Default)]
pub struct IoctlQuery;

impl OwnerQuery for IoctlQuery {
    fn owning_user_ns(&self, ns: &File) -> Result<File, Errno> {
        owning_user_ns(ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ResourceIdentity;
    use std::path::Path;

    fn open_if_present(path: &str) -> Option<File> {
        Path::new(path).exists().then(|| File::open(path).unwrap())
    }

    #[test]
    fn test_request_codes() {
        assert_eq!(nix::request_code_none!(NSIO, 0x1) as u64, 0xb701);
        assert_eq!(nix::request_code_none!(NSIO, 0x3) as u64, 0xb703);
    }

    #[test]
    fn test_ns_type_of_user_ns() {
        let Some(ns) = open_if_present("/proc/self/ns/user") else {
            return;
        };

        match ns_type(&ns) {
            Ok(kind) => assert_eq!(kind, NamespaceKind::User),
            Err(Errno::ENOTTY) => {}
            Err(e) => panic!("NS_GET_NSTYPE failed: {e}"),
        }
    }

    #[test]
    fn test_owner_of_net_ns_is_user_ns() {
        let Some(net) = open_if_present("/proc/self/ns/net") else {
            return;
        };

        match owning_user_ns(&net) {
            Ok(owner) => {
                assert!(ResourceIdentity::of(&owner).is_ok());
                if let Ok(kind) = ns_type(&owner) {
                    assert_eq!(kind, NamespaceKind::User);
                }
            }
            // Old kernel, or the owner lies outside our user namespace
            Err(Errno::ENOTTY | Errno::EPERM) => {}
            Err(e) => panic!("NS_GET_USERNS failed: {e}"),
        }
    }

    #[test]
    fn test_owner_uid_rejects_non_user_ns() {
        let Some(net) = open_if_present("/proc/self/ns/net") else {
            return;
        };

        // EINVAL on modern kernels, ENOTTY where the ioctl is missing
        assert!(owner_uid(&net).is_err());
    }
}
