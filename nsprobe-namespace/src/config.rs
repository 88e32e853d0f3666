//! Namespace kinds and check configuration

use nix::sched::CloneFlags;
use nsprobe_core::{Error, ProcessId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default stack size for cloned children (1 MiB)
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Smallest stack a cloned child may be given
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Kinds of Linux namespaces exposed under `/proc/<pid>/ns`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// User namespace
    User,
    /// PID namespace
    Pid,
    /// Network namespace
    Net,
    /// Mount namespace
    Mnt,
    /// UTS namespace (hostname)
    Uts,
    /// IPC namespace
    Ipc,
    /// CGroup namespace
    Cgroup,
    /// Time namespace
    Time,
}

impl NamespaceKind {
    /// Every kind, in `/proc/<pid>/ns` listing order
    pub const ALL: [Self; 8] = [
        Self::Cgroup,
        Self::Ipc,
        Self::Mnt,
        Self::Net,
        Self::Pid,
        Self::Time,
        Self::User,
        Self::Uts,
    ];

    /// Entry name under `/proc/<pid>/ns`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Pid => "pid",
            Self::Net => "net",
            Self::Mnt => "mnt",
            Self::Uts => "uts",
            Self::Ipc => "ipc",
            Self::Cgroup => "cgroup",
            Self::Time => "time",
        }
    }

    /// Raw `CLONE_NEW*` value, as also returned by `NS_GET_NSTYPE`
    #[must_use]
    pub const fn clone_flag(self) -> libc::c_int {
        match self {
            Self::User => libc::CLONE_NEWUSER,
            Self::Pid => libc::CLONE_NEWPID,
            Self::Net => libc::CLONE_NEWNET,
            Self::Mnt => libc::CLONE_NEWNS,
            Self::Uts => libc::CLONE_NEWUTS,
            Self::Ipc => libc::CLONE_NEWIPC,
            Self::Cgroup => libc::CLONE_NEWCGROUP,
            Self::Time => libc::CLONE_NEWTIME,
        }
    }

    /// Look up a kind from its raw `CLONE_NEW*` value
    #[must_use]
    pub fn from_clone_flag(flag: libc::c_int) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.clone_flag() == flag)
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NamespaceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidConfig {
                message: format!("Unknown namespace kind: {s}"),
            })
    }
}

/// Configuration of the owning user namespace check
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Flags the child is cloned with
    pub clone_flags: CloneFlags,

    /// Size of the child's stack buffer
    pub stack_size: usize,

    /// Mount point of procfs
    pub proc_root: PathBuf,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            clone_flags: CloneFlags::CLONE_NEWUSER,
            stack_size: DEFAULT_STACK_SIZE,
            proc_root: PathBuf::from("/proc"),
        }
    }
}

impl CheckConfig {
    /// Create a new check configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clone flags of the child
    #[must_use]
    pub fn with_clone_flags(mut self, flags: CloneFlags) -> Self {
        self.clone_flags = flags;
        self
    }

    /// Set the child stack size
    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// Set the procfs mount point
    #[must_use]
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns error if the stack is too small
    pub fn validate(&self) -> Result<()> {
        if self.stack_size < MIN_STACK_SIZE {
            return Err(Error::InvalidConfig {
                message: format!(
                    "Stack size {} is below the minimum of {MIN_STACK_SIZE} bytes",
                    self.stack_size
                ),
            });
        }
        Ok(())
    }

    /// The caller's own user namespace path, e.g. `/proc/self/ns/user`
    #[must_use]
    pub fn own_path(&self) -> PathBuf {
        ns_path(&self.proc_root.join("self"), NamespaceKind::User)
    }

    /// A process's user namespace path, e.g. `/proc/1234/ns/user`
    #[must_use]
    pub fn pid_path(&self, pid: ProcessId) -> PathBuf {
        ns_path(&pid.proc_dir(&self.proc_root), NamespaceKind::User)
    }
}

/// Path of a namespace entry below a process directory
#[must_use]
pub fn ns_path(process_dir: &Path, kind: NamespaceKind) -> PathBuf {
    process_dir.join("ns").join(kind.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert_eq!(config.clone_flags, CloneFlags::CLONE_NEWUSER);
        assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CheckConfig::new()
            .with_clone_flags(CloneFlags::empty())
            .with_stack_size(64 * 1024)
            .with_proc_root("/tmp/proc");

        assert!(config.clone_flags.is_empty());
        assert_eq!(config.stack_size, 64 * 1024);
        assert_eq!(config.own_path(), Path::new("/tmp/proc/self/ns/user"));
    }

    #[test]
    fn test_small_stack_rejected() {
        let config = CheckConfig::new().with_stack_size(1024);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pid_path() {
        let config = CheckConfig::new();
        let path = config.pid_path(ProcessId::from_raw(1234));
        assert_eq!(path, Path::new("/proc/1234/ns/user"));
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in NamespaceKind::ALL {
            assert_eq!(kind.name().parse::<NamespaceKind>().unwrap(), kind);
            assert_eq!(NamespaceKind::from_clone_flag(kind.clone_flag()), Some(kind));
        }
        assert!("bogus".parse::<NamespaceKind>().is_err());
    }

    #[test]
    fn test_clone_flags_match_nix() {
        let flag = CloneFlags::from_bits_truncate(NamespaceKind::User.clone_flag());
        assert_eq!(flag, CloneFlags::CLONE_NEWUSER);
    }
}
