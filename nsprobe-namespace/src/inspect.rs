//! Namespace inspection for a process

use nix::errno::Errno;
use nsprobe_core::{Error, ProcessId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ns_path, NamespaceKind};
use crate::handle::{NamespaceHandle, ResourceIdentity};
use crate::ioctl;

/// What is known about one namespace of a process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceReport {
    /// Namespace kind
    pub kind: NamespaceKind,
    /// Link target, e.g. `user:[4026531837]`
    pub link: String,
    /// Device and inode
    pub identity: ResourceIdentity,
    /// Owning user namespace, if the kernel answers `NS_GET_USERNS`
    pub owner: Option<ResourceIdentity>,
    /// Creator uid, for user namespaces
    pub owner_uid: Option<u32>,
    /// Parent namespace, for hierarchical kinds
    pub parent: Option<ResourceIdentity>,
}

/// Reads namespace information from `/proc/<pid>/ns`
#[derive(Debug, Clone)]
pub struct NamespaceInspector {
    process_dir: PathBuf,
}

impl NamespaceInspector {
    /// Inspect the calling process
    #[must_use]
    pub fn current(proc_root: &Path) -> Self {
        Self {
            process_dir: proc_root.join("self"),
        }
    }

    /// Inspect a specific process
    #[must_use]
    pub fn for_pid(proc_root: &Path, pid: ProcessId) -> Self {
        Self {
            process_dir: pid.proc_dir(proc_root),
        }
    }

    /// Check if the process exposes a namespace of this kind
    #[must_use]
    pub fn has(&self, kind: NamespaceKind) -> bool {
        ns_path(&self.process_dir, kind).exists()
    }

    /// Inspect one namespace
    ///
    /// Ioctl answers the kernel refuses are left as `None`.
    ///
    /// # Errors
    /// Returns error if the namespace file cannot be read or opened
    pub fn inspect(&self, kind: NamespaceKind) -> Result<NamespaceReport> {
        let path = ns_path(&self.process_dir, kind);

        let link = fs::read_link(&path)
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|e| Error::Namespace {
                message: format!("Failed to read {kind} namespace: {e}"),
            })?;

        let handle = NamespaceHandle::open(&path)?;
        let identity = handle.identity()?;

        let owner = answer(kind, "NS_GET_USERNS", ioctl::owning_user_ns(handle.file()))
            .and_then(|file| ResourceIdentity::of(&file).ok());

        let owner_uid = if kind == NamespaceKind::User {
            answer(kind, "NS_GET_OWNER_UID", ioctl::owner_uid(handle.file())).map(|uid| uid.as_raw())
        } else {
            None
        };

        let parent = if matches!(kind, NamespaceKind::User | NamespaceKind::Pid) {
            answer(kind, "NS_GET_PARENT", ioctl::parent_ns(handle.file()))
                .and_then(|file| ResourceIdentity::of(&file).ok())
        } else {
            None
        };

        Ok(NamespaceReport {
            kind,
            link,
            identity,
            owner,
            owner_uid,
            parent,
        })
    }

    /// Inspect every namespace the process exposes
    ///
    /// # Errors
    /// Returns error if an existing namespace file cannot be inspected
    pub fn inspect_all(&self) -> Result<Vec<NamespaceReport>> {
        NamespaceKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .map(|kind| self.inspect(kind))
            .collect()
    }
}

fn answer<T>(kind: NamespaceKind, request: &str, result: std::result::Result<T, Errno>) -> Option<T> {
    result
        .map_err(|errno| tracing::debug!(%kind, request, %errno, "Namespace ioctl refused"))
        .ok()
}

impl fmt::Display for NamespaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {:<7} {:<22} {}", self.kind.name().to_uppercase(), self.link, self.identity)?;
        if let Some(owner) = self.owner {
            write!(f, "  owner({owner})")?;
        }
        if let Some(uid) = self.owner_uid {
            write!(f, "  uid={uid}")?;
        }
        if let Some(parent) = self.parent {
            write!(f, "  parent({parent})")?;
        }
        Ok(())
    }
}
