//! Namespace probes for Linux kernel conformance testing
//!
//! This crate checks the namespace inspection ioctls of ioctl_ns(2):
//! - Namespace handles and their device/inode identity
//! - `NS_GET_USERNS`, `NS_GET_PARENT`, `NS_GET_NSTYPE`, `NS_GET_OWNER_UID`
//! - Children cloned into new namespaces, parked on a checkpoint
//! - The owning user namespace check and the runner that drives it

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod check;
pub mod checkpoint;
pub mod child;
pub mod config;
pub mod handle;
pub mod inspect;
pub mod ioctl;
pub mod runner;

pub use check::{evaluate, Identities, NamespaceIdentityCheck};
pub use checkpoint::{checkpoint, CheckpointWaiter, CheckpointWaker};
pub use child::ChildProcess;
pub use config::{CheckConfig, NamespaceKind};
pub use handle::{NamespaceHandle, ResourceIdentity};
pub use inspect::{NamespaceInspector, NamespaceReport};
pub use ioctl::{IoctlQuery, OwnerQuery};
pub use runner::{ProbeTest, Runner, RunnerConfig};
