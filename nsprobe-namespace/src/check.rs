//! Owning user namespace check
//!
//! A child is cloned into a new user namespace. Asking the kernel, through
//! the child's `/proc/<pid>/ns/user` handle, for the owning user namespace
//! must yield the caller's own user namespace, and that namespace must not be
//! the child's.

use nix::errno::Errno;
use nsprobe_core::{Error, KernelVersion, Reporter, ResultLevel, Result, TestDescriptor, TestResult};
use tracing::{debug, info};

use crate::child::ChildProcess;
use crate::config::CheckConfig;
use crate::handle::{NamespaceHandle, ResourceIdentity};
use crate::ioctl::{IoctlQuery, OwnerQuery};
use crate::runner::ProbeTest;

/// Reported when both identity comparisons hold
pub const MSG_CONSISTENT: &str = "child and parent are consistent";

/// Reported when the owner is not the caller's own user namespace
pub const MSG_PARENTS_DIFFER: &str = "parents have different inodes";

/// Reported when the owner is the child's namespace itself
pub const MSG_SAME_INODE: &str = "child and parent have same inode";

/// Identities of the three handles the check compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identities {
    /// Caller's own user namespace
    pub own: ResourceIdentity,
    /// Child's user namespace
    pub child: ResourceIdentity,
    /// Owner of the child's user namespace, as returned by the query
    pub owner: ResourceIdentity,
}

/// Compare the three identities
///
/// Both comparisons are made independently, so a broken answer can yield two
/// failures. A consistent answer yields a single pass.
#[must_use]
pub fn evaluate(ids: &Identities) -> Vec<TestResult> {
    let mut results = Vec::new();

    if ids.own != ids.owner {
        results.push(TestResult::new(ResultLevel::Fail, MSG_PARENTS_DIFFER));
    }
    if ids.owner == ids.child {
        results.push(TestResult::new(ResultLevel::Fail, MSG_SAME_INODE));
    }
    if results.is_empty() {
        results.push(TestResult::new(ResultLevel::Pass, MSG_CONSISTENT));
    }

    results
}

/// Map a failed `NS_GET_USERNS` to the abort it causes
#[must_use]
pub fn query_error(errno: Errno) -> Error {
    match errno {
        Errno::ENOTTY => Error::unsupported("ioctl(NS_GET_USERNS) not implemented"),
        other => Error::broken("ioctl(NS_GET_USERNS) failed", other),
    }
}

/// Checks that `NS_GET_USERNS` on a child's user namespace returns the
/// caller's user namespace
#[derive(Debug)]
pub struct NamespaceIdentityCheck<Q = IoctlQuery> {
    config: CheckConfig,
    query: Q,
    descriptor: TestDescriptor,
}

impl NamespaceIdentityCheck {
    /// Create a check that queries the kernel
    #[must_use]
    pub fn new(config: CheckConfig) -> Self {
        Self::with_query(config, IoctlQuery)
    }
}

impl<Q: OwnerQuery> NamespaceIdentityCheck<Q> {
    /// Create a check with a custom owner query
    pub fn with_query(config: CheckConfig, query: Q) -> Self {
        Self {
            config,
            query,
            descriptor: Self::describe(),
        }
    }

    /// Requirements of this check
    #[must_use]
    pub fn describe() -> TestDescriptor {
        TestDescriptor::new("ns_get_userns")
            .with_description(
                "NS_GET_USERNS on a child's user namespace returns the caller's user namespace",
            )
            .forks_child()
            .needs_root()
            .needs_checkpoints()
            .with_min_kernel(KernelVersion::new(4, 9, 0))
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &CheckConfig {
        &self.config
    }
}

impl<Q: OwnerQuery> ProbeTest for NamespaceIdentityCheck<Q> {
    fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    fn setup(&mut self) -> Result<()> {
        self.config.validate()?;

        let own = self.config.own_path();
        if !own.exists() {
            debug!(path = %own.display(), "Namespace path missing");
            return Err(Error::unsupported("namespace not available"));
        }
        Ok(())
    }

    fn run(&mut self, reporter: &mut Reporter) -> Result<()> {
        let child = ChildProcess::spawn(self.config.clone_flags, self.config.stack_size)?;

        let own = NamespaceHandle::open(self.config.own_path())?;
        let child_ns = NamespaceHandle::open(self.config.pid_path(child.pid()))?;

        let owner = match self.query.owning_user_ns(child_ns.file()) {
            Ok(file) => NamespaceHandle::from_file(file, "NS_GET_USERNS"),
            Err(errno) => {
                // Release before aborting
                drop(child);
                return Err(query_error(errno));
            }
        };

        let ids = Identities {
            own: own.identity()?,
            child: child_ns.identity()?,
            owner: owner.identity()?,
        };

        info!(
            pid = %child.pid(),
            own = %ids.own,
            child = %ids.child,
            owner = %ids.owner,
            "Comparing namespace identities"
        );

        for result in evaluate(&ids) {
            reporter.report(result.level, result.message);
        }

        drop(owner);
        drop(child_ns);
        drop(own);
        child.wait()
    }
}
