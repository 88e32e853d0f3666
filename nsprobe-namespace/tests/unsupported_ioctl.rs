//! Kept in its own test binary: it asserts that no child of this process is
//! left behind, which only holds when no other test is spawning children.

use nix::errno::Errno;
use nix::sched::CloneFlags;
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid;
use nsprobe_core::ResultLevel;
use nsprobe_namespace::*;
use std::fs::File;
use std::path::Path;

/// Behaves like a kernel without `NS_GET_USERNS`
struct MissingIoctl;

impl OwnerQuery for MissingIoctl {
    fn owning_user_ns(&self, _ns: &File) -> Result<File, Errno> {
        Err(Errno::ENOTTY)
    }
}

#[test]
fn test_enotty_skips_and_reaps_child() {
    if !Path::new("/proc/self/ns/user").exists() {
        return;
    }

    let config = CheckConfig::new().with_clone_flags(CloneFlags::empty());
    let mut check = NamespaceIdentityCheck::with_query(config, MissingIoctl);

    let summary = Runner::new(RunnerConfig::new().with_root_check(false)).run_blocking(&mut check);

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].level, ResultLevel::Conf);
    assert_eq!(summary.results[0].message, "ioctl(NS_GET_USERNS) not implemented");

    // The child was released and reaped before the skip was reported
    assert_eq!(
        waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)),
        Err(Errno::ECHILD)
    );
}
