use nix::errno::Errno;
use nix::sched::CloneFlags;
use nsprobe_core::ResultLevel;
use nsprobe_namespace::check::{MSG_CONSISTENT, MSG_PARENTS_DIFFER, MSG_SAME_INODE};
use nsprobe_namespace::*;
use std::fs::File;
use std::path::Path;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn has_user_ns() -> bool {
    Path::new("/proc/self/ns/user").exists()
}

/// Answers with a fixed namespace file instead of asking the kernel
struct FixedQuery(&'static str);

impl OwnerQuery for FixedQuery {
    fn owning_user_ns(&self, _ns: &File) -> Result<File, Errno> {
        File::open(self.0).map_err(|e| Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO)))
    }
}

fn unprivileged_runner() -> Runner {
    Runner::new(RunnerConfig::new().with_root_check(false))
}

#[test]
fn test_owner_equal_to_child_fails() {
    init_tracing();
    if !has_user_ns() {
        return;
    }

    // Without CLONE_NEWUSER the child shares our user namespace
    let config = CheckConfig::new().with_clone_flags(CloneFlags::empty());
    let mut check = NamespaceIdentityCheck::with_query(config, FixedQuery("/proc/self/ns/user"));

    let summary = unprivileged_runner().run_blocking(&mut check);

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].level, ResultLevel::Fail);
    assert_eq!(summary.results[0].message, MSG_SAME_INODE);
}

#[test]
fn test_owner_different_from_own_fails() {
    init_tracing();
    if !has_user_ns() || !Path::new("/proc/self/ns/net").exists() {
        return;
    }

    let config = CheckConfig::new().with_clone_flags(CloneFlags::empty());
    let mut check = NamespaceIdentityCheck::with_query(config, FixedQuery("/proc/self/ns/net"));

    let summary = unprivileged_runner().run_blocking(&mut check);

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].level, ResultLevel::Fail);
    assert_eq!(summary.results[0].message, MSG_PARENTS_DIFFER);
    assert_eq!(summary.exit_status(), 1);
}

#[test]
fn test_missing_proc_is_single_skip() {
    init_tracing();
    let config = CheckConfig::new().with_proc_root("/nonexistent-proc");
    let mut check = NamespaceIdentityCheck::new(config);

    let summary = unprivileged_runner().run_blocking(&mut check);

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].level, ResultLevel::Conf);
    assert_eq!(summary.results[0].message, "namespace not available");
}

#[test]
fn test_kernel_check_never_fails() {
    init_tracing();
    if !has_user_ns() {
        return;
    }

    // Unprivileged user namespaces may be disabled; then clone breaks, but
    // the identities themselves must never mismatch
    let mut check = NamespaceIdentityCheck::new(CheckConfig::new());
    let summary = unprivileged_runner().run_blocking(&mut check);

    assert_eq!(summary.count(ResultLevel::Fail), 0);
    assert!(!summary.results.is_empty());
}

#[test]
#[ignore] // Requires root
fn test_owning_user_ns_is_parent() {
    init_tracing();
    let mut check = NamespaceIdentityCheck::new(CheckConfig::new());

    let summary = Runner::default().run_blocking(&mut check);

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].level, ResultLevel::Pass);
    assert_eq!(summary.results[0].message, MSG_CONSISTENT);
}

#[tokio::test]
async fn test_async_runner_missing_proc() {
    let check = NamespaceIdentityCheck::new(CheckConfig::new().with_proc_root("/nonexistent-proc"));

    let summary = unprivileged_runner().run(check).await;

    assert_eq!(summary.count(ResultLevel::Conf), 1);
    assert_eq!(summary.exit_status(), 32);
}

#[test]
fn test_namespace_kind_parsing() {
    assert_eq!("user".parse::<NamespaceKind>().unwrap(), NamespaceKind::User);
    assert_eq!("mnt".parse::<NamespaceKind>().unwrap(), NamespaceKind::Mnt);
    assert!("mount".parse::<NamespaceKind>().is_err());
}
