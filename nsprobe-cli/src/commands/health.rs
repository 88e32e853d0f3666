use anyhow::Result;
use nix::errno::Errno;
use nsprobe_core::{KernelVersion, ResultLevel};
use nsprobe_namespace::{ioctl, NamespaceIdentityCheck, IoctlQuery};
use std::fs::File;
use std::path::Path;

/// Execute health check command
///
/// Every check runs; the exit status is CONF if any of them found the
/// system unable to run the namespace identity check.
pub fn execute() -> Result<i32> {
    println!("\n🏥 nsprobe Health Check\n");
    println!("{:-<60}", "");

    let checks = [
        check_permissions(),
        check_user_namespace(),
        check_kernel_version(),
        check_ns_get_userns(),
    ];

    println!("{:-<60}", "");

    if checks.iter().all(|ok| *ok) {
        println!("\n✅ Ready to run the namespace identity check!\n");
        Ok(0)
    } else {
        println!("\n⚠️  The namespace identity check would be skipped here\n");
        Ok(ResultLevel::Conf.exit_bit())
    }
}

/// Check if running as root
fn check_permissions() -> bool {
    print!("Checking permissions... ");

    if nix::unistd::geteuid().is_root() {
        println!("✅ OK (root)");
        true
    } else {
        println!("❌ NOT ROOT");
        println!("   The check clones into a new user namespace and needs root.");
        println!("   Try: sudo nsprobe run  (or nsprobe run --no-root-check)");
        false
    }
}

/// Check if the user namespace is exposed in /proc
fn check_user_namespace() -> bool {
    print!("Checking /proc/self/ns/user... ");

    if Path::new("/proc/self/ns/user").exists() {
        println!("✅ OK");
        true
    } else {
        println!("❌ NOT FOUND");
        println!("   Kernel built without CONFIG_USER_NS, or /proc not mounted.");
        false
    }
}

/// Check the running kernel against the check's minimum version
fn check_kernel_version() -> bool {
    print!("Checking kernel version... ");

    let descriptor = NamespaceIdentityCheck::<IoctlQuery>::describe();
    match KernelVersion::running() {
        Ok(running) if descriptor.kernel_supported(running) => {
            println!("✅ OK ({running})");
            true
        }
        Ok(running) => {
            println!("❌ TOO OLD ({running})");
            if let Some(min) = descriptor.min_kver {
                println!("   Need at least {min}");
            }
            false
        }
        Err(e) => {
            println!("❌ ERROR");
            println!("   {e}");
            false
        }
    }
}

/// Probe whether the kernel knows NS_GET_USERNS
fn check_ns_get_userns() -> bool {
    print!("Checking NS_GET_USERNS... ");

    let Ok(own) = File::open("/proc/self/ns/user") else {
        println!("❌ CANNOT OPEN /proc/self/ns/user");
        return false;
    };

    // EPERM only means our owner lies outside our view; the ioctl exists
    match ioctl::owning_user_ns(&own) {
        Ok(_) | Err(Errno::EPERM) => {
            println!("✅ OK");
            true
        }
        Err(Errno::ENOTTY) => {
            println!("❌ NOT IMPLEMENTED");
            false
        }
        Err(e) => {
            println!("⚠️  UNEXPECTED ({e})");
            false
        }
    }
}
