//! CLI argument definitions

use clap::{Parser, Subcommand};
use nsprobe_namespace::NamespaceKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nsprobe")]
#[command(about = "Kernel namespace conformance probe", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the owning user namespace check
    Run {
        /// Time limit in seconds (default: the test's own)
        #[arg(long)]
        timeout: Option<u64>,

        /// Run even when not root
        #[arg(long)]
        no_root_check: bool,

        /// Child stack size in bytes
        #[arg(long, default_value_t = nsprobe_namespace::config::DEFAULT_STACK_SIZE)]
        stack_size: usize,

        /// Mount point of procfs
        #[arg(long, default_value = "/proc")]
        proc_root: PathBuf,
    },

    /// Show what the check requires
    Describe,

    /// Show namespace identities of a process
    Inspect {
        /// Process ID (default: current process)
        #[arg(short, long)]
        pid: Option<i32>,

        /// Only this namespace kind (user, pid, net, mnt, uts, ipc, cgroup, time)
        #[arg(short, long)]
        kind: Option<NamespaceKind>,

        /// Mount point of procfs
        #[arg(long, default_value = "/proc")]
        proc_root: PathBuf,
    },

    /// Check whether this system can run the check
    Health,
}
