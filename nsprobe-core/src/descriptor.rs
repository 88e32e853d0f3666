//! Declarative test descriptors and kernel version requirements

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Kernel release as `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KernelVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch level
    pub patch: u32,
}

impl KernelVersion {
    /// Create from components
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version of the running kernel
    ///
    /// # Errors
    /// Returns error if uname(2) fails or the release string is not parseable
    pub fn running() -> Result<Self> {
        let uts = nix::sys::utsname::uname()?;
        let release = uts.release().to_string_lossy();
        release.parse()
    }
}

impl FromStr for KernelVersion {
    type Err = Error;

    /// Parse a release string such as `6.18.44-fc-v139` or `4.9`
    fn from_str(release: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfig {
            message: format!("Invalid kernel version: {release:?}"),
        };

        // Each component stops at the first non-digit: "44-fc" -> 44
        let mut parts = release.trim().split('.').map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        });

        let major = parts.next().flatten().ok_or_else(invalid)?;
        let minor = parts.next().flatten().ok_or_else(invalid)?;
        let patch = parts.next().flatten().unwrap_or(0);

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Default time a test may run before the runner declares it broken
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What a test needs from its environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Test name
    pub name: String,

    /// Short description
    pub description: String,

    /// Test creates child processes
    pub forks_child: bool,

    /// Test must run with euid 0
    pub needs_root: bool,

    /// Test synchronises with its children through checkpoints
    pub needs_checkpoints: bool,

    /// Oldest kernel the test can run on
    pub min_kver: Option<KernelVersion>,

    /// Overall time limit in seconds
    pub timeout_secs: u64,
}

impl TestDescriptor {
    /// Create a descriptor with no requirements
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            forks_child: false,
            needs_root: false,
            needs_checkpoints: false,
            min_kver: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark that the test creates child processes
    #[must_use]
    pub fn forks_child(mut self) -> Self {
        self.forks_child = true;
        self
    }

    /// Mark that the test needs root
    #[must_use]
    pub fn needs_root(mut self) -> Self {
        self.needs_root = true;
        self
    }

    /// Mark that the test uses checkpoints
    #[must_use]
    pub fn needs_checkpoints(mut self) -> Self {
        self.needs_checkpoints = true;
        self
    }

    /// Require a minimum kernel version, e.g. `"4.9"`
    ///
    /// # Errors
    /// Returns error if the version string cannot be parsed
    pub fn with_min_kver(mut self, version: &str) -> Result<Self> {
        self.min_kver = Some(version.parse()?);
        Ok(self)
    }

    /// Require a minimum kernel version
    #[must_use]
    pub fn with_min_kernel(mut self, version: KernelVersion) -> Self {
        self.min_kver = Some(version);
        self
    }

    /// Set the overall time limit
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Overall time limit
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check whether `running` satisfies the minimum kernel version
    #[must_use]
    pub fn kernel_supported(&self, running: KernelVersion) -> bool {
        self.min_kver.is_none_or(|min| running >= min)
    }
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test: {}", self.name)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        writeln!(f, "  forks child:       {}", self.forks_child)?;
        writeln!(f, "  needs root:        {}", self.needs_root)?;
        writeln!(f, "  needs checkpoints: {}", self.needs_checkpoints)?;
        match self.min_kver {
            Some(v) => writeln!(f, "  min kernel:        {v}")?,
            None => writeln!(f, "  min kernel:        any")?,
        }
        writeln!(f, "  timeout:           {}s", self.timeout_secs)
    }
}
