//! Test runner
//!
//! Enforces a test's descriptor, runs setup and the test body, and turns an
//! aborting error into exactly one reported result.

use nsprobe_core::{Error, KernelVersion, Reporter, Result, Summary, TestDescriptor};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A test the runner can drive
pub trait ProbeTest: Send {
    /// Requirements of the test
    fn descriptor(&self) -> &TestDescriptor;

    /// Check the environment; an error here skips or breaks the run
    ///
    /// # Errors
    /// Returns the abort that ends the run
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Test body
    ///
    /// # Errors
    /// Returns the abort that ends the run
    fn run(&mut self, reporter: &mut Reporter) -> Result<()>;
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Enforce `needs_root`
    pub check_root: bool,

    /// Enforce `min_kver`
    pub check_kernel: bool,

    /// Override the descriptor's time limit
    pub timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            check_root: true,
            check_kernel: true,
            timeout: None,
        }
    }
}

impl RunnerConfig {
    /// Create a new runner configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the root check
    #[must_use]
    pub fn with_root_check(mut self, enable: bool) -> Self {
        self.check_root = enable;
        self
    }

    /// Enable or disable the kernel version check
    #[must_use]
    pub fn with_kernel_check(mut self, enable: bool) -> Self {
        self.check_kernel = enable;
        self
    }

    /// Override the time limit
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Drives [`ProbeTest`]s
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a test on the current thread
    pub fn run_blocking<T: ProbeTest + ?Sized>(&self, test: &mut T) -> Summary {
        let mut reporter = Reporter::new();
        let name = test.descriptor().name.clone();

        info!(test = %name, "🚀 Starting test");

        let outcome = self
            .check_requirements(test.descriptor())
            .and_then(|()| test.setup())
            .and_then(|()| test.run(&mut reporter));

        if let Err(e) = outcome {
            debug!(test = %name, errno = ?e.errno(), "Test aborted");
            reporter.report(e.level(), e.to_string());
        }

        if reporter.is_empty() {
            warn!(test = %name, "Test reported no results");
        }

        let summary = reporter.into_summary();
        info!(test = %name, status = summary.exit_status(), "Test finished");
        summary
    }

    /// Run a test on a blocking task under the time limit
    ///
    /// A test that overruns is reported broken; its thread is left behind
    /// and ends with the process.
    pub async fn run<T: ProbeTest + 'static>(&self, mut test: T) -> Summary {
        let timeout = self
            .config
            .timeout
            .unwrap_or_else(|| test.descriptor().timeout());
        let runner = self.clone();

        let task = tokio::task::spawn_blocking(move || runner.run_blocking(&mut test));

        let error = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(summary)) => return summary,
            Ok(Err(join)) => Error::from(join),
            Err(_) => Error::Timeout {
                seconds: timeout.as_secs(),
            },
        };

        warn!(error = %error, "Test did not complete");
        let mut reporter = Reporter::new();
        reporter.report(error.level(), error.to_string());
        reporter.into_summary()
    }

    fn check_requirements(&self, descriptor: &TestDescriptor) -> Result<()> {
        if self.config.check_root && descriptor.needs_root && !nix::unistd::geteuid().is_root() {
            return Err(Error::unsupported("Test needs root"));
        }

        if self.config.check_kernel {
            if let Some(min) = descriptor.min_kver {
                let running = KernelVersion::running()?;
                debug!(running = %running, required = %min, "Kernel version");
                if !descriptor.kernel_supported(running) {
                    return Err(Error::unsupported(format!(
                        "Test needs kernel {min} or newer, running {running}"
                    )));
                }
            }
        }

        Ok(())
    }
}
