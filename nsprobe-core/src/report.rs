//! Test results with structured tracing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a reported result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultLevel {
    /// Check passed
    Pass,
    /// Check failed
    Fail,
    /// Test could not run to completion
    #[serde(rename = "BROK")]
    Broken,
    /// Something odd happened but the verdict stands
    Warn,
    /// Environment lacks a required facility
    Conf,
}

impl ResultLevel {
    /// Bit this level contributes to the process exit status
    #[must_use]
    pub const fn exit_bit(self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::Broken => 2,
            Self::Warn => 4,
            Self::Conf => 32,
        }
    }

    /// Short tag as printed in result lines
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Pass => "TPASS",
            Self::Fail => "TFAIL",
            Self::Broken => "TBROK",
            Self::Warn => "TWARN",
            Self::Conf => "TCONF",
        }
    }
}

impl fmt::Display for ResultLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One reported result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Result level
    pub level: ResultLevel,
    /// Human readable message
    pub message: String,
}

impl TestResult {
    /// Create a new result
    pub fn new(level: ResultLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Emit structured tracing event
    pub fn emit_trace(&self) {
        match self.level {
            ResultLevel::Pass => {
                tracing::info!(result = %self.level, "✅ {}", self.message);
            }
            ResultLevel::Fail | ResultLevel::Broken => {
                tracing::error!(result = %self.level, "❌ {}", self.message);
            }
            ResultLevel::Warn | ResultLevel::Conf => {
                tracing::warn!(result = %self.level, "⚠️  {}", self.message);
            }
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Collects results reported by a single test run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reporter {
    results: Vec<TestResult>,
}

impl Reporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result
    pub fn report(&mut self, level: ResultLevel, message: impl Into<String>) {
        let result = TestResult::new(level, message);
        result.emit_trace();
        self.results.push(result);
    }

    /// Record a passing result
    pub fn pass(&mut self, message: impl Into<String>) {
        self.report(ResultLevel::Pass, message);
    }

    /// Record a failing result
    pub fn fail(&mut self, message: impl Into<String>) {
        self.report(ResultLevel::Fail, message);
    }

    /// Record a configuration skip
    pub fn conf(&mut self, message: impl Into<String>) {
        self.report(ResultLevel::Conf, message);
    }

    /// All results in report order
    #[must_use]
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Number of results at the given level
    #[must_use]
    pub fn count(&self, level: ResultLevel) -> usize {
        self.results.iter().filter(|r| r.level == level).count()
    }

    /// Check if nothing has been reported yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the reporter into a summary
    #[must_use]
    pub fn into_summary(self) -> Summary {
        Summary {
            results: self.results,
        }
    }
}

/// Final outcome of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Results in report order
    pub results: Vec<TestResult>,
}

impl Summary {
    /// Number of results at the given level
    #[must_use]
    pub fn count(&self, level: ResultLevel) -> usize {
        self.results.iter().filter(|r| r.level == level).count()
    }

    /// Process exit status: the OR of every reported level's bit
    ///
    /// A run that reported nothing is broken.
    #[must_use]
    pub fn exit_status(&self) -> i32 {
        if self.results.is_empty() {
            return ResultLevel::Broken.exit_bit();
        }
        self.results
            .iter()
            .fold(0, |status, r| status | r.level.exit_bit())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  passed   {}", self.count(ResultLevel::Pass))?;
        writeln!(f, "  failed   {}", self.count(ResultLevel::Fail))?;
        writeln!(f, "  broken   {}", self.count(ResultLevel::Broken))?;
        writeln!(f, "  skipped  {}", self.count(ResultLevel::Conf))?;
        writeln!(f, "  warnings {}", self.count(ResultLevel::Warn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_counts() {
        let mut reporter = Reporter::new();
        assert!(reporter.is_empty());

        reporter.fail("parents have different inodes");
        reporter.fail("child and parent have same inode");
        reporter.pass("other");

        assert_eq!(reporter.count(ResultLevel::Fail), 2);
        assert_eq!(reporter.count(ResultLevel::Pass), 1);
        assert_eq!(reporter.results()[0].message, "parents have different inodes");
    }

    #[test]
    fn test_exit_status_bits() {
        let mut reporter = Reporter::new();
        reporter.pass("ok");
        assert_eq!(reporter.clone().into_summary().exit_status(), 0);

        reporter.fail("bad");
        reporter.conf("skipped");
        assert_eq!(reporter.into_summary().exit_status(), 1 | 32);
    }

    #[test]
    fn test_empty_summary_is_broken() {
        assert_eq!(Summary::default().exit_status(), 2);
    }

    #[test]
    fn test_level_serde() {
        let json = serde_json::to_string(&ResultLevel::Broken).unwrap();
        assert_eq!(json, "\"BROK\"");

        let level: ResultLevel = serde_json::from_str("\"CONF\"").unwrap();
        assert_eq!(level, ResultLevel::Conf);
    }

    #[test]
    fn test_result_display() {
        let result = TestResult::new(ResultLevel::Pass, "child and parent are consistent");
        assert_eq!(result.to_string(), "TPASS: child and parent are consistent");
    }
}
