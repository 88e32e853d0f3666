//! nsprobe core - result reporting, errors, and test descriptors
//!
//! This crate provides the harness-side abstractions every nsprobe test uses.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod descriptor;
pub mod error;
pub mod report;
pub mod types;

pub use descriptor::{KernelVersion, TestDescriptor, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use report::{Reporter, ResultLevel, Summary, TestResult};
pub use types::ProcessId;
