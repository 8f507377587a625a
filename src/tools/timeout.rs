//! Execution Timeout Management
//!
//! Every child process runs under a wall-clock bound. Tools share one base
//! timeout; long-running tools scale it by a fixed multiplier, and callers
//! may override the result per call.

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, error::Elapsed};

/// Base timeout for tool execution in seconds (10 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Execution timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeout {
    duration: Duration,
}

impl Default for ExecutionTimeout {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

impl ExecutionTimeout {
    /// Create a new execution timeout
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use kali_mcp::tools::ExecutionTimeout;
    ///
    /// let timeout = ExecutionTimeout::new(Duration::from_secs(30));
    /// assert_eq!(timeout.as_secs(), 30);
    /// ```
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Create a timeout from seconds
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Get the timeout duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds, as echoed back to callers
    pub fn as_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Execute a future with this timeout
    ///
    /// Returns `Err(Elapsed)` if the deadline passes first; the future is
    /// dropped at that point.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Elapsed>
    where
        F: Future,
    {
        time::timeout(self.duration, future).await
    }
}

/// Maps a tool's multiplier and an optional caller override to a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    base: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

impl TimeoutPolicy {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn base(&self) -> ExecutionTimeout {
        ExecutionTimeout::new(self.base)
    }

    /// Default timeout for a tool with the given multiplier
    pub fn scaled(&self, multiplier: u32) -> ExecutionTimeout {
        ExecutionTimeout::new(self.base.saturating_mul(multiplier))
    }

    /// The caller's override in seconds if given, else the scaled default
    pub fn resolve(&self, multiplier: u32, override_secs: Option<u64>) -> ExecutionTimeout {
        match override_secs {
            Some(secs) => ExecutionTimeout::from_secs(secs),
            None => self.scaled(multiplier),
        }
    }
}
