//! Process Execution Core
//!
//! Everything needed to turn a tool call into a bounded child process and
//! back into text.
//!
//! # Architecture
//!
//! - `executor.rs`: invocation specs, the [`CommandRunner`] seam, and the
//!   tokio-backed [`ProcessRunner`]
//! - `timeout.rs`: base timeout, per-tool multipliers, caller overrides
//! - `args.rs`: output-flag detection and injection for caller arguments
//! - `report.rs`: outcome-to-text rendering
//! - `error.rs`: [`ToolError`]
//!
//! # Example
//!
//! ```no_run
//! use kali_mcp::tools::{CommandLine, CommandRunner, ExecutionTimeout, ExitPolicy, InvocationSpec, ProcessRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let spec = InvocationSpec::new(
//!         CommandLine::argv("nmap", ["-sV", "10.0.0.5"]),
//!         ExecutionTimeout::from_secs(60),
//!         ExitPolicy::Check,
//!     );
//!     let outcome = ProcessRunner::new().run(&spec).await;
//!     println!("{}", outcome.status());
//! }
//! ```

mod args;
mod error;
mod executor;
mod report;
mod timeout;

#[cfg(test)]
pub(crate) mod testing;

pub use args::{find_output_flag, inject_output, CallerOutput};
pub use error::ToolError;
pub use executor::{
    CommandLine, CommandRunner, ExecutionOutcome, ExitPolicy, InvocationSpec, ProcessRunner,
};
pub use report::{Body, Location, Report, OUTPUT_FILE_MISSING};
pub use timeout::{ExecutionTimeout, TimeoutPolicy, DEFAULT_TIMEOUT_SECS};
