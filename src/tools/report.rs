//! Result Formatter
//!
//! Turns an [`ExecutionOutcome`] into the single text payload returned to
//! the caller: a one-line status/location summary, then the captured output.
//! Rendering never fails; every failure state has a textual form.

use super::executor::ExecutionOutcome;
use std::path::{Path, PathBuf};

/// Placeholder when a tool was expected to write an output file but did not
pub const OUTPUT_FILE_MISSING: &str = "Output file does not exist";

/// Where the tool's output ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Nothing written to disk
    None,

    /// Computed artifact path injected by the server
    Artifact(String),

    /// Path supplied by the caller through their own output flag
    CallerSupplied(Option<String>),
}

impl Location {
    pub fn artifact(path: impl AsRef<Path>) -> Self {
        Self::Artifact(path.as_ref().display().to_string())
    }

    fn describe(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Artifact(path) => Some(path.clone()),
            Self::CallerSupplied(Some(path)) => Some(path.clone()),
            Self::CallerSupplied(None) => Some("the caller-specified output location".to_string()),
        }
    }
}

/// What follows the summary line on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Captured stdout and nothing else, no summary line
    RawStdout,

    /// Summary line, then captured stdout
    Stdout,

    /// Summary line, then the contents of a file the child wrote
    ArtifactFile(PathBuf),
}

/// Per-tool rendering rules
#[derive(Debug, Clone)]
pub struct Report {
    label: String,
    location: Location,
    body: Body,
    partial_hint: bool,
    advice: Option<String>,
    read_back_heading: String,
}

impl Report {
    /// `label` names the operation in messages, e.g. "Nmap scan"
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            location: Location::None,
            body: Body::Stdout,
            partial_hint: false,
            advice: None,
            read_back_heading: "Recovered output".to_string(),
        }
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// On timeout, say the run may have partially completed and point at the location
    pub fn partial_on_timeout(mut self) -> Self {
        self.partial_hint = true;
        self
    }

    /// Extra sentence appended to the timeout message
    pub fn timeout_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice = Some(advice.into());
        self
    }

    /// Heading printed above a timeout's recovered output
    pub fn read_back_heading(mut self, heading: impl Into<String>) -> Self {
        self.read_back_heading = heading.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Render an outcome to text
    pub async fn render(&self, outcome: &ExecutionOutcome) -> String {
        match outcome {
            ExecutionOutcome::Success { stdout, .. } => self.render_success(stdout).await,
            ExecutionOutcome::TimedOut {
                timeout, read_back, ..
            } => self.render_timeout(timeout.as_secs(), read_back.as_deref()),
            ExecutionOutcome::NonZeroExit { stderr, .. } => {
                format!("{} error: {}", self.label, stderr)
            }
            ExecutionOutcome::LaunchError { cause, .. } => {
                format!("{} error: {}", self.label, cause)
            }
        }
    }

    async fn render_success(&self, stdout: &str) -> String {
        let summary = self.summary();
        match &self.body {
            Body::RawStdout => stdout.to_string(),
            Body::Stdout => format!("{summary}\n\n{stdout}"),
            Body::ArtifactFile(path) => {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .unwrap_or_else(|_| OUTPUT_FILE_MISSING.to_string());
                format!("{summary}\n\n{contents}")
            }
        }
    }

    fn summary(&self) -> String {
        match self.location.describe() {
            Some(location) => format!("{} completed, output saved to {}", self.label, location),
            None => format!("{} completed", self.label),
        }
    }

    fn render_timeout(&self, secs: u64, read_back: Option<&str>) -> String {
        let mut text = format!("{} timed out (exceeded {} seconds)", self.label, secs);
        if self.partial_hint {
            text.push_str(", but may have partially completed");
            if let Some(location) = self.location.describe() {
                text.push_str(&format!(". Check {location}"));
            }
        }
        if let Some(ref advice) = self.advice {
            text.push_str(". ");
            text.push_str(advice);
        }
        if let Some(recovered) = read_back {
            text.push_str(&format!("\n{}:\n{}", self.read_back_heading, recovered));
        }
        text
    }
}
