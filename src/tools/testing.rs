//! Test double for [`CommandRunner`]

use super::{CommandRunner, ExecutionOutcome, ExecutionTimeout, InvocationSpec, ToolError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Records every invocation and replays scripted outcomes in order
///
/// When the script runs out, runs succeed with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    outcomes: Mutex<VecDeque<ExecutionOutcome>>,
    specs: Mutex<Vec<InvocationSpec>>,
    detached: Mutex<Vec<(String, Vec<String>, PathBuf)>>,
    fail_detached: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = ExecutionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing_detached() -> Self {
        Self {
            fail_detached: true,
            ..Self::default()
        }
    }

    pub fn specs(&self) -> Vec<InvocationSpec> {
        self.specs.lock().unwrap().clone()
    }

    pub fn detached(&self) -> Vec<(String, Vec<String>, PathBuf)> {
        self.detached.lock().unwrap().clone()
    }
}

pub fn success(stdout: &str) -> ExecutionOutcome {
    ExecutionOutcome::Success {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        elapsed: Duration::from_millis(1),
    }
}

pub fn timed_out(secs: u64) -> ExecutionOutcome {
    ExecutionOutcome::TimedOut {
        timeout: ExecutionTimeout::from_secs(secs),
        elapsed: Duration::from_secs(secs),
        read_back: None,
    }
}

pub fn non_zero(code: i32, stderr: &str) -> ExecutionOutcome {
    ExecutionOutcome::NonZeroExit {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn launch_error(program: &str) -> ExecutionOutcome {
    ExecutionOutcome::LaunchError {
        program: program.to_string(),
        cause: "No such file or directory (os error 2)".to_string(),
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &InvocationSpec) -> ExecutionOutcome {
        self.specs.lock().unwrap().push(spec.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| success(""))
    }

    fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
        log_file: &Path,
    ) -> Result<Option<u32>, ToolError> {
        if self.fail_detached {
            return Err(ToolError::Launch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        self.detached
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec(), log_file.to_path_buf()));
        Ok(Some(4242))
    }
}
