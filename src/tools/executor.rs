//! Process Runner
//!
//! Launches one child process per invocation, bounds it with a wall-clock
//! timeout, captures stdout/stderr, and classifies the result into an
//! [`ExecutionOutcome`].
//!
//! Two launch paths exist:
//!
//! - [`CommandLine::Shell`]: the raw string is handed to `sh -c`. Used only by
//!   the operator shell tool; no escaping is applied.
//! - [`CommandLine::Argv`]: program plus argument vector, no shell in between.

use super::error::ToolError;
use super::timeout::ExecutionTimeout;
use crate::metrics;
use async_trait::async_trait;
use prometheus::IntGauge;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

/// What to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Raw shell string, interpreted by the platform shell
    Shell(String),

    /// Program and argument vector, executed directly
    Argv { program: String, args: Vec<String> },
}

impl CommandLine {
    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Argv {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Name used in logs and launch-error messages
    pub fn program(&self) -> &str {
        match self {
            Self::Shell(_) => SHELL,
            Self::Argv { program, .. } => program,
        }
    }

    /// Argument vector, empty for shell strings
    pub fn args(&self) -> &[String] {
        match self {
            Self::Shell(_) => &[],
            Self::Argv { args, .. } => args,
        }
    }

    fn to_command(&self) -> TokioCommand {
        match self {
            Self::Shell(script) => {
                let mut cmd = TokioCommand::new(SHELL);
                cmd.arg(SHELL_FLAG).arg(script);
                cmd
            }
            Self::Argv { program, args } => {
                let mut cmd = TokioCommand::new(program);
                cmd.args(args);
                cmd
            }
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(script) => write!(f, "{SHELL} {SHELL_FLAG} {script:?}"),
            Self::Argv { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(not(windows))]
const SHELL: &str = "sh";
#[cfg(not(windows))]
const SHELL_FLAG: &str = "-c";
#[cfg(windows)]
const SHELL: &str = "cmd";
#[cfg(windows)]
const SHELL_FLAG: &str = "/C";

/// How the runner treats a non-zero exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Non-zero exit becomes [`ExecutionOutcome::NonZeroExit`]
    Check,

    /// Exit status is ignored; only launch failure or timeout short-circuit
    Ignore,
}

/// One child-process invocation, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub command: CommandLine,
    pub working_dir: Option<PathBuf>,
    pub timeout: ExecutionTimeout,
    pub exit_policy: ExitPolicy,
}

impl InvocationSpec {
    pub fn new(command: CommandLine, timeout: ExecutionTimeout, exit_policy: ExitPolicy) -> Self {
        Self {
            command,
            working_dir: None,
            timeout,
            exit_policy,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

/// Classified result of running an [`InvocationSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Process finished (with exit 0, or under [`ExitPolicy::Ignore`])
    Success {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
        elapsed: Duration,
    },

    /// Deadline passed and the child was killed
    ///
    /// `read_back` carries best-effort output recovered by a follow-up
    /// invocation, when a tool performs one.
    TimedOut {
        timeout: ExecutionTimeout,
        elapsed: Duration,
        read_back: Option<String>,
    },

    /// Process exited non-zero under [`ExitPolicy::Check`]
    NonZeroExit {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Process could not be started, or its output could not be collected
    LaunchError { program: String, cause: String },
}

impl ExecutionOutcome {
    /// Short label used for metrics and logs
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::TimedOut { .. } => "timeout",
            Self::NonZeroExit { .. } => "non_zero_exit",
            Self::LaunchError { .. } => "launch_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Captured stdout on success
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::Success { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Attach recovered output to a timeout; other outcomes pass through
    pub fn with_read_back(self, text: Option<String>) -> Self {
        match self {
            Self::TimedOut {
                timeout, elapsed, ..
            } => Self::TimedOut {
                timeout,
                elapsed,
                read_back: text,
            },
            other => other,
        }
    }
}

/// Executes invocation specs
///
/// [`ProcessRunner`] is the real implementation; tests substitute doubles
/// that record specs and return scripted outcomes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion or timeout, blocking the calling request
    async fn run(&self, spec: &InvocationSpec) -> ExecutionOutcome;

    /// Start a program without waiting for it, stdout/stderr to `log_file`
    ///
    /// Returns the child's process id when known.
    fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
        log_file: &Path,
    ) -> Result<Option<u32>, ToolError>;
}

/// Tokio-backed process runner
#[derive(Clone)]
pub struct ProcessRunner {
    active: IntGauge,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::with_active_gauge(metrics::CHILD_PROCESSES_ACTIVE.clone())
    }

    /// Count live children on `gauge` instead of the process-wide metric
    pub fn with_active_gauge(gauge: IntGauge) -> Self {
        Self { active: gauge }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// One slot of the active-children gauge, released on drop
///
/// The wait future may be dropped mid-flight (client disconnect), so the
/// decrement cannot sit after the `.await`.
struct ActiveChild(IntGauge);

impl ActiveChild {
    fn track(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for ActiveChild {
    fn drop(&mut self) {
        self.0.dec();
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &InvocationSpec) -> ExecutionOutcome {
        let start = Instant::now();
        let program = spec.command.program().to_string();

        debug!(command = %spec.command, timeout_secs = spec.timeout.as_secs(), "Launching child process");

        let mut process = spec.command.to_command();
        if let Some(ref dir) = spec.working_dir {
            process.current_dir(dir);
        }
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child
            .kill_on_drop(true);

        let child = match process.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn process {}: {}", program, e);
                return ExecutionOutcome::LaunchError {
                    program,
                    cause: e.to_string(),
                };
            }
        };

        let active = ActiveChild::track(&self.active);
        let waited = spec.timeout.run(child.wait_with_output()).await;
        drop(active);

        let elapsed = start.elapsed();
        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Failed to collect output of {}: {}", program, e);
                return ExecutionOutcome::LaunchError {
                    program,
                    cause: e.to_string(),
                };
            }
            Err(_) => {
                warn!("{} timed out after {:?}", program, spec.timeout.duration());
                metrics::CHILD_PROCESS_TIMEOUTS_TOTAL.inc();
                return ExecutionOutcome::TimedOut {
                    timeout: spec.timeout,
                    elapsed,
                    read_back: None,
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code();

        if output.status.success() || spec.exit_policy == ExitPolicy::Ignore {
            info!("{} finished (exit code: {:?}, {:?})", program, exit_code, elapsed);
            ExecutionOutcome::Success {
                stdout,
                stderr,
                exit_code,
                elapsed,
            }
        } else {
            warn!("{} failed (exit code: {:?})", program, exit_code);
            ExecutionOutcome::NonZeroExit {
                exit_code,
                stdout,
                stderr,
            }
        }
    }

    fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
        log_file: &Path,
    ) -> Result<Option<u32>, ToolError> {
        let stdout = File::create(log_file).map_err(|e| ToolError::io(log_file, e))?;
        let stderr = stdout.try_clone().map_err(|e| ToolError::io(log_file, e))?;

        // No kill_on_drop: the child outlives this call and is reaped by the runtime
        let child = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| ToolError::Launch {
                program: program.to_string(),
                source,
            })?;

        let pid = child.id();
        info!(program, pid = ?pid, log = %log_file.display(), "Started background process");
        metrics::BACKGROUND_LAUNCHES_TOTAL.inc();
        Ok(pid)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(command: CommandLine, secs: u64, policy: ExitPolicy) -> InvocationSpec {
        InvocationSpec::new(command, ExecutionTimeout::from_secs(secs), policy)
    }

    #[tokio::test]
    async fn test_shell_echo() {
        let outcome = ProcessRunner::new()
            .run(&spec(CommandLine::Shell("echo hi".into()), 10, ExitPolicy::Check))
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout(), Some("hi\n"));
    }

    #[tokio::test]
    async fn test_shell_metacharacters_are_interpreted() {
        let outcome = ProcessRunner::new()
            .run(&spec(
                CommandLine::Shell("echo one; echo two | tr a-z A-Z".into()),
                10,
                ExitPolicy::Check,
            ))
            .await;

        assert_eq!(outcome.stdout(), Some("one\nTWO\n"));
    }

    #[tokio::test]
    async fn test_argv_is_not_shell_interpreted() {
        let outcome = ProcessRunner::new()
            .run(&spec(
                CommandLine::argv("echo", ["test; rm -rf /tmp/nothing"]),
                10,
                ExitPolicy::Check,
            ))
            .await;

        assert_eq!(outcome.stdout(), Some("test; rm -rf /tmp/nothing\n"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_checked() {
        let outcome = ProcessRunner::new()
            .run(&spec(
                CommandLine::Shell("echo boom >&2; exit 3".into()),
                10,
                ExitPolicy::Check,
            ))
            .await;

        match outcome {
            ExecutionOutcome::NonZeroExit {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_ignored() {
        let outcome = ProcessRunner::new()
            .run(&spec(
                CommandLine::Shell("echo partial; exit 1".into()),
                10,
                ExitPolicy::Ignore,
            ))
            .await;

        match outcome {
            ExecutionOutcome::Success {
                stdout, exit_code, ..
            } => {
                assert_eq!(stdout, "partial\n");
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let started = Instant::now();
        let outcome = ProcessRunner::new()
            .run(&spec(CommandLine::argv("sleep", ["10"]), 1, ExitPolicy::Ignore))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        match outcome {
            ExecutionOutcome::TimedOut {
                timeout, read_back, ..
            } => {
                assert_eq!(timeout.as_secs(), 1);
                assert!(read_back.is_none());
            }
            other => panic!("expected TimedOut, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_releases_active_gauge() {
        let gauge = IntGauge::new("test_active_children", "test").unwrap();
        let runner = ProcessRunner::with_active_gauge(gauge.clone());
        let sleeper = spec(CommandLine::argv("sleep", ["10"]), 30, ExitPolicy::Ignore);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(200), runner.run(&sleeper)).await;
        assert!(cancelled.is_err());
        assert_eq!(gauge.get(), 0);

        runner
            .run(&spec(CommandLine::Shell("true".into()), 10, ExitPolicy::Check))
            .await;
        assert_eq!(gauge.get(), 0);
    }

    #[tokio::test]
    async fn test_launch_error() {
        let outcome = ProcessRunner::new()
            .run(&spec(
                CommandLine::argv("this-command-does-not-exist-12345", Vec::<String>::new()),
                10,
                ExitPolicy::Check,
            ))
            .await;

        match outcome {
            ExecutionOutcome::LaunchError { program, .. } => {
                assert_eq!(program, "this-command-does-not-exist-12345");
            }
            other => panic!("expected LaunchError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_working_directory() {
        let temp = TempDir::new().unwrap();
        let outcome = ProcessRunner::new()
            .run(
                &spec(CommandLine::argv("pwd", Vec::<String>::new()), 10, ExitPolicy::Check)
                    .with_working_dir(Some(temp.path().to_path_buf())),
            )
            .await;

        let stdout = outcome.stdout().unwrap().trim().to_string();
        let expected = temp.path().canonicalize().unwrap();
        assert_eq!(PathBuf::from(stdout).canonicalize().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_spawn_detached_writes_log() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("bg.log");

        let pid = ProcessRunner::new()
            .spawn_detached("echo", &["background".to_string()], &log)
            .unwrap();
        assert!(pid.is_some());

        for _ in 0..50 {
            if std::fs::read_to_string(&log).unwrap_or_default().contains("background") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background output never reached the log file");
    }

    #[tokio::test]
    async fn test_spawn_detached_missing_program() {
        let temp = TempDir::new().unwrap();
        let err = ProcessRunner::new()
            .spawn_detached("this-command-does-not-exist-12345", &[], &temp.path().join("x.log"))
            .unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }

    #[test]
    fn test_with_read_back_only_touches_timeouts() {
        let timed_out = ExecutionOutcome::TimedOut {
            timeout: ExecutionTimeout::from_secs(5),
            elapsed: Duration::from_secs(5),
            read_back: None,
        }
        .with_read_back(Some("hash:pw".into()));
        assert!(matches!(
            timed_out,
            ExecutionOutcome::TimedOut { read_back: Some(ref t), .. } if t == "hash:pw"
        ));

        let success = ExecutionOutcome::Success {
            stdout: "x".into(),
            stderr: String::new(),
            exit_code: Some(0),
            elapsed: Duration::ZERO,
        };
        assert_eq!(success.clone().with_read_back(Some("y".into())), success);
    }

    #[test]
    fn test_command_line_display() {
        let cmd = CommandLine::argv("nmap", ["-oX", "/tmp/a.xml", "10.0.0.5"]);
        assert_eq!(cmd.to_string(), "nmap -oX /tmp/a.xml 10.0.0.5");
        assert_eq!(cmd.program(), "nmap");
        assert_eq!(cmd.args().len(), 3);

        let shell = CommandLine::Shell("echo hi".into());
        assert_eq!(shell.program(), "sh");
        assert!(shell.args().is_empty());
    }
}
