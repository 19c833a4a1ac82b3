//! Single-command execution primitive.
//!
//! `Executor::exec` runs one command: danger check, shell dispatch, working
//! directory and environment resolution, output capture, and cancellation.
//! Streaming mode drains stdout and stderr concurrently, line-buffered, into
//! one combined buffer in arrival order; there is no interleaving guarantee
//! between the two streams beyond line atomicity.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gitsavvy_types::Shell;
use gitsavvy_util::redact_sensitive;

use crate::danger::{DangerChecker, DangerInfo};
use crate::prompt::DangerPrompt;

/// Exit code reported when the user declines a danger prompt or quits a
/// confirmation.
pub const EXIT_DECLINED: i32 = 13;

/// Exit code reported when placeholder substitution finds unresolved names.
pub const EXIT_MISSING_PLACEHOLDER: i32 = 21;

/// Receives output lines as they arrive. Implementations must not block for
/// long: they run on the pipe-draining task.
pub trait OutputSink: Send {
    /// One line, without its trailing newline.
    fn line(&mut self, line: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&mut self, _line: &str) {}
}

/// Sink that collects lines, for tests and buffered callers.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Collected lines in arrival order.
    pub lines: Vec<String>,
}

impl OutputSink for VecSink {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Configuration for one `exec` call.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    /// Command text to run.
    pub command: String,
    /// Shell to dispatch through; `None` tokenizes into an argv and execs
    /// directly.
    pub shell: Option<Shell>,
    /// Working directory; empty means inherit.
    pub cwd: Option<std::path::PathBuf>,
    /// Environment merged onto the parent's, later entries winning.
    pub env: Vec<(String, String)>,
    /// Forward lines to the sink as they arrive.
    pub stream: bool,
}

/// Result of one `exec` call.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The command as requested.
    pub command: String,
    /// Exit code; 13 means declined, non-zero otherwise comes from the OS.
    pub exit_code: i32,
    /// `exit_code == 0` and no spawn/read error.
    pub success: bool,
    /// Combined stdout and stderr, line-buffered in arrival order.
    pub output: String,
    /// Wall-clock duration of the call.
    pub duration: Duration,
    /// Whether the danger checker matched.
    pub dangerous: bool,
    /// Matched rule details, when dangerous.
    pub danger: Option<DangerInfo>,
    /// Whether cancellation stopped the command.
    pub canceled: bool,
    /// Spawn or wait failure, surfaced verbatim.
    pub error: Option<String>,
}

impl ExecResult {
    fn for_command(command: &str) -> Self {
        Self {
            command: command.to_string(),
            exit_code: 0,
            success: false,
            output: String::new(),
            duration: Duration::ZERO,
            dangerous: false,
            danger: None,
            canceled: false,
            error: None,
        }
    }
}

/// Runs single commands with danger checking and cancellation.
#[derive(Default)]
pub struct Executor {
    danger: Option<DangerChecker>,
    danger_prompt: Option<Arc<dyn DangerPrompt>>,
    auto_confirm: bool,
}

impl Executor {
    /// Executor with no danger checking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a danger checker and the prompt used when a rule matches.
    pub fn with_danger(mut self, checker: DangerChecker, prompt: Arc<dyn DangerPrompt>) -> Self {
        self.danger = Some(checker);
        self.danger_prompt = Some(prompt);
        self
    }

    /// In auto-confirm mode dangerous commands warn and proceed instead of
    /// prompting.
    pub fn auto_confirm(mut self, enabled: bool) -> Self {
        self.auto_confirm = enabled;
        self
    }

    /// Run one command to completion (or cancellation).
    pub async fn exec(&self, cancel: &CancellationToken, config: &ExecConfig, sink: &mut dyn OutputSink) -> ExecResult {
        let started = Instant::now();
        let mut result = ExecResult::for_command(&config.command);

        if let Some(checker) = &self.danger
            && let Some(danger) = checker.check(&config.command)
        {
            result.dangerous = true;
            if self.auto_confirm {
                warn!(rule = %danger.name, command = %danger.command, "dangerous command allowed by auto-confirm");
                result.danger = Some(danger);
            } else {
                let answer = match &self.danger_prompt {
                    Some(prompt) => prompt.confirm_danger(&danger),
                    None => Ok(false),
                };
                result.danger = Some(danger);
                match answer {
                    Ok(true) => {}
                    Ok(false) => {
                        result.exit_code = EXIT_DECLINED;
                        result.error = Some("dangerous command declined".into());
                        result.duration = started.elapsed();
                        return result;
                    }
                    Err(error) => {
                        result.exit_code = 1;
                        result.error = Some(format!("failed to read confirmation: {error}"));
                        result.duration = started.elapsed();
                        return result;
                    }
                }
            }
        }

        let mut command = match build_command(config) {
            Ok(command) => command,
            Err(message) => {
                result.exit_code = 1;
                result.error = Some(message);
                result.duration = started.elapsed();
                return result;
            }
        };

        debug!(command = %redact_sensitive(&config.command), shell = ?config.shell, "spawning");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                result.exit_code = 1;
                result.error = Some(format!("failed to spawn command: {error}"));
                result.duration = started.elapsed();
                return result;
            }
        };

        let mut stdout_lines = BufReader::new(child.stdout.take().expect("stdout piped")).lines();
        let mut stderr_lines = BufReader::new(child.stderr.take().expect("stderr piped")).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !(stdout_done && stderr_done) && !result.canceled {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => match line {
                    Ok(Some(text)) => push_line(&mut result.output, &text, config.stream, sink),
                    _ => stdout_done = true,
                },
                line = stderr_lines.next_line(), if !stderr_done => match line {
                    Ok(Some(text)) => push_line(&mut result.output, &text, config.stream, sink),
                    _ => stderr_done = true,
                },
                _ = cancel.cancelled() => result.canceled = true,
            }
        }

        if result.canceled {
            // Kill the whole child; the reported exit code is whatever the
            // platform yields for a killed process.
            let _ = child.start_kill();
        }

        let status = if result.canceled {
            child.wait().await
        } else {
            let waited = tokio::select! {
                status = child.wait() => Some(status),
                _ = cancel.cancelled() => None,
            };
            match waited {
                Some(status) => status,
                None => {
                    result.canceled = true;
                    let _ = child.start_kill();
                    child.wait().await
                }
            }
        };

        match status {
            Ok(status) => {
                result.exit_code = exit_code_of(status);
            }
            Err(error) => {
                result.exit_code = 1;
                result.error = Some(format!("failed to wait for command: {error}"));
            }
        }

        result.success = result.exit_code == 0 && result.error.is_none() && !result.canceled;
        result.duration = started.elapsed();
        result
    }
}

fn push_line(output: &mut String, line: &str, stream: bool, sink: &mut dyn OutputSink) {
    output.push_str(line);
    output.push('\n');
    if stream {
        sink.line(line);
    }
}

fn build_command(config: &ExecConfig) -> Result<Command, String> {
    let mut command = match config.shell {
        Some(shell) => {
            let mut command = Command::new(shell.program());
            command.arg("-c").arg(&config.command);
            command
        }
        None => {
            let mut parts = config.command.split_whitespace();
            let Some(program) = parts.next() else {
                return Err("empty command".to_string());
            };
            let mut command = Command::new(program);
            command.args(parts);
            command
        }
    };

    if let Some(cwd) = &config.cwd
        && !cwd.as_os_str().is_empty()
    {
        command.current_dir(cwd);
    }
    for (key, value) in &config.env {
        command.env(key, value);
    }

    command.stdin(Stdio::inherit()).stdout(Stdio::piped()).stderr(Stdio::piped());
    command.kill_on_drop(true);
    Ok(command)
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{AcceptAll, DeclineAll};

    fn sh(command: &str) -> ExecConfig {
        ExecConfig {
            command: command.to_string(),
            shell: Some(Shell::Sh),
            ..ExecConfig::default()
        }
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let result = executor.exec(&CancellationToken::new(), &sh("echo hi"), &mut sink).await;
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("hi"));
        assert!(!result.dangerous);
    }

    #[tokio::test]
    async fn merges_stdout_and_stderr() {
        let executor = Executor::new();
        let mut sink = VecSink::default();
        let config = ExecConfig {
            stream: true,
            ..sh("echo out; echo err 1>&2")
        };
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        assert!(result.success);
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
        assert!(sink.lines.iter().any(|line| line == "out"));
        assert!(sink.lines.iter().any(|line| line == "err"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure_with_output_kept() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let result = executor
            .exec(&CancellationToken::new(), &sh("echo tail; exit 3"), &mut sink)
            .await;
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert!(result.output.contains("tail"));
    }

    #[tokio::test]
    async fn direct_exec_tokenizes_argv() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let config = ExecConfig {
            command: "echo plain words".into(),
            shell: None,
            ..ExecConfig::default()
        };
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        assert!(result.success);
        assert!(result.output.contains("plain words"));
    }

    #[tokio::test]
    async fn empty_direct_command_errors() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let config = ExecConfig {
            command: "   ".into(),
            shell: None,
            ..ExecConfig::default()
        };
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
        assert!(result.error.as_deref().unwrap_or_default().contains("empty command"));
    }

    #[tokio::test]
    async fn env_pairs_reach_the_child_with_later_wins() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let config = ExecConfig {
            env: vec![
                ("GITSAVVY_TEST_VAR".into(), "first".into()),
                ("GITSAVVY_TEST_VAR".into(), "second".into()),
            ],
            ..sh("echo value=$GITSAVVY_TEST_VAR")
        };
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        assert!(result.output.contains("value=second"));
    }

    #[tokio::test]
    async fn cwd_changes_the_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new();
        let mut sink = NullSink;
        let config = ExecConfig {
            cwd: Some(dir.path().to_path_buf()),
            ..sh("pwd")
        };
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        // Symlinked temp dirs report their resolved path; match the suffix.
        let reported = result.output.trim();
        let expected = dir.path().file_name().unwrap().to_string_lossy();
        assert!(reported.ends_with(expected.as_ref()));
    }

    #[tokio::test]
    async fn declined_danger_returns_thirteen_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let witness = dir.path().join("ran");
        let executor = Executor::new().with_danger(DangerChecker::default(), Arc::new(DeclineAll));
        let mut sink = NullSink;
        let config = sh(&format!("rm -rf / ; touch {}", witness.display()));
        let result = executor.exec(&CancellationToken::new(), &config, &mut sink).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, EXIT_DECLINED);
        assert!(result.dangerous);
        assert_eq!(result.danger.as_ref().unwrap().name, "Recursive delete");
        assert!(!witness.exists(), "declined command must not execute");
    }

    #[tokio::test]
    async fn accepted_danger_runs_the_command() {
        let executor = Executor::new().with_danger(DangerChecker::default(), Arc::new(AcceptAll));
        let mut sink = NullSink;
        // Matches the recursive-delete pattern but only echoes.
        let result = executor
            .exec(&CancellationToken::new(), &sh("echo rm -rf /"), &mut sink)
            .await;
        assert!(result.dangerous);
        assert!(result.success);
    }

    #[tokio::test]
    async fn auto_confirm_warns_and_proceeds() {
        let executor = Executor::new()
            .with_danger(DangerChecker::default(), Arc::new(DeclineAll))
            .auto_confirm(true);
        let mut sink = NullSink;
        let result = executor
            .exec(&CancellationToken::new(), &sh("echo rm -rf /"), &mut sink)
            .await;
        assert!(result.dangerous);
        assert!(result.success, "auto-confirm proceeds past the prompt");
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let executor = Executor::new();
        let mut sink = NullSink;
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });
        let started = Instant::now();
        let result = executor.exec(&cancel, &sh("sleep 30"), &mut sink).await;
        assert!(result.canceled);
        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
