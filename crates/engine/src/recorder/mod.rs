//! Shell-session recorder.
//!
//! Recording spawns an interactive sub-shell with a prompt hook sourced into
//! it. The hook appends every accepted command to a unique temp file; when
//! the user exits the shell, the file is parsed, deduplicated, and deleted.
//! Prompt-hook capture is the only portable way to observe command execution
//! in an unmodified user shell without ptrace or a PTY intermediary.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use gitsavvy_types::{CapturedCommand, Shell};

pub mod capture;
pub mod convert;
pub mod hooks;

pub use capture::{CAPTURE_FILE_ENV, CAPTURE_SEPARATOR, COMMAND_BLOCKLIST, parse_capture_content, parse_capture_file};
pub use convert::{WorkflowSeed, commands_to_workflow};
pub use hooks::hook_script;

/// Errors surfaced by recording sessions.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Only bash and zsh expose the prompt hooks recording needs.
    #[error("recording is not supported for {0}")]
    UnsupportedShell(Shell),
    /// Temp-file creation or hook-script write failed.
    #[error("failed to prepare recording session: {0}")]
    Setup(#[source] std::io::Error),
    /// The sub-shell could not be spawned.
    #[error("failed to start {shell}: {source}")]
    Spawn {
        /// Shell that failed to start.
        shell: Shell,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// Waiting on the sub-shell failed with a non-exit OS error.
    #[error("shell session failed: {0}")]
    Wait(#[source] std::io::Error),
    /// The capture file never appeared; the hook did not run.
    #[error("capture file missing at {}", path.display())]
    CaptureMissing {
        /// Expected capture-file location.
        path: PathBuf,
    },
    /// The capture file exists but could not be read.
    #[error("failed to read capture file {}: {source}", path.display())]
    CaptureRead {
        /// Capture-file location.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The session ended with zero usable commands.
    #[error("no commands were captured")]
    NothingCaptured,
}

/// Commands captured by one recording session.
#[derive(Debug, Clone)]
pub struct RecordedSession {
    /// Shell the session ran in.
    pub shell: Shell,
    /// Deduplicated commands in first-seen order.
    pub commands: Vec<CapturedCommand>,
}

/// Shell to record with, from `$SHELL`, falling back to bash.
pub fn detect_recording_shell() -> Shell {
    std::env::var("SHELL")
        .ok()
        .and_then(|shell| Shell::from_name(&shell))
        .unwrap_or(Shell::Bash)
}

/// Run an interactive recording session to completion.
///
/// The sub-shell inherits this process's stdio and runs in the foreground.
/// A non-zero exit code from the shell is not an error — the user may have
/// ended the session with a failing command — only a non-exit OS failure is.
pub async fn record_session(shell: Shell) -> Result<RecordedSession, RecorderError> {
    let capture_file = tempfile::Builder::new()
        .prefix("gitsavvy-capture-")
        .suffix(".log")
        .tempfile()
        .map_err(RecorderError::Setup)?;
    let (_, capture_path) = capture_file.keep().map_err(|error| RecorderError::Setup(error.error))?;

    let script = hook_script(shell, &capture_path)?;
    let mut hook_file = tempfile::Builder::new()
        .prefix("gitsavvy-hook-")
        .suffix(".sh")
        .tempfile()
        .map_err(RecorderError::Setup)?;
    hook_file.write_all(script.as_bytes()).map_err(RecorderError::Setup)?;
    hook_file.flush().map_err(RecorderError::Setup)?;
    let hook_path = hook_file.path().to_path_buf();

    info!(%shell, capture = %capture_path.display(), "recording session started");

    let mut command = match shell {
        Shell::Bash => {
            let mut command = Command::new("bash");
            command.arg("--rcfile").arg(&hook_path).arg("-i");
            command
        }
        Shell::Zsh => {
            let mut command = Command::new("zsh");
            command
                .arg("-i")
                .arg("-c")
                .arg(format!("source {}; exec zsh", hook_path.display()));
            command
        }
        other => return Err(RecorderError::UnsupportedShell(other)),
    };
    command.env(CAPTURE_FILE_ENV, &capture_path);

    let mut child = command.spawn().map_err(|source| RecorderError::Spawn { shell, source })?;
    let status = child.wait().await.map_err(RecorderError::Wait)?;
    debug!(code = ?status.code(), "recording shell exited");

    let commands = parse_capture_file(&capture_path)?;
    if commands.is_empty() {
        return Err(RecorderError::NothingCaptured);
    }

    info!(count = commands.len(), "recording session captured commands");
    Ok(RecordedSession { shell, commands })
}
