//! Records produced by the shell-session recorder.

use chrono::{DateTime, Utc};

/// One command observed inside a recorded shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCommand {
    /// When the prompt hook fired.
    pub timestamp: DateTime<Utc>,
    /// Working directory the command ran in.
    pub cwd: String,
    /// The command line as typed.
    pub command: String,
}

impl CapturedCommand {
    /// Key used for deduplication: repeated `(cwd, command)` pairs collapse
    /// to the first occurrence.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.cwd.as_str(), self.command.as_str())
    }
}
