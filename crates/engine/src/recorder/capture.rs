//! Capture-file parsing.
//!
//! Each prompt-hook event appends one line: timestamp, working directory,
//! and command, separated by the unit separator byte `0x1F`. That byte
//! cannot appear in POSIX shell input, so commands containing pipes survive
//! intact; legacy `|`-separated lines are still accepted on read.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use gitsavvy_types::CapturedCommand;

use super::RecorderError;

/// Field separator written by the hook scripts.
pub const CAPTURE_SEPARATOR: char = '\u{1f}';

/// Environment variable carrying the capture-file path into the sub-shell.
pub const CAPTURE_FILE_ENV: &str = "GITSAVVY_CAPTURE_FILE";

/// Navigational and noise commands never worth recording.
pub const COMMAND_BLOCKLIST: &[&str] = &[
    "cd", "pushd", "popd", "dirs", "pwd", "ls", "la", "ll", "clear", "history", "exit", "logout", "jobs", "fg", "bg",
];

/// True when the command's first token is on the blocklist.
pub fn is_blocklisted(command: &str) -> bool {
    let first_token = command.split_whitespace().next().unwrap_or("");
    COMMAND_BLOCKLIST.contains(&first_token)
}

/// Parse capture-file content into deduplicated commands.
///
/// Malformed lines are skipped. Duplicate `(cwd, command)` pairs collapse to
/// the first occurrence, preserving first-seen order.
pub fn parse_capture_content(content: &str) -> Vec<CapturedCommand> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut commands = Vec::new();

    for line in content.lines() {
        let Some(captured) = parse_capture_line(line) else {
            continue;
        };
        if is_blocklisted(&captured.command) {
            continue;
        }
        let key = (captured.cwd.clone(), captured.command.clone());
        if seen.insert(key) {
            commands.push(captured);
        }
    }
    commands
}

/// Read, parse, and delete the capture file.
///
/// A missing file is a distinct error from an empty one: missing means the
/// hook never ran, empty means it ran and nothing survived the filters.
pub fn parse_capture_file(path: &Path) -> Result<Vec<CapturedCommand>, RecorderError> {
    if !path.exists() {
        return Err(RecorderError::CaptureMissing { path: path.to_path_buf() });
    }
    let content = fs::read_to_string(path).map_err(|source| RecorderError::CaptureRead {
        path: path.to_path_buf(),
        source,
    })?;
    let commands = parse_capture_content(&content);
    if let Err(error) = fs::remove_file(path) {
        debug!(path = %path.display(), "failed to remove capture file: {error}");
    }
    Ok(commands)
}

fn parse_capture_line(line: &str) -> Option<CapturedCommand> {
    if line.trim().is_empty() {
        return None;
    }

    let separator = if line.contains(CAPTURE_SEPARATOR) { CAPTURE_SEPARATOR } else { '|' };
    let mut fields = line.splitn(3, separator);
    let timestamp_field = fields.next()?;
    let cwd = fields.next()?;
    let command = fields.next()?.trim();

    let epoch_seconds: i64 = timestamp_field.trim().parse().ok()?;
    let timestamp = DateTime::<Utc>::from_timestamp(epoch_seconds, 0)?;

    if command.is_empty() {
        return None;
    }

    Some(CapturedCommand {
        timestamp,
        cwd: cwd.to_string(),
        command: command.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_separated_lines() {
        let content = "1700000000\u{1f}/tmp\u{1f}kubectl get pods\n";
        let commands = parse_capture_content(content);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].cwd, "/tmp");
        assert_eq!(commands[0].command, "kubectl get pods");
        assert_eq!(commands[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn accepts_legacy_pipe_separated_lines() {
        let content = "1700000000|/tmp|kubectl get pods\n\
                       1700000001|/tmp|kubectl get pods\n\
                       1700000002|/home|cd /tmp\n\
                       1700000003|/tmp|helm list\n";
        let commands = parse_capture_content(content);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "kubectl get pods");
        assert_eq!(commands[0].cwd, "/tmp");
        assert_eq!(commands[1].command, "helm list");
        assert_eq!(commands[1].cwd, "/tmp");
    }

    #[test]
    fn unit_separator_preserves_pipes_in_commands() {
        let content = "1700000000\u{1f}/srv\u{1f}ps aux | grep nginx | wc -l\n";
        let commands = parse_capture_content(content);
        assert_eq!(commands[0].command, "ps aux | grep nginx | wc -l");
    }

    #[test]
    fn skips_malformed_and_empty_lines() {
        let content = "\n\
                       not-a-timestamp\u{1f}/tmp\u{1f}echo hi\n\
                       1700000000\u{1f}/tmp\n\
                       1700000001\u{1f}/tmp\u{1f}   \n\
                       1700000002\u{1f}/tmp\u{1f}echo ok\n";
        let commands = parse_capture_content(content);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "echo ok");
    }

    #[test]
    fn dedup_is_global_and_first_seen() {
        let content = "1\u{1f}/a\u{1f}echo one\n\
                       2\u{1f}/b\u{1f}echo one\n\
                       3\u{1f}/a\u{1f}echo one\n\
                       4\u{1f}/a\u{1f}echo two\n";
        let commands = parse_capture_content(content);
        let keys: Vec<(&str, &str)> = commands.iter().map(|command| command.dedup_key()).collect();
        assert_eq!(keys, vec![("/a", "echo one"), ("/b", "echo one"), ("/a", "echo two")]);
    }

    #[test]
    fn blocklist_drops_navigation_noise() {
        for noisy in ["cd /tmp", "ls -la", "pwd", "exit", "history 20"] {
            assert!(is_blocklisted(noisy), "{noisy} should be blocklisted");
        }
        assert!(!is_blocklisted("git status"));
        assert!(!is_blocklisted("lsof -i :8080"));
    }

    #[test]
    fn missing_file_is_distinct_from_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.log");
        let error = parse_capture_file(&missing).expect_err("missing file");
        assert!(matches!(error, RecorderError::CaptureMissing { .. }));

        let empty = dir.path().join("empty.log");
        std::fs::write(&empty, "").unwrap();
        let commands = parse_capture_file(&empty).expect("empty file parses");
        assert!(commands.is_empty());
        assert!(!empty.exists(), "capture file is deleted after parsing");
    }
}
