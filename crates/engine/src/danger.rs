//! Dangerous-command detection.
//!
//! Commands are matched against a built-in pattern table before they spawn.
//! A match does not block execution by itself; the executor decides whether
//! to warn (auto-confirm mode) or prompt. Rules can be suppressed by name
//! through the user's allowlist — the home-directory move rule in particular
//! matches any path containing `~/` and false-positives on legitimate moves.

use once_cell::sync::Lazy;
use regex::Regex;

/// One entry in the built-in risk table.
#[derive(Debug, Clone, Copy)]
pub struct DangerRule {
    /// Short rule name shown in prompts (`Recursive delete`).
    pub name: &'static str,
    /// What the command would do if it ran.
    pub risk: &'static str,
    /// Regex source matched against the full command text.
    pub pattern: &'static str,
}

/// Details of a matched dangerous command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerInfo {
    /// Rule name.
    pub name: String,
    /// Risk description.
    pub risk: String,
    /// Pattern that matched.
    pub pattern: String,
    /// The command that matched.
    pub command: String,
}

const RULES: &[DangerRule] = &[
    DangerRule {
        name: "Recursive delete",
        risk: "Recursively deletes from the filesystem root",
        pattern: r"\brm\s+-[a-zA-Z]*r[a-zA-Z]*\s+/\s*(?:[;&|]|$)",
    },
    DangerRule {
        name: "Device write",
        risk: "Writes raw bytes over a block device",
        pattern: r"\bdd\s+.*\bof=/dev/",
    },
    DangerRule {
        name: "Filesystem format",
        risk: "Formats a filesystem, destroying its contents",
        pattern: r"\bmkfs(\.\w+)?\b",
    },
    DangerRule {
        name: "Truncate file",
        risk: "Truncates a file to zero bytes",
        pattern: r"^\s*:?\s*>\s*\S+",
    },
    DangerRule {
        name: "System shutdown",
        risk: "Shuts down or reboots the machine immediately",
        pattern: r"\bshutdown\b.*\bnow\b|\breboot\b",
    },
    DangerRule {
        name: "Force branch delete",
        risk: "Deletes a git branch without a merge check",
        pattern: r"\bgit\s+branch\s+-D\b",
    },
    DangerRule {
        name: "Force push",
        risk: "Overwrites remote history",
        pattern: r"\bgit\s+push\s+.*--force\b",
    },
    DangerRule {
        name: "Open permissions",
        risk: "Makes files world-writable",
        pattern: r"\bchmod\s+-R\s+777\b",
    },
    DangerRule {
        name: "Zero permissions",
        risk: "Removes all permissions from a file",
        pattern: r"\bchmod\s+000\b",
    },
    DangerRule {
        name: "Move to home",
        risk: "Moves files into the home directory",
        pattern: r"\bmv\s+.*~/",
    },
];

static COMPILED_RULES: Lazy<Vec<(&'static DangerRule, Regex)>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| (rule, Regex::new(rule.pattern).expect("danger pattern compiles")))
        .collect()
});

/// Matches commands against the risk table, honoring the allowlist.
#[derive(Debug, Clone, Default)]
pub struct DangerChecker {
    allow: Vec<String>,
}

impl DangerChecker {
    /// Create a checker suppressing the named rules.
    pub fn new(allow: Vec<String>) -> Self {
        Self { allow }
    }

    /// Return the first matching rule, or `None` for a safe command.
    pub fn check(&self, command: &str) -> Option<DangerInfo> {
        for (rule, regex) in COMPILED_RULES.iter() {
            if self.allow.iter().any(|allowed| allowed.eq_ignore_ascii_case(rule.name)) {
                continue;
            }
            if regex.is_match(command) {
                return Some(DangerInfo {
                    name: rule.name.to_string(),
                    risk: rule.risk.to_string(),
                    pattern: rule.pattern.to_string(),
                    command: command.to_string(),
                });
            }
        }
        None
    }
}
