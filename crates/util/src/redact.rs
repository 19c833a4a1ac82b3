//! Sensitive-value masking.
//!
//! Placeholder values marked `secret: true` must never appear in logs or
//! rendered output. The helpers here mask individual values and scrub
//! free-form text that looks like it carries credentials.

use once_cell::sync::Lazy;
use regex::Regex;

const MASK: &str = "********";

/// Replace a secret value with a fixed-width mask, keeping nothing of the
/// original. An empty value stays empty so prompts can distinguish
/// "unset" from "hidden".
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    MASK.to_string()
}

/// Redact values that look like secrets in free-form text, preserving key
/// names so log lines stay diagnosable.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|capture| capture.as_str()).unwrap_or("");
                format!("{prefix}{MASK}")
            })
            .to_string();
    }
    redacted
}

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Env-like KEY=VALUE assignments for KEY/TOKEN/SECRET/PASSWORD
        Regex::new(r"(?i)((?:[A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD))=)([^\s]+)").expect("env assignment pattern"),
        // key: value style labels
        Regex::new(r"(?i)((?:api[\s_-]?key|auth[\s_-]?token|token|secret|password)\s*[:=]\s*)([^\s,;]+)")
            .expect("labeled secret pattern"),
        // Bearer tokens in free text
        Regex::new(r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)").expect("bearer pattern"),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_non_empty_values() {
        assert_eq!(mask_secret("hunter2"), "********");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn redacts_env_assignments() {
        let redacted = redact_sensitive("DEPLOY_TOKEN=abc123 REGION=us-east-1");
        assert!(redacted.contains("DEPLOY_TOKEN=********"));
        assert!(redacted.contains("REGION=us-east-1"));
    }

    #[test]
    fn redacts_bearer_tokens() {
        let redacted = redact_sensitive("curl -H 'Authorization: Bearer abc.def.ghi'");
        assert!(!redacted.contains("abc.def.ghi"));
    }
}
