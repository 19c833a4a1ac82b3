//! Validation helpers shared across placeholder consumers.
//!
//! These routines ensure that values bound to placeholders at run time obey
//! the declarative `validate` pattern supplied in the workflow document.

use regex::Regex;

/// Validate a candidate value against a placeholder's regex pattern.
///
/// Patterns are checked for compilability at workflow load time, so a
/// non-compiling pattern here is reported rather than panicking.
pub fn validate_value(value: &str, pattern: &str) -> Result<(), String> {
    let regex = Regex::new(pattern).map_err(|error| format!("invalid pattern '{}': {}", pattern, error))?;
    if !regex.is_match(value) {
        return Err(format!("value must match the pattern {}", pattern));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_value;

    #[test]
    fn accepts_matching_value() {
        assert!(validate_value("us-east-1", r"^[a-z]+-[a-z]+-\d$").is_ok());
    }

    #[test]
    fn rejects_non_matching_value() {
        let error = validate_value("production", r"^\d+$").expect_err("expected mismatch");
        assert!(error.contains("must match"));
    }

    #[test]
    fn reports_invalid_pattern() {
        let error = validate_value("anything", "[unclosed").expect_err("expected bad pattern");
        assert!(error.contains("invalid pattern"));
    }
}
