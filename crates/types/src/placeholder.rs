//! Placeholder extraction and substitution.
//!
//! A placeholder token is `<name>` where `name` matches
//! `[A-Za-z_][A-Za-z0-9_\-]*`. Tokens appear in step commands; the workflow
//! document may additionally declare metadata (prompt, default, validation
//! pattern, secrecy) for each name. Declarations and textual occurrences are
//! independent: an undeclared token is still substitutable when a value is
//! supplied, and a declared placeholder with no usage is allowed.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::workflow::{Step, Workflow};

static PLACEHOLDER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z_][A-Za-z0-9_\-]*)>").expect("placeholder token pattern"));

/// Declared metadata for a single placeholder parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placeholder {
    /// Display text shown when prompting for a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Pre-filled value offered to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Optional regular-expression pattern the value must match. Checked for
    /// compilability at workflow load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,
    /// When true, the value is masked in UI and logs.
    #[serde(default, skip_serializing_if = "is_false")]
    pub secret: bool,
}

/// Declared metadata joined with textual usage, as produced by
/// [`extract_with_metadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMetadata {
    /// Display text from the declaration, when declared.
    pub prompt: Option<String>,
    /// Default value from the declaration, when declared.
    pub default: Option<String>,
    /// Validation pattern from the declaration, when declared.
    pub validate: Option<String>,
    /// Secrecy flag from the declaration.
    pub secret: bool,
    /// Zero-based indices of the steps whose commands use this placeholder.
    pub used_in: Vec<usize>,
}

/// Substitution found `<name>` tokens with no supplied value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing placeholder values: {}", missing.join(", "))]
pub struct MissingPlaceholderError {
    /// Every unresolved name, in order of first appearance.
    pub missing: Vec<String>,
}

/// Extract placeholder names from `text`, ordered by first appearance,
/// without duplicates.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for capture in PLACEHOLDER_TOKEN.captures_iter(text) {
        let name = &capture[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Collect placeholder names across all step commands, ordered by first
/// appearance, without duplicates.
pub fn collect_from_steps(steps: &[Step]) -> Vec<String> {
    let mut names = Vec::new();
    for step in steps {
        for name in extract_placeholders(&step.command) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Join textual placeholder occurrences with the workflow's declared map.
///
/// Every name that appears in a step command or in the declaration map is
/// present in the result; `used_in` lists the step indices referencing it.
pub fn extract_with_metadata(workflow: &Workflow) -> IndexMap<String, PlaceholderMetadata> {
    let mut metadata: IndexMap<String, PlaceholderMetadata> = IndexMap::new();

    for (index, step) in workflow.steps.iter().enumerate() {
        for name in extract_placeholders(&step.command) {
            metadata.entry(name).or_default().used_in.push(index);
        }
    }

    for (name, declared) in &workflow.placeholders {
        let entry = metadata.entry(name.clone()).or_default();
        entry.prompt = declared.prompt.clone();
        entry.default = declared.default.clone();
        entry.validate = declared.validate.clone();
        entry.secret = declared.secret;
    }

    metadata
}

/// Replace every `<name>` token in `text` with its value from `values`.
///
/// Text without tokens is returned unchanged. Any token with no supplied
/// value fails the whole substitution; the error lists every unresolved name.
pub fn substitute(text: &str, values: &HashMap<String, String>) -> Result<String, MissingPlaceholderError> {
    let names = extract_placeholders(text);
    if names.is_empty() {
        return Ok(text.to_string());
    }

    let missing: Vec<String> = names.iter().filter(|name| !values.contains_key(*name)).cloned().collect();
    if !missing.is_empty() {
        return Err(MissingPlaceholderError { missing });
    }

    let mut result = text.to_string();
    for name in &names {
        let token = format!("<{name}>");
        result = result.replace(&token, &values[name]);
    }
    Ok(result)
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Workflow;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[test]
    fn extracts_ordered_unique_names() {
        let names = extract_placeholders("scp <src> <host>:<dest> && echo <src>");
        assert_eq!(names, vec!["src", "host", "dest"]);
    }

    #[test]
    fn ignores_tokens_with_invalid_names() {
        let names = extract_placeholders("echo <1bad> <good_name> < spaced >");
        assert_eq!(names, vec!["good_name"]);
    }

    #[test]
    fn collects_across_steps_in_order() {
        let steps = vec![
            Step::from_command("echo <b> <a>"),
            Step::from_command("echo <c> <a>"),
        ];
        assert_eq!(collect_from_steps(&steps), vec!["b", "a", "c"]);
    }

    #[test]
    fn substitute_replaces_all_tokens() {
        let result = substitute("echo <name> and <name> in <place>", &values(&[("name", "world"), ("place", "here")]))
            .expect("substitute");
        assert_eq!(result, "echo world and world in here");
    }

    #[test]
    fn substitute_returns_text_without_tokens_unchanged() {
        let result = substitute("echo plain", &HashMap::new()).expect("no tokens");
        assert_eq!(result, "echo plain");
    }

    #[test]
    fn substitute_lists_every_missing_name() {
        let error = substitute("echo <one> <two> <three>", &values(&[("two", "2")])).expect_err("expected missing");
        assert_eq!(error.missing, vec!["one", "three"]);
    }

    #[test]
    fn substitute_is_idempotent_for_token_free_values() {
        let bindings = values(&[("name", "world")]);
        let once = substitute("echo <name>", &bindings).expect("first pass");
        let twice = substitute(&once, &bindings).expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn undeclared_token_is_substitutable() {
        let result = substitute("echo <extra>", &values(&[("extra", "ok")])).expect("substitute undeclared");
        assert_eq!(result, "echo ok");
    }

    #[test]
    fn metadata_joins_declarations_with_usage() {
        let yaml_text = r#"
title: Meta
placeholders:
  region:
    prompt: Target region
    default: us-east-1
    secret: false
  token:
    secret: true
steps:
  - command: deploy --region <region>
  - command: curl -H "Auth <token>" <region>.example.com
"#;
        let workflow = Workflow::from_yaml(yaml_text).expect("parse");
        let metadata = extract_with_metadata(&workflow);

        let region = &metadata["region"];
        assert_eq!(region.prompt.as_deref(), Some("Target region"));
        assert_eq!(region.used_in, vec![0, 1]);

        let token = &metadata["token"];
        assert!(token.secret);
        assert_eq!(token.used_in, vec![1]);
    }

    #[test]
    fn metadata_keeps_declared_but_unused_placeholders() {
        let yaml_text = r#"
title: Unused
placeholders:
  spare:
    default: zero
steps:
  - command: echo fixed
"#;
        let workflow = Workflow::from_yaml(yaml_text).expect("parse");
        let metadata = extract_with_metadata(&workflow);
        assert!(metadata["spare"].used_in.is_empty());
    }
}
