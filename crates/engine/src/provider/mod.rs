//! Language-model provider seam.
//!
//! The engine depends on one narrow capability: string in, string out. The
//! HTTP clients behind it live elsewhere; here is the trait, a registry of
//! named constructors (injected, never a process-wide singleton), and the
//! reply-to-workflow conversion with its fenced-YAML fallback.

use std::collections::HashMap;

use anyhow::{Result, bail};

use gitsavvy_types::{Workflow, WorkflowError};

pub mod extract;
pub mod null;

pub use extract::extract_fenced_yaml;
pub use null::NullProvider;

/// A text-completion backend.
pub trait CompletionProvider: Send + Sync {
    /// Registry name of this provider.
    fn name(&self) -> &str;
    /// Produce a completion for a system + user prompt pair.
    fn generate(&self, system: &str, user: &str) -> Result<String>;
}

type ProviderConstructor = Box<dyn Fn() -> Box<dyn CompletionProvider> + Send + Sync>;

/// Constructor registry keyed by provider name.
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the built-in null provider.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("null", || Box::new(NullProvider));
        registry
    }

    /// Register a constructor under a name, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn CompletionProvider> + Send + Sync + 'static,
    {
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    /// Instantiate a provider by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn CompletionProvider>> {
        let Some(constructor) = self.constructors.get(name) else {
            let mut known: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
            known.sort_unstable();
            bail!("unknown provider '{}'; known providers: {}", name, known.join(", "));
        };
        Ok(constructor())
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Parse a provider reply into a workflow.
///
/// The raw reply is tried first; when it is a markdown response, the first
/// fenced YAML block is extracted and parsed instead.
pub fn workflow_from_reply(reply: &str) -> Result<Workflow, WorkflowError> {
    match Workflow::from_yaml(reply) {
        Ok(workflow) => Ok(workflow),
        Err(direct_error) => {
            let Some(block) = extract_fenced_yaml(reply) else {
                return Err(direct_error);
            };
            Workflow::from_yaml(&block)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_creates_known_providers() {
        let registry = ProviderRegistry::with_builtins();
        let provider = registry.create("null").expect("null provider");
        assert_eq!(provider.name(), "null");
        assert!(registry.create("missing").is_err());
    }

    #[test]
    fn registry_is_injectable_not_global() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.create("null").is_err());
        registry.register("null", || Box::new(NullProvider));
        assert!(registry.create("null").is_ok());
    }

    #[test]
    fn raw_yaml_reply_parses_directly() {
        let reply = "title: Direct\nsteps:\n  - command: echo hi\n";
        let workflow = workflow_from_reply(reply).expect("parse raw reply");
        assert_eq!(workflow.title, "Direct");
    }

    #[test]
    fn markdown_reply_falls_back_to_fenced_block() {
        let reply = "Here is your workflow:\n\n```yaml\ntitle: Fenced\nsteps:\n  - command: echo hi\n```\n\nEnjoy!";
        let workflow = workflow_from_reply(reply).expect("parse fenced reply");
        assert_eq!(workflow.title, "Fenced");
    }

    #[test]
    fn unusable_reply_keeps_the_original_error() {
        let error = workflow_from_reply("I cannot help with that.").expect_err("no yaml anywhere");
        assert!(error.to_string().contains("workflow"));
    }
}
