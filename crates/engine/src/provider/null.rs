//! No-op completion provider for tests and offline use.

use anyhow::Result;

use super::CompletionProvider;

/// Provider that echoes a minimal valid workflow instead of calling a
/// network backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProvider;

impl CompletionProvider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }

    fn generate(&self, _system: &str, user: &str) -> Result<String> {
        Ok(format!(
            "title: Draft\ndescription: Offline draft for \"{}\"\nsteps:\n  - command: \"true\"\n",
            user.replace('"', "'").replace('\n', " ")
        ))
    }
}
