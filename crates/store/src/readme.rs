//! Deterministic README rendering.
//!
//! The README is presentation only: the store regenerates it on every save
//! and never reads it back. Rendering is deterministic so saves of an
//! unchanged workflow produce no diff.

use gitsavvy_types::Workflow;

/// Render the markdown README for a workflow.
pub fn render_readme(workflow: &Workflow) -> String {
    let mut readme = String::new();
    readme.push_str(&format!("# {}\n", workflow.title));

    if let Some(description) = &workflow.description
        && !description.trim().is_empty()
    {
        readme.push('\n');
        readme.push_str(description.trim());
        readme.push('\n');
    }

    if !workflow.tags.is_empty() {
        readme.push_str("\n## Tags\n\n");
        for tag in &workflow.tags {
            readme.push_str(&format!("- {tag}\n"));
        }
    }

    readme.push_str("\n## Steps\n");
    for (index, step) in workflow.steps.iter().enumerate() {
        let number = index + 1;
        let label = step
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Step {number}"));
        readme.push_str(&format!("\n### {number}. {label}\n\n"));
        readme.push_str("```sh\n");
        readme.push_str(&step.command);
        readme.push_str("\n```\n");
    }

    readme
}
