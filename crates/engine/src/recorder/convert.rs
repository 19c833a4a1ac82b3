//! Conversion from captured commands to a workflow.

use gitsavvy_types::{CapturedCommand, Shell, Step, Workflow};

/// Caller-supplied metadata for the converted workflow. Unset fields are
/// auto-derived from the first captured command.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSeed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Map captured commands to workflow steps carrying the recorded cwd and
/// the session's shell.
pub fn commands_to_workflow(commands: &[CapturedCommand], shell: Shell, seed: WorkflowSeed) -> Workflow {
    let domain = commands
        .first()
        .map(|command| domain_for(first_token(&command.command)))
        .unwrap_or_else(|| "Shell".to_string());

    let steps: Vec<Step> = commands
        .iter()
        .map(|command| Step {
            command: command.command.clone(),
            cwd: Some(command.cwd.clone()),
            shell: Some(shell),
            ..Step::default()
        })
        .collect();

    let mut workflow = Workflow::new(
        seed.title.unwrap_or_else(|| format!("{domain} session")),
        steps,
    );
    workflow.description = seed.description;
    workflow.tags = if seed.tags.is_empty() {
        vec![domain.to_lowercase()]
    } else {
        seed.tags
    };
    workflow
}

fn first_token(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or("")
}

/// Domain heuristic over the first command's leading token.
fn domain_for(token: &str) -> String {
    match token {
        "kubectl" | "helm" | "kubectx" | "k9s" => "Kubernetes".to_string(),
        "docker" | "docker-compose" | "podman" => "Docker".to_string(),
        "git" => "Git".to_string(),
        "terraform" => "Terraform".to_string(),
        "cargo" => "Rust".to_string(),
        "npm" | "yarn" | "pnpm" | "node" => "Node.js".to_string(),
        "aws" => "AWS".to_string(),
        "gcloud" => "GCP".to_string(),
        "make" => "Build".to_string(),
        "" => "Shell".to_string(),
        other => {
            let mut characters = other.chars();
            match characters.next() {
                Some(first) => first.to_uppercase().collect::<String>() + characters.as_str(),
                None => "Shell".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn captured(cwd: &str, command: &str) -> CapturedCommand {
        CapturedCommand {
            timestamp: Utc::now(),
            cwd: cwd.to_string(),
            command: command.to_string(),
        }
    }

    #[test]
    fn derives_kubernetes_domain_from_kubectl() {
        let commands = vec![captured("/tmp", "kubectl get pods"), captured("/tmp", "helm list")];
        let workflow = commands_to_workflow(&commands, Shell::Zsh, WorkflowSeed::default());

        assert_eq!(workflow.title, "Kubernetes session");
        assert_eq!(workflow.tags, vec!["kubernetes"]);
        assert_eq!(workflow.steps.len(), 2);
        assert_eq!(workflow.steps[0].cwd.as_deref(), Some("/tmp"));
        assert_eq!(workflow.steps[0].shell, Some(Shell::Zsh));
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn caller_metadata_wins_over_heuristics() {
        let commands = vec![captured("/srv", "docker ps")];
        let seed = WorkflowSeed {
            title: Some("Container check".into()),
            description: Some("Quick look at running containers.".into()),
            tags: vec!["ops".into()],
        };
        let workflow = commands_to_workflow(&commands, Shell::Bash, seed);
        assert_eq!(workflow.title, "Container check");
        assert_eq!(workflow.description.as_deref(), Some("Quick look at running containers."));
        assert_eq!(workflow.tags, vec!["ops"]);
    }

    #[test]
    fn unknown_tools_capitalize_the_token() {
        let commands = vec![captured("/x", "flyctl deploy")];
        let workflow = commands_to_workflow(&commands, Shell::Bash, WorkflowSeed::default());
        assert_eq!(workflow.title, "Flyctl session");
    }
}
