//! # Gitsavvy Engine
//!
//! Workflow execution and shell-session recording.
//!
//! The engine is organized into a few modules:
//!
//! - **`exec`**: the single-command primitive — shell dispatch, env/cwd
//!   resolution, streamed or buffered output, cancellation
//! - **`danger`**: the built-in dangerous-command pattern table
//! - **`runner`**: sequential plan execution over the exec primitive
//! - **`recorder`**: prompt-hook capture of live shell sessions
//! - **`provider`**: the language-model completion seam
//! - **`prompt`**: confirmation traits the CLI implements
//!
//! Everything interactive is behind a trait: the engine itself never reads
//! the terminal.

pub mod danger;
pub mod exec;
pub mod prompt;
pub mod provider;
pub mod recorder;
pub mod runner;

pub use danger::{DangerChecker, DangerInfo, DangerRule};
pub use exec::{EXIT_DECLINED, EXIT_MISSING_PLACEHOLDER, ExecConfig, ExecResult, Executor, NullSink, OutputSink, VecSink};
pub use prompt::{AcceptAll, DangerPrompt, DeclineAll, StepDecision, StepPrompter};
pub use provider::{CompletionProvider, NullProvider, ProviderRegistry, extract_fenced_yaml, workflow_from_reply};
pub use recorder::{
    RecordedSession, RecorderError, WorkflowSeed, commands_to_workflow, detect_recording_shell, record_session,
};
pub use runner::{ExecutionPlan, RunResult, Runner, StepOutcome, detect_default_shell};
