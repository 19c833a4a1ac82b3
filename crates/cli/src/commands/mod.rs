//! Subcommand implementations.

pub mod ask;
pub mod delete;
pub mod export;
pub mod index;
pub mod list;
pub mod record;
pub mod run;
pub mod save;
pub mod search;
pub mod sync;

use std::process::ExitCode;

/// Map a runner exit code onto the process exit code.
pub fn exit_code_from(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}
