//! Prompt-hook scripts injected into recorded shells.
//!
//! Each script appends `<unix_timestamp><US><cwd><US><command>` to the
//! capture file on every prompt event, skipping empty lines, consecutive
//! duplicates, and the navigational blocklist. The `[REC] ` prompt prefix
//! shows the user that recording is active.

use std::path::Path;

use gitsavvy_types::Shell;

use super::RecorderError;

/// Render the hook script for a recordable shell.
pub fn hook_script(shell: Shell, capture_file: &Path) -> Result<String, RecorderError> {
    match shell {
        Shell::Bash => Ok(bash_hook(capture_file)),
        Shell::Zsh => Ok(zsh_hook(capture_file)),
        other => Err(RecorderError::UnsupportedShell(other)),
    }
}

fn bash_hook(capture_file: &Path) -> String {
    format!(
        r#"# gitsavvy recording hook
if [ -f "$HOME/.bashrc" ]; then
    . "$HOME/.bashrc"
fi

export GITSAVVY_CAPTURE_FILE='{capture}'

# Seed with the newest inherited history entry so it is not re-recorded.
__gitsavvy_last=$(builtin history 1 | sed 's/^ *[0-9]* *//')

__gitsavvy_record() {{
    local entry
    entry=$(builtin history 1 | sed 's/^ *[0-9]* *//')
    [ -z "$entry" ] && return
    [ "$entry" = "$__gitsavvy_last" ] && return
    __gitsavvy_last=$entry
    case "${{entry%% *}}" in
        cd|pushd|popd|dirs|pwd|ls|la|ll|clear|history|exit|logout|jobs|fg|bg) return ;;
    esac
    printf '%s\037%s\037%s\n' "$(date +%s)" "$PWD" "$entry" >> "$GITSAVVY_CAPTURE_FILE"
}}

PROMPT_COMMAND="__gitsavvy_record${{PROMPT_COMMAND:+;$PROMPT_COMMAND}}"
PS1="[REC] $PS1"
"#,
        capture = capture_file.display()
    )
}

fn zsh_hook(capture_file: &Path) -> String {
    format!(
        r#"# gitsavvy recording hook
export GITSAVVY_CAPTURE_FILE='{capture}'

typeset -g __gitsavvy_last
__gitsavvy_last=$(fc -ln -1 2>/dev/null)

__gitsavvy_record() {{
    local entry
    entry=$(fc -ln -1 2>/dev/null)
    entry="${{entry#"${{entry%%[![:space:]]*}}"}}"
    [ -z "$entry" ] && return
    [ "$entry" = "$__gitsavvy_last" ] && return
    __gitsavvy_last=$entry
    case "${{entry%% *}}" in
        cd|pushd|popd|dirs|pwd|ls|la|ll|clear|history|exit|logout|jobs|fg|bg) return ;;
    esac
    printf '%s\037%s\037%s\n' "$(date +%s)" "$PWD" "$entry" >> "$GITSAVVY_CAPTURE_FILE"
}}

precmd_functions+=(__gitsavvy_record)
PROMPT="[REC] $PROMPT"
"#,
        capture = capture_file.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bash_hook_wires_prompt_command_and_capture_file() {
        let script = hook_script(Shell::Bash, &PathBuf::from("/tmp/cap.log")).expect("bash hook");
        assert!(script.contains("export GITSAVVY_CAPTURE_FILE='/tmp/cap.log'"));
        assert!(script.contains("PROMPT_COMMAND=\"__gitsavvy_record"));
        assert!(script.contains("PS1=\"[REC] $PS1\""));
        assert!(script.contains("cd|pushd|popd"));
    }

    #[test]
    fn zsh_hook_registers_precmd() {
        let script = hook_script(Shell::Zsh, &PathBuf::from("/tmp/cap.log")).expect("zsh hook");
        assert!(script.contains("precmd_functions+=(__gitsavvy_record)"));
        assert!(script.contains("PROMPT=\"[REC] $PROMPT\""));
    }

    #[test]
    fn non_interactive_shells_are_rejected() {
        assert!(hook_script(Shell::Sh, &PathBuf::from("/tmp/cap.log")).is_err());
        assert!(hook_script(Shell::Pwsh, &PathBuf::from("/tmp/cap.log")).is_err());
    }
}
