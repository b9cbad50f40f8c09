//! Fixed runner configuration.
//!
//! These values are compiled in. Changing the agent's tool allow-list is a
//! deployment decision, not something a caller can override per run.

/// Default agent executable.
pub const DEFAULT_AGENT: &str = "claude";

/// Directory (relative to the project root) holding PRP documents.
pub const PRP_DIR: &str = "PRPs";

/// Directory the agent is told to move a finished PRP into.
pub const COMPLETED_DIR: &str = "PRPs/completed";

/// File extension of PRP documents resolved by name.
pub const PRP_EXTENSION: &str = "md";

/// Tools the agent is allowed to use without asking.
pub const ALLOWED_TOOLS: &[&str] = &[
    "Edit",
    "Bash",
    "Write",
    "MultiEdit",
    "NotebookEdit",
    "WebFetch",
    "Agent",
    "LS",
    "Grep",
    "Read",
    "NotebookRead",
    "TodoRead",
    "TodoWrite",
    "WebSearch",
];

/// Non-interactive print flag; takes the prompt as its value.
pub const PRINT_FLAG: &str = "-p";

/// Flag carrying the comma-separated tool allow-list.
pub const ALLOWED_TOOLS_FLAG: &str = "--allowedTools";

/// Flag selecting the agent's output format.
pub const OUTPUT_FORMAT_FLAG: &str = "--output-format";

/// Flag capping the number of agent turns in unattended runs.
pub const MAX_TURNS_FLAG: &str = "--max-turns";

/// Characters of assistant content shown in a progress preview.
pub const PREVIEW_CHARS: usize = 100;

/// Exit code used when the operator interrupts a streaming run.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// The allow-list joined the way the agent expects it.
pub fn allowed_tools_arg() -> String {
    ALLOWED_TOOLS.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tools_arg_is_comma_joined() {
        let arg = allowed_tools_arg();
        assert!(arg.starts_with("Edit,Bash,Write"));
        assert!(arg.ends_with("TodoWrite,WebSearch"));
        assert_eq!(arg.split(',').count(), ALLOWED_TOOLS.len());
        assert!(!arg.contains(' '));
    }

    #[test]
    fn test_allowed_tools_has_fourteen_entries() {
        assert_eq!(ALLOWED_TOOLS.len(), 14);
    }

    #[test]
    fn test_interrupted_exit_code_is_nonzero() {
        assert_ne!(INTERRUPTED_EXIT_CODE, 0);
    }
}
