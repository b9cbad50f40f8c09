//! Invocation specification: which agent to run, how, and with what argv.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{
    allowed_tools_arg, ALLOWED_TOOLS_FLAG, MAX_TURNS_FLAG, OUTPUT_FORMAT_FLAG, PRINT_FLAG,
};
use crate::prompt::Prompt;

/// Output format requested from the agent in unattended mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Plain text, inherited straight through.
    #[default]
    Text,
    /// One JSON document, captured then pretty-printed.
    Json,
    /// Line-delimited JSON events, relayed as they arrive.
    StreamJson,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Text,
        OutputFormat::Json,
        OutputFormat::StreamJson,
    ];

    /// Value passed to the agent's `--output-format` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::StreamJson => "stream-json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown output format '{s}' (expected text, json or stream-json)"))
    }
}

/// How the agent session is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Prompt goes in on stdin; the operator keeps the session afterwards.
    Interactive,
    /// Prompt goes in via the print flag; the agent runs to completion.
    #[default]
    Unattended,
}

/// How the runner handles the agent's output for a given spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStrategy {
    /// Interactive chat: stdin piped with the prompt, output inherited.
    Interactive,
    /// Unattended text: output inherited.
    Passthrough,
    /// Unattended JSON: output captured and formatted at the end.
    Captured,
    /// Unattended stream-json: stdout relayed line by line.
    Streamed,
}

/// Everything needed to launch the agent once.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    /// Agent executable name or path.
    pub program: String,

    /// Interactive or unattended.
    pub mode: Mode,

    /// Output format (ignored in interactive mode).
    pub output_format: OutputFormat,

    /// Optional turn cap for unattended runs.
    pub max_turns: Option<u32>,

    /// The assembled prompt.
    pub prompt: Prompt,
}

impl InvocationSpec {
    pub fn new(
        program: impl Into<String>,
        mode: Mode,
        output_format: OutputFormat,
        prompt: Prompt,
    ) -> Self {
        Self {
            program: program.into(),
            mode,
            output_format,
            max_turns: None,
            prompt,
        }
    }

    /// Cap the number of agent turns (unattended only).
    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Arguments passed after the program name.
    ///
    /// Unattended: `-p <prompt> --allowedTools <list> [--max-turns N] --output-format <fmt>`.
    /// Interactive: `--allowedTools <list>` only.
    pub fn args(&self) -> Vec<String> {
        match self.mode {
            Mode::Interactive => vec![ALLOWED_TOOLS_FLAG.to_string(), allowed_tools_arg()],
            Mode::Unattended => {
                let mut args = vec![
                    PRINT_FLAG.to_string(),
                    self.prompt.as_str().to_string(),
                    ALLOWED_TOOLS_FLAG.to_string(),
                    allowed_tools_arg(),
                ];
                if let Some(turns) = self.max_turns {
                    args.push(MAX_TURNS_FLAG.to_string());
                    args.push(turns.to_string());
                }
                args.push(OUTPUT_FORMAT_FLAG.to_string());
                args.push(self.output_format.as_str().to_string());
                args
            }
        }
    }

    /// Full argument vector, program name first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(8);
        argv.push(self.program.clone());
        argv.extend(self.args());
        argv
    }

    /// Whether the prompt is written to the agent's stdin.
    pub fn pipes_prompt(&self) -> bool {
        self.mode == Mode::Interactive
    }

    pub fn strategy(&self) -> OutputStrategy {
        match (self.mode, self.output_format) {
            (Mode::Interactive, _) => OutputStrategy::Interactive,
            (Mode::Unattended, OutputFormat::Text) => OutputStrategy::Passthrough,
            (Mode::Unattended, OutputFormat::Json) => OutputStrategy::Captured,
            (Mode::Unattended, OutputFormat::StreamJson) => OutputStrategy::Streamed,
        }
    }
}
