//! PRP Runner Core
//!
//! Builds a prompt from a Product Requirement Prompt (PRP) document, launches
//! an external coding agent with it, and relays the agent's output:
//!
//! - `text`: the agent writes straight to the terminal
//! - `json`: one document, captured and pretty-printed with a summary
//! - `stream-json`: line-delimited events, forwarded as they arrive

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod invocation;
pub mod prompt;
pub mod relay;
pub mod result;
pub mod runner;
pub mod telemetry;

pub use agent::{exit_code_of, AgentProcess, CapturedOutput};
pub use error::{Result, RunnerError};
pub use event::{classify, parse_line, EventKind, ParsedLine, ResultSummary};
pub use invocation::{InvocationSpec, Mode, OutputFormat, OutputStrategy};
pub use prompt::{build_prompt, Prompt, PromptDocument, PrpSource, META_HEADER};
pub use relay::{RelayOutcome, RelayStats, StreamRelay};
pub use runner::{run, InvocationOutput, InvocationResult};
pub use telemetry::init_tracing;
