//! Run an [`InvocationSpec`] end to end.
//!
//! The output strategy is picked from the invocation's mode and format:
//!
//! - `Interactive` / `Passthrough`: the agent inherits the terminal.
//! - `Captured`: stdout is collected and handed to [`crate::result`].
//! - `Streamed`: stdout is relayed line by line through [`StreamRelay`].
//!
//! A non-zero agent exit always becomes [`RunnerError::AgentFailed`] carrying
//! the agent's own exit code.

use std::future::Future;
use std::io::Write;

use serde_json::Value;
use tracing::{debug, info};

use crate::agent::{self, AgentProcess};
use crate::error::{Result, RunnerError};
use crate::invocation::{InvocationSpec, OutputStrategy};
use crate::relay::{RelayOutcome, StreamRelay};
use crate::result;

/// What the run produced besides its exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutput {
    /// Output went straight to the terminal.
    Inherited,
    /// The single JSON document (or its fallback object).
    Document(Value),
    /// Every event forwarded, in order.
    Events(Vec<Value>),
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub exit_code: i32,
    pub output: InvocationOutput,
}

fn check_exit(code: i32, stderr: String) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(RunnerError::AgentFailed { code, stderr })
    }
}

/// Launch the agent described by `spec` and handle its output.
///
/// `out` receives machine-readable payloads, `diag` receives human-readable
/// progress. `cancel` is only observed in streaming mode; when it resolves the
/// agent is killed and [`RunnerError::Interrupted`] is returned.
pub async fn run<O, D, C>(
    spec: &InvocationSpec,
    mut out: O,
    mut diag: D,
    cancel: C,
) -> Result<InvocationResult>
where
    O: Write,
    D: Write,
    C: Future<Output = ()>,
{
    let strategy = spec.strategy();
    debug!(?strategy, argc = spec.args().len(), "running agent");

    let output = match strategy {
        OutputStrategy::Interactive => {
            let code = agent::run_interactive(spec).await?;
            check_exit(code, String::new())?;
            InvocationOutput::Inherited
        }
        OutputStrategy::Passthrough => {
            let code = agent::run_passthrough(spec).await?;
            check_exit(code, String::new())?;
            InvocationOutput::Inherited
        }
        OutputStrategy::Captured => {
            let captured = agent::run_captured(spec).await?;
            check_exit(captured.exit_code, captured.stderr)?;
            let document = result::format_output(&captured.stdout, &mut out, &mut diag)?;
            InvocationOutput::Document(document)
        }
        OutputStrategy::Streamed => {
            let events = run_streamed(spec, out, diag, cancel).await?;
            InvocationOutput::Events(events)
        }
    };

    info!(program = %spec.program, "agent finished");
    Ok(InvocationResult {
        exit_code: 0,
        output,
    })
}

async fn run_streamed<O, D, C>(
    spec: &InvocationSpec,
    out: O,
    diag: D,
    cancel: C,
) -> Result<Vec<Value>>
where
    O: Write,
    D: Write,
    C: Future<Output = ()>,
{
    let mut process = AgentProcess::launch(spec)?;
    let reader = process.stdout().ok_or_else(|| {
        RunnerError::Io(std::io::Error::other("agent stdout was not captured"))
    })?;

    tokio::pin!(cancel);
    let mut relay = StreamRelay::new(out, diag);

    match relay.run(reader, cancel.as_mut()).await {
        Ok(RelayOutcome::Finished) => {}
        Ok(RelayOutcome::Cancelled) => {
            process.terminate().await?;
            return Err(RunnerError::Interrupted);
        }
        Err(e) => {
            process.terminate().await.ok();
            return Err(e);
        }
    }

    let code = tokio::select! {
        biased;
        _ = cancel.as_mut() => {
            process.terminate().await?;
            return Err(RunnerError::Interrupted);
        }
        code = process.wait() => code?,
    };

    if code != 0 {
        let stderr = process.stderr().await;
        return Err(RunnerError::AgentFailed { code, stderr });
    }

    debug!(stats = ?relay.stats(), "stream relayed");
    Ok(relay.into_events())
}
