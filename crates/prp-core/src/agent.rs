//! Agent process launching and lifecycle.
//!
//! [`AgentProcess`] is the only owner of the spawned child and its pipes. The
//! child is created with `kill_on_drop`, so any early return from a caller
//! still tears it down.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, RunnerError};
use crate::invocation::InvocationSpec;

/// Output of an agent run whose streams were captured.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,
}

/// Map an exit status to a process exit code.
///
/// A child killed by a signal has no code; on unix that becomes `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

fn command(spec: &InvocationSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(spec.args()).kill_on_drop(true);
    cmd
}

fn spawn(spec: &InvocationSpec, mut cmd: Command) -> Result<Child> {
    info!(
        program = %spec.program,
        mode = ?spec.mode,
        format = %spec.output_format,
        "launching agent"
    );
    cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: spec.program.clone(),
        source,
    })
}

/// A running agent with piped stdout and stderr.
pub struct AgentProcess {
    program: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
}

impl AgentProcess {
    /// Launch the agent with stdout and stderr piped.
    ///
    /// Stderr is drained in the background from the start so a chatty agent
    /// cannot fill the pipe and stall while stdout is being relayed.
    pub fn launch(spec: &InvocationSpec) -> Result<Self> {
        let mut cmd = command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = spawn(spec, cmd)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                if let Err(e) = pipe.read_to_end(&mut buf).await {
                    warn!(error = %e, "failed to read agent stderr");
                }
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        Ok(Self {
            program: spec.program.clone(),
            child,
            stdout,
            stderr,
        })
    }

    /// Buffered reader over the agent's stdout. Returns `None` once taken.
    pub fn stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.stdout.take().map(BufReader::new)
    }

    /// Wait for the agent to exit and return its exit code.
    pub async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await?;
        let code = exit_code_of(status);
        debug!(program = %self.program, code, "agent exited");
        Ok(code)
    }

    /// Everything the agent wrote to stderr. Call after [`wait`](Self::wait).
    pub async fn stderr(&mut self) -> String {
        match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Kill the agent and reap it.
    pub async fn terminate(&mut self) -> Result<()> {
        warn!(program = %self.program, "terminating agent");
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
        match self.child.kill().await {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Run an interactive session: the prompt goes in on stdin, output is
/// inherited. Returns the agent's exit code.
pub async fn run_interactive(spec: &InvocationSpec) -> Result<i32> {
    let mut cmd = command(spec);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = spawn(spec, cmd)?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(spec.prompt.as_str().as_bytes()).await {
            // The agent may exit before reading everything; its exit code says why.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
            warn!(program = %spec.program, "agent closed stdin before reading the prompt");
        }
        // stdin is dropped here, closing the pipe.
    }

    let status = child.wait().await?;
    Ok(exit_code_of(status))
}

/// Run unattended with stdout and stderr inherited. Returns the exit code.
pub async fn run_passthrough(spec: &InvocationSpec) -> Result<i32> {
    let mut cmd = command(spec);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = spawn(spec, cmd)?;
    let status = child.wait().await?;
    Ok(exit_code_of(status))
}

/// Run unattended to completion, capturing stdout and stderr.
pub async fn run_captured(spec: &InvocationSpec) -> Result<CapturedOutput> {
    let mut cmd = command(spec);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = spawn(spec, cmd)?;
    let output = child.wait_with_output().await?;

    Ok(CapturedOutput {
        exit_code: exit_code_of(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
