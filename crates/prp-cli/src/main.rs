//! PRP Runner CLI
//!
//! Runs an AI coding agent against a Product Requirement Prompt (PRP).
//!
//! ```text
//! prp-runner --prp test --interactive
//! prp-runner --prp test --output-format json
//! prp-runner --prp-path PRPs/test.md --output-format stream-json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prp_core::config::DEFAULT_AGENT;
use prp_core::{InvocationSpec, Mode, OutputFormat, Prompt, PromptDocument, PrpSource, RunnerError};
use tracing::{debug, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "prp-runner")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a PRP with an LLM coding agent", long_about = None)]
struct Cli {
    /// Path to a PRP markdown file (overrides --prp)
    #[arg(long, env = "PRP_PATH")]
    prp_path: Option<PathBuf>,

    /// Feature key; resolves to <root>/PRPs/<name>.md
    #[arg(long, env = "PRP_NAME")]
    prp: Option<String>,

    /// Launch an interactive chat session instead of an unattended run
    #[arg(long)]
    interactive: bool,

    /// Agent CLI executable
    #[arg(long, env = "PRP_MODEL", default_value = DEFAULT_AGENT)]
    model: String,

    /// Output format for unattended runs: text, json, stream-json
    #[arg(long, env = "PRP_OUTPUT_FORMAT", default_value = "text", value_parser = parse_output_format)]
    output_format: OutputFormat,

    /// Cap the number of agent turns in unattended runs
    #[arg(long, env = "PRP_MAX_TURNS")]
    max_turns: Option<u32>,

    /// Project root the agent runs in. Without it the agent runs in the
    /// current directory and no directory change is made.
    #[arg(long, env = "PRP_ROOT")]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,
}

fn parse_output_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse()
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else {
            Mode::Unattended
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    prp_core::init_tracing(cli.log_json, level);

    let code = match execute(cli).await {
        Ok(()) => 0,
        Err(e) => report(&e),
    };
    std::process::exit(code);
}

/// Resolve the PRP, pin the working directory to the project root, and run
/// the agent.
async fn execute(cli: Cli) -> Result<()> {
    let invocation_dir = std::env::current_dir().context("Failed to get current directory")?;
    let root = cli.root.clone().unwrap_or(invocation_dir);
    let mode = cli.mode();

    let source = PrpSource::from_args(cli.prp_path, cli.prp)?;
    let prp_path = source.resolve(&root);

    // Load before changing directory so relative --prp-path values resolve
    // against where the user ran the command.
    let document = PromptDocument::load(&prp_path)?;

    std::env::set_current_dir(&root)
        .with_context(|| format!("Failed to change directory to {}", root.display()))?;
    debug!(root = %root.display(), prp = %prp_path.display(), "pinned project root");

    let prompt = Prompt::build(&document);
    let spec = InvocationSpec::new(cli.model, mode, cli.output_format, prompt)
        .with_max_turns(cli.max_turns);

    prp_core::run(&spec, std::io::stdout(), std::io::stderr(), shutdown_signal()).await?;
    Ok(())
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

/// Print a failure on stderr and return the exit code for it.
fn report(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunnerError>() {
        Some(RunnerError::AgentFailed { code, stderr }) => {
            eprintln!("Agent failed with exit code {code}");
            if !stderr.trim().is_empty() {
                eprintln!("Error: {stderr}");
            }
            *code
        }
        Some(RunnerError::Interrupted) => {
            eprintln!("\nInterrupted by user");
            RunnerError::Interrupted.exit_code()
        }
        Some(runner_err) => {
            eprintln!("Error: {runner_err}");
            runner_err.exit_code()
        }
        None => {
            eprintln!("Error: {err:#}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use prp_core::config::INTERRUPTED_EXIT_CODE;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["prp-runner", "--prp", "feature"]).unwrap();
        assert_eq!(cli.prp.as_deref(), Some("feature"));
        assert_eq!(cli.model, DEFAULT_AGENT);
        assert_eq!(cli.output_format, OutputFormat::Text);
        assert_eq!(cli.mode(), Mode::Unattended);
        assert!(cli.max_turns.is_none());
    }

    #[test]
    fn test_interactive_flag() {
        let cli = Cli::try_parse_from(["prp-runner", "--prp", "x", "--interactive"]).unwrap();
        assert_eq!(cli.mode(), Mode::Interactive);
    }

    #[test]
    fn test_output_format_values() {
        let cli = Cli::try_parse_from(["prp-runner", "--prp", "x", "--output-format", "stream-json"])
            .unwrap();
        assert_eq!(cli.output_format, OutputFormat::StreamJson);

        let err = Cli::try_parse_from(["prp-runner", "--prp", "x", "--output-format", "xml"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_prp_path_and_model() {
        let cli = Cli::try_parse_from([
            "prp-runner",
            "--prp-path",
            "docs/feature.md",
            "--model",
            "my-agent",
            "--max-turns",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.prp_path, Some(PathBuf::from("docs/feature.md")));
        assert_eq!(cli.model, "my-agent");
        assert_eq!(cli.max_turns, Some(30));
    }

    #[test]
    fn test_root_help_says_default_is_no_pinning() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("no directory change is made"));
    }

    #[test]
    fn test_report_exit_codes() {
        let failed = anyhow::Error::new(RunnerError::AgentFailed {
            code: 7,
            stderr: String::new(),
        });
        assert_eq!(report(&failed), 7);

        let missing = anyhow::Error::new(RunnerError::PrpNotFound {
            path: PathBuf::from("PRPs/none.md"),
        });
        assert_eq!(report(&missing), 1);

        assert_eq!(
            report(&anyhow::Error::new(RunnerError::Interrupted)),
            INTERRUPTED_EXIT_CODE
        );
        assert_eq!(report(&anyhow::anyhow!("other")), 1);
    }

    #[tokio::test]
    async fn test_execute_missing_prp_fails_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "prp-runner".to_string(),
            "--prp".to_string(),
            "absent".to_string(),
            "--model".to_string(),
            "definitely-not-an-agent-binary".to_string(),
            "--root".to_string(),
            dir.path().display().to_string(),
        ])
        .unwrap();

        let err = execute(cli).await.unwrap_err();
        let runner_err = err.downcast_ref::<RunnerError>().expect("runner error");
        assert!(matches!(runner_err, RunnerError::PrpNotFound { .. }));
        assert!(err.to_string().contains("absent.md"));
    }

    #[tokio::test]
    async fn test_execute_requires_a_prp() {
        let cli = Cli::try_parse_from(["prp-runner"]).unwrap();
        let err = execute(cli).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RunnerError>(),
            Some(RunnerError::MissingPrp)
        ));
    }
}
