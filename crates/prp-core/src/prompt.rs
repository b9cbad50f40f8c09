//! Prompt assembly from a PRP document.
//!
//! A prompt is the fixed workflow preamble ([`META_HEADER`]) followed directly
//! by the raw document text. Nothing is inserted between the two and the
//! document is never altered.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{PRP_DIR, PRP_EXTENSION};
use crate::error::{Result, RunnerError};

/// Workflow guidance prepended to every PRP.
pub const META_HEADER: &str = "Ingest and understand the Product Requirement Prompt (PRP) below in detail.

    # WORKFLOW GUIDANCE:

    ## Planning Phase
    - Think hard before you code. Create a comprehensive plan addressing all requirements.
    - Break down complex tasks into smaller, manageable steps.
    - Use the TodoWrite tool to create and track your implementation plan.
    - Identify implementation patterns from existing code to follow.

    ## Implementation Phase
    - Follow code conventions and patterns found in existing files.
    - Implement one component at a time and verify it works correctly.
    - Write clear, maintainable code with appropriate comments.
    - Consider error handling, edge cases, and potential security issues.
    - Use type annotations to ensure type safety.

    ## Testing Phase
    - Test each component thoroughly as you build it.
    - Use the provided validation gates to verify your implementation.
    - Verify that all requirements have been satisfied.
    - Run the project tests when finished and output \"DONE\" when they pass.

    ## Example Implementation Approach:
    1. Analyze the PRP requirements in detail.
    2. Search for and understand existing patterns in the codebase.
    3. Search the Web and gather additional context and examples.
    4. Create a step-by-step implementation plan with TodoWrite.
    5. Implement core functionality first, then additional features.
    6. Test and validate each component.
    7. Ensure all validation gates pass.

    ***When you are finished, move the completed PRP into the PRPs/completed folder***
    ";

/// Where the PRP comes from on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrpSource {
    /// Explicit file path.
    Path(PathBuf),
    /// Feature key, resolved to `<root>/PRPs/<name>.md`.
    Name(String),
}

impl PrpSource {
    /// Pick a source from the two optional arguments. An explicit path wins.
    pub fn from_args(path: Option<PathBuf>, name: Option<String>) -> Result<Self> {
        match (path, name) {
            (Some(path), _) => Ok(PrpSource::Path(path)),
            (None, Some(name)) => Ok(PrpSource::Name(name)),
            (None, None) => Err(RunnerError::MissingPrp),
        }
    }

    /// Resolve to a concrete file path under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        match self {
            PrpSource::Path(path) => path.clone(),
            PrpSource::Name(name) => root
                .join(PRP_DIR)
                .join(format!("{name}.{PRP_EXTENSION}")),
        }
    }
}

/// A loaded PRP document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    path: PathBuf,
    text: String,
}

impl PromptDocument {
    /// Read a document, failing with [`RunnerError::PrpNotFound`] when the
    /// path does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RunnerError::PrpNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::PrpUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), bytes = text.len(), "loaded PRP");

        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Final prompt text handed to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Preamble followed by the document text, verbatim.
    pub fn build(document: &PromptDocument) -> Self {
        let mut text = String::with_capacity(META_HEADER.len() + document.text.len());
        text.push_str(META_HEADER);
        text.push_str(&document.text);
        Prompt(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The document part of the prompt.
    pub fn document_text(&self) -> &str {
        &self.0[META_HEADER.len()..]
    }
}

/// Load the document at `path` and build its prompt.
pub fn build_prompt(path: &Path) -> Result<Prompt> {
    let document = PromptDocument::load(path)?;
    Ok(Prompt::build(&document))
}
