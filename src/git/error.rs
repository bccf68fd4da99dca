// ABOUTME: Error types for workspace provisioning through the git CLI
// Every variant that wraps a git invocation carries git's stderr verbatim

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The step of a reset sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Fetch,
    Checkout,
    Reset,
    Clean,
}

impl fmt::Display for ResetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ResetStep::Fetch => "fetch",
            ResetStep::Checkout => "checkout",
            ResetStep::Reset => "reset",
            ResetStep::Clean => "clean",
        };
        f.write_str(step)
    }
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Clone of {remote} ({branch}) into {} failed: {reason}", destination.display())]
    Clone {
        remote: String,
        branch: String,
        destination: PathBuf,
        reason: String,
    },

    #[error("Reset of {} failed at git {step}: {stderr}", dir.display())]
    Reset {
        step: ResetStep,
        dir: PathBuf,
        stderr: String,
    },

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("No remote 'origin' configured. Add a remote first.")]
    NoOriginRemote,

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    pub fn is_clone_error(&self) -> bool {
        matches!(self, GitError::Clone { .. })
    }

    /// The failing reset step, if this is a reset failure.
    pub fn reset_step(&self) -> Option<ResetStep> {
        match self {
            GitError::Reset { step, .. } => Some(*step),
            _ => None,
        }
    }
}
