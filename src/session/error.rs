// ABOUTME: Error types for opening agent sessions
// Workspace and terminal failures pass through unchanged so their step and stderr survive

use crate::git::GitError;
use crate::terminal::{BackendKind, TerminalError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid agent name {0:?}: use letters, digits, '.', '_' or '-', starting with a letter or digit")]
    InvalidAgentName(String),

    #[error("Agent name requested more than once: {0}")]
    DuplicateAgentName(String),

    #[error("Workspaces for {first} and {second} overlap at {}", path.display())]
    OverlappingWorkspaces {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("Workspace preparation failed: {0}")]
    Workspace(#[from] GitError),

    #[error("Cannot resolve working directory {}: {source}", path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No terminal backend available (tried: {})", format_kinds(tried))]
    NoBackend { tried: Vec<BackendKind> },

    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),
}

impl SessionError {
    pub fn is_launch_error(&self) -> bool {
        matches!(
            self,
            SessionError::Terminal(TerminalError::LaunchFailed { .. })
        )
    }
}

fn format_kinds(kinds: &[BackendKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(BackendKind::display_name)
        .collect::<Vec<_>>()
        .join(", ")
}
