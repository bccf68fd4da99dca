// ABOUTME: Shared contract for terminal emulator backends
// Backends are addressed by kind; sessions are found again only through their title label

use super::error::TerminalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const TITLE_PREFIX: &str = "Claude";

/// Visible title of the tab launched for `name`. Launch and close both go through here.
pub fn session_title(name: &str) -> String {
    format!("{TITLE_PREFIX} [{name}]")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Kitty,
    #[serde(alias = "iterm2")]
    Iterm,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Kitty, BackendKind::Iterm];

    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Kitty => "Kitty",
            BackendKind::Iterm => "iTerm2",
        }
    }

    /// Executable the backend drives; absent from `PATH` means the backend cannot work.
    pub fn companion_program(&self) -> &'static str {
        match self {
            BackendKind::Kitty => "kitten",
            BackendKind::Iterm => "osascript",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub name: String,
    pub cwd: PathBuf,
    pub command: String,
}

impl LaunchOptions {
    pub fn title(&self) -> String {
        session_title(&self.name)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TerminalBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether the emulator is running and scriptable. "Not available" is `Ok(false)`;
    /// only unexpected system failures are errors.
    async fn probe(&self) -> Result<bool, TerminalError>;

    /// Open a titled tab running `command` in `cwd`. Returns once the emulator
    /// acknowledged the request; the command itself is never awaited.
    async fn launch(&self, options: &LaunchOptions) -> Result<(), TerminalError>;

    /// Close every session titled after one of `names`, returning how many closed.
    /// Names with no open session are skipped.
    async fn close_by_name(&self, names: &[String]) -> Result<usize, TerminalError> {
        let _ = names;
        Err(TerminalError::CloseUnsupported(self.kind()))
    }
}
