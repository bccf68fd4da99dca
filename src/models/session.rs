// ABOUTME: Session data model for an agent launched into a terminal tab
// Nothing here is persisted; the terminal emulator owns the process once launched

use crate::terminal::{session_title, BackendKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub agent_name: String,
    pub working_directory: PathBuf,
    pub command: String,
    pub backend_kind: BackendKind,
    pub launched_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        agent_name: String,
        working_directory: PathBuf,
        command: String,
        backend_kind: BackendKind,
    ) -> Self {
        Self {
            agent_name,
            working_directory,
            command,
            backend_kind,
            launched_at: Utc::now(),
        }
    }

    /// Tab title the session can be found by.
    pub fn title(&self) -> String {
        session_title(&self.agent_name)
    }
}
