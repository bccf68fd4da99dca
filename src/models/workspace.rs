// ABOUTME: Which remote and branch an agent workspace checks out, and where

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    pub remote_url: String,
    pub branch: String,
    pub local_path: PathBuf,
}

impl WorkspaceSpec {
    pub fn new(remote_url: impl Into<String>, branch: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            branch: branch.into(),
            local_path: local_path.into(),
        }
    }

    /// Whether either path contains the other. Two such workspaces cannot be prepared concurrently.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.local_path.starts_with(other) || other.starts_with(&self.local_path)
    }
}
