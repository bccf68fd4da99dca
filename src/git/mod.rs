// ABOUTME: Git integration module for provisioning agent workspaces
// Wraps the git CLI for clone, reset, ignore-file and repository inspection

pub mod error;
pub mod workspace_manager;

pub use error::{GitError, ResetStep};
pub use workspace_manager::{RepoInfo, WorkspaceManager};
