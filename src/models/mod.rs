// ABOUTME: Core data models for agent sessions and the workspaces they run in

pub mod session;
pub mod workspace;

pub use session::Session;
pub use workspace::WorkspaceSpec;
