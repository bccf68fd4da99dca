// ABOUTME: Library crate for agent-spawn exposing workspace provisioning and terminal launching

pub mod config;
pub mod git;
pub mod models;
pub mod session;
pub mod terminal;

pub use config::Config;
pub use models::{Session, WorkspaceSpec};
pub use session::{SessionError, SessionOrchestrator};
