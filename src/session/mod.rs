// ABOUTME: Session orchestration for agent workspaces and terminal tabs
// Coordinates workspace preparation, backend selection and launch

pub mod error;
pub mod orchestrator;

pub use error::SessionError;
pub use orchestrator::{validate_agent_name, SessionOrchestrator, SessionPhase, SessionRequest};
