// ABOUTME: Terminal emulator backends for launching named agent sessions
// Provides the shared backend contract, kitty and iTerm2 drivers, detection and selection

pub mod backend;
pub mod detector;
pub mod error;
pub mod iterm;
pub mod kitty;
pub mod selector;

pub use backend::{session_title, BackendKind, LaunchOptions, TerminalBackend};
pub use detector::{detect_terminal, preference_order, EnvSnapshot};
pub use error::TerminalError;
pub use iterm::ItermBackend;
pub use kitty::KittyBackend;
pub use selector::BackendSelector;
