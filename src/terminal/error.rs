// ABOUTME: Error types for terminal emulator automation
// Launch failures are the emulator's own errors, never the launched command's exit status

use super::backend::BackendKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("{backend} launch failed: {stderr}")]
    LaunchFailed { backend: BackendKind, stderr: String },

    #[error("{backend} automation call failed: {stderr}")]
    CommandFailed { backend: BackendKind, stderr: String },

    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} cannot close sessions by name")]
    CloseUnsupported(BackendKind),

    #[error("Unexpected output from {program}: {output}")]
    UnexpectedOutput { program: String, output: String },
}
