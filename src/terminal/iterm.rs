// ABOUTME: iTerm2 backend driven through AppleScript via osascript
// The session name doubles as the lookup key for closing tabs later

use super::backend::{session_title, BackendKind, LaunchOptions, TerminalBackend};
use super::error::TerminalError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

const OSASCRIPT: &str = "osascript";

const PROBE_SCRIPT: &str =
    r#"tell application "System Events" to (name of processes) contains "iTerm2""#;

#[derive(Debug, Clone)]
pub struct ItermBackend {
    program: String,
}

impl ItermBackend {
    pub fn new() -> Self {
        Self::with_program(OSASCRIPT)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn launch_script(options: &LaunchOptions) -> String {
        let cwd = options.cwd.display().to_string();
        let line = format!("cd {} && {}", shell_words::quote(&cwd), options.command);

        format!(
            r#"tell application "iTerm2"
  tell current window
    create tab with default profile
    tell current session
      write text "{}"
      set name to "{}"
    end tell
  end tell
end tell"#,
            applescript_escape(&line),
            applescript_escape(&options.title())
        )
    }

    /// Walks windows, tabs and sessions from the last index down, so closing one
    /// never shifts the positions still to be visited.
    pub fn close_script(name: &str) -> String {
        format!(
            r#"tell application "iTerm2"
  set closedCount to 0
  repeat with wi from (count of windows) to 1 by -1
    set w to window wi
    repeat with ti from (count of tabs of w) to 1 by -1
      set t to tab ti of w
      repeat with si from (count of sessions of t) to 1 by -1
        set s to session si of t
        if name of s contains "{}" then
          close s
          set closedCount to closedCount + 1
        end if
      end repeat
    end repeat
  end repeat
  return closedCount
end tell"#,
            applescript_escape(&session_title(name))
        )
    }

    async fn osascript(&self, script: &str) -> Result<Output, TerminalError> {
        debug!("Running {} ({} bytes of script)", self.program, script.len());
        Command::new(&self.program)
            .args(["-e", script])
            .output()
            .await
            .map_err(|source| TerminalError::Process {
                program: self.program.clone(),
                source,
            })
    }
}

impl Default for ItermBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl TerminalBackend for ItermBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Iterm
    }

    async fn probe(&self) -> Result<bool, TerminalError> {
        match self.osascript(PROBE_SCRIPT).await {
            Ok(output) => Ok(output.status.success()
                && String::from_utf8_lossy(&output.stdout).trim() == "true"),
            Err(TerminalError::Process { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!("{} not available", self.program);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<(), TerminalError> {
        let output = self.osascript(&Self::launch_script(options)).await?;
        if !output.status.success() {
            return Err(TerminalError::LaunchFailed {
                backend: BackendKind::Iterm,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Launched iTerm2 tab {}", options.title());
        Ok(())
    }

    async fn close_by_name(&self, names: &[String]) -> Result<usize, TerminalError> {
        let mut closed = 0;
        for name in names {
            let output = self.osascript(&Self::close_script(name)).await?;
            if !output.status.success() {
                return Err(TerminalError::CommandFailed {
                    backend: BackendKind::Iterm,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let count: usize = stdout.parse().map_err(|_| TerminalError::UnexpectedOutput {
                program: self.program.clone(),
                output: stdout.clone(),
            })?;
            if count == 0 {
                debug!("No iTerm2 session for {}", name);
            } else {
                info!("Closed {} iTerm2 session(s) for {}", count, name);
            }
            closed += count;
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_launch_script_sets_title_and_directory() {
        let options = LaunchOptions {
            name: "agent1".to_string(),
            cwd: PathBuf::from("/work/agent one"),
            command: "echo hi".to_string(),
        };

        let script = ItermBackend::launch_script(&options);
        assert!(script.contains(r#"write text "cd '/work/agent one' && echo hi""#));
        assert!(script.contains(r#"set name to "Claude [agent1]""#));
        assert!(script.contains("create tab with default profile"));
    }

    #[test]
    fn test_launch_script_escapes_quotes() {
        let options = LaunchOptions {
            name: "agent1".to_string(),
            cwd: PathBuf::from("/work"),
            command: r#"echo "hi""#.to_string(),
        };

        let script = ItermBackend::launch_script(&options);
        assert!(script.contains(r#"&& echo \"hi\""#));
    }

    #[test]
    fn test_close_script_uses_launch_title() {
        let script = ItermBackend::close_script("agent1");
        assert!(script.contains(r#"if name of s contains "Claude [agent1]" then"#));
        assert!(script.contains("return closedCount"));
    }

    #[test]
    fn test_close_script_visits_collections_backwards() {
        let script = ItermBackend::close_script("agent1");
        assert!(script.contains("repeat with wi from (count of windows) to 1 by -1"));
        assert!(script.contains("repeat with ti from (count of tabs of w) to 1 by -1"));
        assert!(script.contains("repeat with si from (count of sessions of t) to 1 by -1"));
        assert!(!script.contains(" in sessions of "));
        assert!(!script.contains(" in tabs of "));
    }

    #[test]
    fn test_applescript_escape() {
        assert_eq!(applescript_escape(r#"a "b" \c"#), r#"a \"b\" \\c"#);
    }
}
