// ABOUTME: Kitty backend driven through `kitten @` remote control
// Tabs run the command in a login shell and are held open after it exits

use super::backend::{session_title, BackendKind, LaunchOptions, TerminalBackend};
use super::error::TerminalError;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

const KITTEN: &str = "kitten";

#[derive(Debug, Clone)]
pub struct KittyBackend {
    program: String,
    shell: String,
}

/// One OS window in `kitten @ ls` output; only tab titles matter here.
#[derive(Debug, Deserialize)]
struct OsWindow {
    #[serde(default)]
    tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
struct Tab {
    #[serde(default)]
    title: String,
}

impl KittyBackend {
    pub fn new(shell: impl Into<String>) -> Self {
        Self::with_program(KITTEN, shell)
    }

    pub fn with_program(program: impl Into<String>, shell: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            shell: shell.into(),
        }
    }

    pub fn launch_args(&self, options: &LaunchOptions) -> Vec<String> {
        vec![
            "@".to_string(),
            "launch".to_string(),
            "--type=tab".to_string(),
            "--hold".to_string(),
            format!("--tab-title={}", options.title()),
            format!("--cwd={}", options.cwd.display()),
            self.shell.clone(),
            "-l".to_string(),
            "-c".to_string(),
            options.command.clone(),
        ]
    }

    /// `--match` expression selecting tabs titled for `name`. Kitty treats it as a regex search.
    pub fn title_match(name: &str) -> String {
        format!("title:{}", regex::escape(&session_title(name)))
    }

    /// Titles of every tab in `kitten @ ls` JSON output.
    pub fn tab_titles(ls_output: &str) -> Result<Vec<String>, TerminalError> {
        let windows: Vec<OsWindow> =
            serde_json::from_str(ls_output).map_err(|_| TerminalError::UnexpectedOutput {
                program: KITTEN.to_string(),
                output: ls_output.chars().take(200).collect(),
            })?;
        Ok(windows
            .into_iter()
            .flat_map(|w| w.tabs)
            .map(|t| t.title)
            .collect())
    }

    async fn kitten(&self, args: &[String]) -> Result<Output, TerminalError> {
        debug!("Running {} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| TerminalError::Process {
                program: self.program.clone(),
                source,
            })
    }

    /// Run a remote-control call whose failure is an automation error.
    async fn remote(&self, args: &[String]) -> Result<String, TerminalError> {
        let output = self.kitten(args).await?;
        if !output.status.success() {
            return Err(TerminalError::CommandFailed {
                backend: BackendKind::Kitty,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for KittyBackend {
    fn default() -> Self {
        Self::new("zsh")
    }
}

#[async_trait]
impl TerminalBackend for KittyBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Kitty
    }

    async fn probe(&self) -> Result<bool, TerminalError> {
        match self.kitten(&["@".to_string(), "ls".to_string()]).await {
            Ok(output) => Ok(output.status.success()),
            Err(TerminalError::Process { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!("{} not installed", self.program);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<(), TerminalError> {
        let output = self.kitten(&self.launch_args(options)).await?;
        if !output.status.success() {
            return Err(TerminalError::LaunchFailed {
                backend: BackendKind::Kitty,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Launched kitty tab {}", options.title());
        Ok(())
    }

    /// Counts matching tabs from one `ls` before closing, so a name with several
    /// tabs counts each of them and an unmatched name never reaches `close-tab`.
    async fn close_by_name(&self, names: &[String]) -> Result<usize, TerminalError> {
        let listing = self.remote(&["@".to_string(), "ls".to_string()]).await?;
        let titles = Self::tab_titles(&listing)?;

        let mut closed = 0;
        for name in names {
            let title = session_title(name);
            let matching = titles.iter().filter(|t| t.contains(&title)).count();
            if matching == 0 {
                debug!("No kitty tab for {}", name);
                continue;
            }

            self.remote(&[
                "@".to_string(),
                "close-tab".to_string(),
                "--match".to_string(),
                Self::title_match(name),
            ])
            .await?;
            info!("Closed {} kitty tab(s) for {}", matching, name);
            closed += matching;
        }
        Ok(closed)
    }
}
