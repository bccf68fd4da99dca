// ABOUTME: Brings a local checkout to a known remote/branch state through the git CLI
// Clone-if-absent and reset-if-present are separate operations with separate failure modes

use super::error::{GitError, ResetStep};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

const IGNORE_FILE: &str = ".gitignore";

/// Origin, current branch and top-level directory of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInfo {
    pub remote: String,
    pub branch: String,
    pub root: PathBuf,
}

impl RepoInfo {
    pub fn repo_name(&self) -> &str {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repository")
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    git_program: String,
}

impl WorkspaceManager {
    pub fn new() -> Self {
        Self::with_git_program("git")
    }

    pub fn with_git_program(program: impl Into<String>) -> Self {
        Self {
            git_program: program.into(),
        }
    }

    /// A directory that exists and holds `.git` metadata. Never touches the tree.
    pub fn is_valid_repo(dir: &Path) -> bool {
        dir.is_dir() && dir.join(".git").exists()
    }

    /// Clone `remote` at `branch` into `destination` unless it is already a checkout.
    ///
    /// An existing path without git metadata is rejected rather than reinitialized,
    /// even when the directory is empty.
    pub async fn ensure_cloned(
        &self,
        remote: &str,
        branch: &str,
        destination: &Path,
    ) -> Result<(), GitError> {
        if destination.exists() {
            if Self::is_valid_repo(destination) {
                debug!("{} is already a checkout, skipping clone", destination.display());
                return Ok(());
            }
            return Err(GitError::Clone {
                remote: remote.to_string(),
                branch: branch.to_string(),
                destination: destination.to_path_buf(),
                reason: "destination exists but is not a git repository".to_string(),
            });
        }

        info!("Cloning {} ({}) into {}", remote, branch, destination.display());
        let output = self
            .git(
                None,
                [
                    OsStr::new("clone"),
                    OsStr::new("-b"),
                    OsStr::new(branch),
                    OsStr::new(remote),
                    destination.as_os_str(),
                ],
            )
            .await?;

        if !output.status.success() {
            return Err(GitError::Clone {
                remote: remote.to_string(),
                branch: branch.to_string(),
                destination: destination.to_path_buf(),
                reason: stderr_of(&output),
            });
        }

        info!("Cloned {} into {}", remote, destination.display());
        Ok(())
    }

    /// Fetch, checkout, hard-reset to `origin/<branch>` and clean untracked files.
    ///
    /// A failing step aborts the rest; earlier steps are not rolled back.
    pub async fn reset_to_remote(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        if !Self::is_valid_repo(dir) {
            return Err(GitError::NotARepository(dir.to_path_buf()));
        }

        let origin_ref = format!("origin/{branch}");
        let steps: [(ResetStep, Vec<&str>); 4] = [
            (ResetStep::Fetch, vec!["fetch", "origin"]),
            (ResetStep::Checkout, vec!["checkout", branch]),
            (ResetStep::Reset, vec!["reset", "--hard", origin_ref.as_str()]),
            (ResetStep::Clean, vec!["clean", "-fd"]),
        ];

        info!("Resetting {} to {}", dir.display(), origin_ref);
        for (step, args) in steps {
            let output = self.git(Some(dir), args).await?;
            if !output.status.success() {
                return Err(GitError::Reset {
                    step,
                    dir: dir.to_path_buf(),
                    stderr: stderr_of(&output),
                });
            }
            debug!("git {} done in {}", step, dir.display());
        }

        Ok(())
    }

    /// Append `pattern` to `<root>/.gitignore` unless a line already equals it.
    /// Trailing whitespace is ignored on both sides. Returns whether the file changed.
    pub fn configure_ignore(root: &Path, pattern: &str) -> Result<bool, GitError> {
        let pattern = pattern.trim_end();
        let path = root.join(IGNORE_FILE);
        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        if existing.lines().any(|line| line.trim_end() == pattern) {
            return Ok(false);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{pattern}")?;

        info!("Added {} to {}", pattern, path.display());
        Ok(true)
    }

    /// Remote, branch and root of the checkout containing `dir`.
    pub async fn repo_info(&self, dir: &Path) -> Result<RepoInfo, GitError> {
        let (remote, branch, root) = tokio::try_join!(
            self.capture(dir, ["remote", "get-url", "origin"]),
            self.capture(dir, ["branch", "--show-current"]),
            self.capture(dir, ["rev-parse", "--show-toplevel"]),
        )?;

        Ok(RepoInfo {
            remote,
            branch,
            root: PathBuf::from(root),
        })
    }

    pub async fn is_git_repo(&self, dir: &Path) -> bool {
        self.git(Some(dir), ["rev-parse", "--git-dir"])
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub async fn git_root(&self, dir: &Path) -> Result<PathBuf, GitError> {
        self.capture(dir, ["rev-parse", "--show-toplevel"])
            .await
            .map(PathBuf::from)
    }

    async fn capture<const N: usize>(
        &self,
        dir: &Path,
        args: [&str; N],
    ) -> Result<String, GitError> {
        let output = self.git(Some(dir), args).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            // git's wording; untranslated locales only
            if stderr.contains("No such remote") {
                return Err(GitError::NoOriginRemote);
            }
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn git<I, S>(&self, dir: Option<&Path>, args: I) -> Result<Output, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.git_program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        debug!("Running {:?}", cmd.as_std());

        cmd.output().await.map_err(|source| GitError::Process {
            program: self.git_program.clone(),
            source,
        })
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new()
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
