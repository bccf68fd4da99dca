// ABOUTME: Opens named agent sessions: prepare the workspace, pick a backend, launch
// Each request walks the phases once; nothing is rolled back on failure

use super::error::SessionError;
use crate::config::Config;
use crate::git::WorkspaceManager;
use crate::models::{Session, WorkspaceSpec};
use crate::terminal::{
    preference_order, BackendKind, BackendSelector, EnvSnapshot, LaunchOptions, TerminalBackend,
};
use futures_util::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

lazy_static! {
    static ref AGENT_NAME: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// Where a single `open_session` call currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unstarted,
    WorkspacePreparing,
    WorkspaceReady,
    BackendSelecting,
    Launching,
    Launched,
}

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub agent_name: String,
    pub workspace: WorkspaceSpec,
    pub command: String,
}

type PreferenceFn = Box<dyn Fn() -> Vec<BackendKind> + Send + Sync>;

pub struct SessionOrchestrator {
    workspace: WorkspaceManager,
    selector: BackendSelector,
    preference: PreferenceFn,
}

pub fn validate_agent_name(name: &str) -> Result<(), SessionError> {
    if AGENT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(SessionError::InvalidAgentName(name.to_string()))
    }
}

impl SessionOrchestrator {
    /// `preference` is called on every selection so it can look at the host as it is now.
    pub fn new<F>(workspace: WorkspaceManager, selector: BackendSelector, preference: F) -> Self
    where
        F: Fn() -> Vec<BackendKind> + Send + Sync + 'static,
    {
        Self {
            workspace,
            selector,
            preference: Box::new(preference),
        }
    }

    pub fn with_fixed_order(
        workspace: WorkspaceManager,
        selector: BackendSelector,
        order: Vec<BackendKind>,
    ) -> Self {
        Self::new(workspace, selector, move || order.clone())
    }

    pub fn from_config(config: &Config) -> Self {
        let configured = config.preferred_backends.clone();
        Self::new(
            WorkspaceManager::with_git_program(config.git_program.clone()),
            BackendSelector::with_builtin_backends(&config.login_shell),
            move || preference_order(&EnvSnapshot::capture(), &configured),
        )
    }

    #[tracing::instrument(skip(self, spec, command), fields(path = %spec.local_path.display()))]
    pub async fn open_session(
        &self,
        agent_name: &str,
        spec: &WorkspaceSpec,
        command: &str,
    ) -> Result<Session, SessionError> {
        validate_agent_name(agent_name)?;

        let mut phase = SessionPhase::Unstarted;
        let result = self.run(agent_name, spec, command, &mut phase).await;
        if let Err(e) = &result {
            warn!("Session {} failed during {:?}: {}", agent_name, phase, e);
        }
        result
    }

    async fn run(
        &self,
        agent_name: &str,
        spec: &WorkspaceSpec,
        command: &str,
        phase: &mut SessionPhase,
    ) -> Result<Session, SessionError> {
        enter(phase, SessionPhase::WorkspacePreparing);
        self.prepare_workspace(spec).await?;
        // The new tab resolves relative paths against its own directory, not ours
        let working_directory = tokio::fs::canonicalize(&spec.local_path)
            .await
            .map_err(|source| SessionError::WorkingDirectory {
                path: spec.local_path.clone(),
                source,
            })?;
        enter(phase, SessionPhase::WorkspaceReady);

        enter(phase, SessionPhase::BackendSelecting);
        let order = (self.preference)();
        let backend = self
            .selector
            .select_available(&order)
            .await?
            .ok_or(SessionError::NoBackend { tried: order })?;

        enter(phase, SessionPhase::Launching);
        let options = LaunchOptions {
            name: agent_name.to_string(),
            cwd: working_directory,
            command: command.to_string(),
        };
        backend.launch(&options).await?;
        enter(phase, SessionPhase::Launched);

        info!(
            "Launched {} in {} via {}",
            options.title(),
            options.cwd.display(),
            backend.kind()
        );
        Ok(Session::new(
            options.name,
            options.cwd,
            options.command,
            backend.kind(),
        ))
    }

    async fn prepare_workspace(&self, spec: &WorkspaceSpec) -> Result<(), SessionError> {
        if WorkspaceManager::is_valid_repo(&spec.local_path) {
            self.workspace
                .reset_to_remote(&spec.local_path, &spec.branch)
                .await?;
        } else {
            self.workspace
                .ensure_cloned(&spec.remote_url, &spec.branch, &spec.local_path)
                .await?;
        }
        Ok(())
    }

    /// Open several sessions concurrently. Names must be distinct and workspaces must not
    /// overlap; otherwise nothing is started. Each request gets its own result.
    pub async fn open_sessions(
        &self,
        requests: &[SessionRequest],
    ) -> Result<Vec<Result<Session, SessionError>>, SessionError> {
        let mut names = HashSet::new();
        for (i, request) in requests.iter().enumerate() {
            validate_agent_name(&request.agent_name)?;
            if !names.insert(request.agent_name.as_str()) {
                return Err(SessionError::DuplicateAgentName(request.agent_name.clone()));
            }
            if let Some(other) = requests[..i]
                .iter()
                .find(|other| request.workspace.overlaps(&other.workspace.local_path))
            {
                return Err(SessionError::OverlappingWorkspaces {
                    first: other.agent_name.clone(),
                    second: request.agent_name.clone(),
                    path: request.workspace.local_path.clone(),
                });
            }
        }

        let opens = requests.iter().map(|request| {
            self.open_session(&request.agent_name, &request.workspace, &request.command)
        });
        Ok(join_all(opens).await)
    }

    /// Close the tabs launched for `names` on the first available backend.
    pub async fn close_sessions(&self, names: &[String]) -> Result<usize, SessionError> {
        let order = (self.preference)();
        let backend = self
            .selector
            .select_available(&order)
            .await?
            .ok_or(SessionError::NoBackend { tried: order })?;

        let closed = backend.close_by_name(names).await?;
        info!("Closed {} of {} session(s) via {}", closed, names.len(), backend.kind());
        Ok(closed)
    }
}

fn enter(phase: &mut SessionPhase, next: SessionPhase) {
    debug!("{:?} -> {:?}", phase, next);
    *phase = next;
}
