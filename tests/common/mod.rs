// ABOUTME: Shared fixtures for integration tests: upstream repositories and stub terminal backends
#![allow(dead_code)]

use agent_spawn::terminal::{BackendKind, LaunchOptions, TerminalBackend, TerminalError};
use async_trait::async_trait;
use git2::{Repository, Signature};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Create a non-bare repository at `path` whose `main` branch holds `files`.
pub fn create_upstream(path: &Path, files: &[(&str, &str)]) -> Repository {
    std::fs::create_dir_all(path).expect("Failed to create upstream dir");
    let repo = Repository::init(path).expect("Failed to init upstream repo");
    commit_files(&repo, files, "Initial commit");
    repo.set_head("refs/heads/main").expect("Failed to point HEAD at main");
    repo
}

/// Commit `files` on top of `main`.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) {
    let workdir = repo.workdir().expect("Upstream must have a working tree").to_path_buf();
    let mut index = repo.index().unwrap();
    for (name, content) in files {
        std::fs::write(workdir.join(name), content).unwrap();
        index.add_path(Path::new(name)).unwrap();
    }
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = Signature::now("Test User", "test@example.com").unwrap();

    let parent = repo
        .find_reference("refs/heads/main")
        .ok()
        .and_then(|r| r.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(
        Some("refs/heads/main"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .unwrap();
}

/// Every file under `dir` except `.git`, keyed by relative path.
pub fn tree_snapshot(dir: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    visit(dir, dir, &mut files);
    files
}

fn visit(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) {
    for entry in std::fs::read_dir(dir).unwrap().flatten() {
        let path = entry.path();
        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }
        if path.is_dir() {
            visit(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().display().to_string();
            files.insert(relative, std::fs::read_to_string(&path).unwrap_or_default());
        }
    }
}

/// Write an executable shell script standing in for a terminal CLI. Every call
/// appends its arguments to `calls.log` next to the script.
#[cfg(unix)]
pub fn fake_program(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"$(dirname \"$0\")/calls.log\"\n{body}\n"
    );
    std::fs::write(&path, script).expect("Failed to write fake program");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark fake program executable");
    path
}

/// Argument lines recorded by `fake_program` scripts in `dir`.
pub fn recorded_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Backend that records what it was asked to do instead of driving a terminal.
#[derive(Clone)]
pub struct StubBackend {
    kind: BackendKind,
    available: bool,
    fail_launch: bool,
    pub probes: Arc<AtomicUsize>,
    pub launches: Arc<Mutex<Vec<LaunchOptions>>>,
}

impl StubBackend {
    pub fn new(kind: BackendKind, available: bool) -> Self {
        Self {
            kind,
            available,
            fail_launch: false,
            probes: Arc::new(AtomicUsize::new(0)),
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_launch(kind: BackendKind) -> Self {
        Self {
            fail_launch: true,
            ..Self::new(kind, true)
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn launched(&self) -> Vec<LaunchOptions> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TerminalBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn probe(&self) -> Result<bool, TerminalError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.available)
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<(), TerminalError> {
        if self.fail_launch {
            return Err(TerminalError::LaunchFailed {
                backend: self.kind,
                stderr: "stub refused".to_string(),
            });
        }
        self.launches.lock().unwrap().push(options.clone());
        Ok(())
    }
}
