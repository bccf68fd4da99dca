// ABOUTME: Command-line entry point for agent-spawn
// Opens, closes and inspects agent sessions from inside a git checkout

use agent_spawn::config::Config;
use agent_spawn::git::WorkspaceManager;
use agent_spawn::models::WorkspaceSpec;
use agent_spawn::session::{SessionError, SessionOrchestrator};
use agent_spawn::terminal::{
    detect_terminal, preference_order, BackendKind, BackendSelector, EnvSnapshot, TerminalBackend,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser)]
#[command(name = "agent-spawn", version, about)]
struct Cli {
    /// Config file to use instead of ~/.agent-spawn/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare a checkout for AGENT and launch COMMAND in a new terminal tab
    Open {
        agent: String,
        /// Remote to clone; defaults to the current repository's origin
        #[arg(long)]
        remote: Option<String>,
        /// Branch to check out; defaults to the current branch
        #[arg(long)]
        branch: Option<String>,
        /// Checkout location; defaults to <repo root>/<workspaces_dir>/<AGENT>
        #[arg(long)]
        path: Option<PathBuf>,
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Close the tabs launched for the given agents
    Close {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show the detected terminal and which backends respond
    Detect,
    /// Show origin, branch and root of the current repository
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Open {
            agent,
            remote,
            branch,
            path,
            json,
            command,
        } => open(config, agent, remote, branch, path, json, command).await,
        Commands::Close { names } => {
            let orchestrator = SessionOrchestrator::from_config(config);
            let closed = orchestrator.close_sessions(&names).await?;
            println!("Closed {} of {} session(s)", closed, names.len());
            Ok(())
        }
        Commands::Detect => detect(config).await,
        Commands::Info => {
            let manager = WorkspaceManager::with_git_program(config.git_program.clone());
            let cwd = std::env::current_dir()?;
            let info = manager.repo_info(&cwd).await?;
            println!("remote: {}", info.remote);
            println!("branch: {}", info.branch);
            println!("root:   {}", info.root.display());
            Ok(())
        }
    }
}

async fn open(
    config: &Config,
    agent: String,
    remote: Option<String>,
    branch: Option<String>,
    path: Option<PathBuf>,
    json: bool,
    command: Vec<String>,
) -> Result<()> {
    let manager = WorkspaceManager::with_git_program(config.git_program.clone());

    let repo = if remote.is_none() || branch.is_none() || path.is_none() {
        let cwd = std::env::current_dir()?;
        Some(
            manager
                .repo_info(&cwd)
                .await
                .context("Run inside a git repository or pass --remote, --branch and --path")?,
        )
    } else {
        None
    };

    let local_path = match path {
        Some(path) => path,
        None => {
            let repo = repo.as_ref().context("No --path given")?;
            WorkspaceManager::configure_ignore(&repo.root, &config.workspaces_ignore_pattern())?;
            repo.root.join(&config.workspaces_dir).join(&agent)
        }
    };

    let spec = WorkspaceSpec {
        remote_url: remote
            .or_else(|| repo.as_ref().map(|r| r.remote.clone()))
            .context("No remote given")?,
        branch: branch
            .or_else(|| repo.as_ref().map(|r| r.branch.clone()))
            .filter(|b| !b.is_empty())
            .context("No branch given and HEAD is detached")?,
        local_path,
    };

    let command = if command.is_empty() {
        config.default_command.clone()
    } else {
        shell_words::join(&command)
    };

    let orchestrator = SessionOrchestrator::from_config(config);
    match orchestrator.open_session(&agent, &spec, &command).await {
        Ok(session) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!(
                    "Opened \"{}\" in {} ({})",
                    session.title(),
                    session.working_directory.display(),
                    session.backend_kind
                );
            }
            Ok(())
        }
        Err(e @ SessionError::NoBackend { .. }) => {
            println!("Workspace ready at {}", spec.local_path.display());
            println!("No supported terminal found. Run it yourself:");
            println!(
                "  cd {} && {}",
                shell_words::quote(&spec.local_path.display().to_string()),
                command
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn detect(config: &Config) -> Result<()> {
    let env = EnvSnapshot::capture();
    match detect_terminal(&env) {
        Some(kind) => println!("Running inside: {}", kind),
        None => println!("Running inside: unknown"),
    }

    let selector = BackendSelector::with_builtin_backends(&config.login_shell);
    for kind in BackendKind::ALL {
        let Some(backend) = selector.backend(kind) else {
            continue;
        };
        let status = match backend.probe().await {
            Ok(true) => "available".to_string(),
            Ok(false) => "unavailable".to_string(),
            Err(e) => format!("error: {}", e),
        };
        println!("{:<8} {}", kind.display_name(), status);
    }

    let order = preference_order(&env, &config.preferred_backends);
    let order: Vec<&str> = order.iter().map(BackendKind::display_name).collect();
    println!("Preference order: {}", order.join(", "));
    Ok(())
}

/// Create `log_dir` if needed and open a fresh timestamped log file in it.
fn open_log_file(log_dir: &Path) -> std::io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = log_dir.join(format!(
        "agent-spawn-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = OpenOptions::new().create(true).append(true).open(&log_file)?;
    Ok((file, log_file))
}

fn setup_logging() {
    use std::sync::Mutex;
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::prelude::*;

    let log_dir = Config::app_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from(".agent-spawn/logs"));

    let (writer, ansi) = match open_log_file(&log_dir) {
        Ok((file, _)) => (BoxMakeWriter::new(Mutex::new(file)), false),
        Err(e) => {
            eprintln!(
                "Cannot write logs under {} ({}), logging to stderr",
                log_dir.display(),
                e
            );
            (BoxMakeWriter::new(std::io::stderr), true)
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(writer)
                .with_ansi(ansi),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_spawn=info".into()),
        )
        .init();
}
