use std::fmt::{self, Display};
use std::process::Stdio;

use log::{debug, info};
use tokio::process::{Child, Command};

/// What is known about a launched client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The OS accepted the spawn; the process may or may not still run.
    Spawned,
    /// The process ended. `None` when it was killed by a signal.
    Exited(Option<i32>),
    /// Its status could not be observed.
    Failed(String),
}

impl Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Spawned => write!(f, "running"),
            SessionState::Exited(Some(code)) => write!(f, "exited with code {}", code),
            SessionState::Exited(None) => write!(f, "terminated by signal"),
            SessionState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// A spawned client. Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct ProcessHandle {
    program: String,
    pid: Option<u32>,
    child: Option<Child>,
    state: SessionState,
}

impl ProcessHandle {
    pub fn from_child(program: impl Into<String>, child: Child) -> Self {
        ProcessHandle {
            program: program.into(),
            pid: child.id(),
            child: Some(child),
            state: SessionState::Spawned,
        }
    }

    /// A handle with nothing to observe; it stays `Spawned`.
    pub fn untracked(program: impl Into<String>) -> Self {
        ProcessHandle {
            program: program.into(),
            pid: None,
            child: None,
            state: SessionState::Spawned,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Poll without blocking.
    pub fn state(&mut self) -> SessionState {
        if self.state == SessionState::Spawned {
            if let Some(child) = self.child.as_mut() {
                self.state = match child.try_wait() {
                    Ok(Some(status)) => SessionState::Exited(status.code()),
                    Ok(None) => SessionState::Spawned,
                    Err(e) => SessionState::Failed(e.to_string()),
                };
            }
        }
        self.state.clone()
    }

    /// Wait for the process to end. Untracked handles return immediately.
    pub async fn wait(&mut self) -> SessionState {
        if self.state == SessionState::Spawned {
            if let Some(child) = self.child.as_mut() {
                self.state = match child.wait().await {
                    Ok(status) => SessionState::Exited(status.code()),
                    Err(e) => SessionState::Failed(e.to_string()),
                };
                info!("'{}' {}", self.program, self.state);
            }
        }
        self.state.clone()
    }
}

/// Starts external processes. The seam tests replace to observe argument vectors.
pub trait Spawner {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<ProcessHandle>;
}

/// Spawns real child processes through tokio. Must run inside a tokio runtime.
///
/// The child inherits the terminal and is not killed when its handle drops.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<ProcessHandle> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .kill_on_drop(false)
            .spawn()?;
        debug!("Spawned '{}' with pid {:?}", program, child.id());
        Ok(ProcessHandle::from_child(program, child))
    }
}
