use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::{DaemonError, Result};

// ---------------------------------------------------------------------------
// DaemonSpec
// ---------------------------------------------------------------------------

/// Launch plan for one background daemon: binary, arguments, and the log
/// file that receives its stdout and stderr.
#[derive(Debug, Clone)]
pub struct DaemonSpec {
    /// Display name used in errors and log lines.
    pub name: String,
    /// Binary name, resolved on PATH at spawn time.
    pub binary: String,
    pub args: Vec<String>,
    pub log_path: PathBuf,
}

impl DaemonSpec {
    pub fn new(name: &str, binary: &str, log_path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            binary: binary.to_string(),
            args: Vec::new(),
            log_path,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

// ---------------------------------------------------------------------------
// DaemonHandle
// ---------------------------------------------------------------------------

/// A spawned background daemon.
///
/// Dropping the handle does NOT kill the process — daemons started during
/// bootstrap must outlive the orchestrator, which exits and hands control
/// to an interactive shell. Call [`DaemonHandle::detach`] once the
/// readiness check is done.
pub struct DaemonHandle {
    name: String,
    child: Child,
}

impl DaemonHandle {
    /// Resolve the binary on PATH and spawn it with stdin closed and both
    /// output streams appended to the spec's log file.
    pub fn spawn(spec: &DaemonSpec) -> Result<Self> {
        let binary = which::which(&spec.binary).map_err(|_| DaemonError::NotFound {
            binary: spec.binary.clone(),
        })?;

        if let Some(parent) = spec.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spec.log_path)?;
        let log_err = log.try_clone()?;

        tracing::debug!(name = %spec.name, binary = %binary.display(), "spawning daemon");

        let child = Command::new(binary)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()?;

        Ok(Self {
            name: spec.name.clone(),
            child,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Non-blocking exit check. `Ok(None)` means still running.
    pub fn try_exit_status(&mut self) -> Result<Option<std::process::ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Release the process to run on its own. The OS reparents it when the
    /// orchestrator exits; we keep no supervision over it afterwards.
    pub fn detach(self) -> Option<u32> {
        let pid = self.child.id();
        drop(self.child);
        pid
    }
}

// ---------------------------------------------------------------------------
// Foreground commands
// ---------------------------------------------------------------------------

/// Run a short-lived foreground command and capture its stdout. Used for
/// control commands (`tailscale up`, `tailscale ip`) rather than daemons.
pub async fn run_capture(name: &str, binary: &str, args: &[String]) -> Result<String> {
    let binary = which::which(binary).map_err(|_| DaemonError::NotFound {
        binary: binary.to_string(),
    })?;
    let output = Command::new(binary).args(args).output().await?;
    if !output.status.success() {
        return Err(DaemonError::CommandFailed {
            name: name.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
