//! Liveness probes: post-launch checks used as a proxy for "the daemon
//! started successfully".
//!
//! The probe is polled on an interval up to a deadline instead of a single
//! fixed sleep, so a slow-starting daemon is given its full window and a
//! fast failure is reported as soon as the process dies.

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use crate::process::DaemonHandle;
use crate::{DaemonError, Result};

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// The process must still be alive at the end of the window. Succeeds
    /// only by surviving the full deadline.
    ProcessAlive,
    /// A network interface whose name starts with the prefix must appear
    /// (e.g. "tun" for a VPN). Succeeds as soon as it shows up.
    InterfacePrefix(String),
}

#[derive(Debug, Clone)]
pub struct ReadyPoll {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for ReadyPoll {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            deadline: Duration::from_secs(5),
        }
    }
}

impl ReadyPoll {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// wait_ready
// ---------------------------------------------------------------------------

/// Poll `probe` against a freshly spawned daemon until it is satisfied, the
/// process dies, or the deadline passes.
///
/// `net_dir` is the interface listing directory (normally `/sys/class/net`),
/// injected so tests can fabricate interfaces.
pub async fn wait_ready(
    handle: &mut DaemonHandle,
    probe: &Probe,
    poll: &ReadyPoll,
    net_dir: &Path,
) -> Result<()> {
    let started = Instant::now();
    loop {
        if let Some(status) = handle.try_exit_status()? {
            return Err(DaemonError::ExitedEarly {
                name: handle.name().to_string(),
                status: status.to_string(),
            });
        }

        let elapsed = started.elapsed();
        match probe {
            Probe::ProcessAlive => {
                if elapsed >= poll.deadline {
                    // Survived the window.
                    return Ok(());
                }
            }
            Probe::InterfacePrefix(prefix) => {
                if interface_present(net_dir, prefix) {
                    return Ok(());
                }
                if elapsed >= poll.deadline {
                    return Err(DaemonError::NotReady {
                        name: handle.name().to_string(),
                        secs: poll.deadline.as_secs(),
                    });
                }
            }
        }

        tokio::time::sleep(poll.interval).await;
    }
}

/// Scan an interface listing directory for a name with the given prefix.
pub fn interface_present(net_dir: &Path, prefix: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(net_dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with(prefix))
}

/// Find the first interface matching a prefix, if any.
pub fn find_interface(net_dir: &Path, prefix: &str) -> Option<String> {
    let entries = std::fs::read_dir(net_dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .find(|name| name.starts_with(prefix))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
