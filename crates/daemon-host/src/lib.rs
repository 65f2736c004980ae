//! Background daemon management for the bootstrap orchestrator.
//!
//! Daemons are spawned with their output redirected to per-service log
//! files, probed for readiness on a bounded poll loop, and then detached —
//! they must outlive the orchestrator, which only runs as the container's
//! entry sequence.

mod error;
pub mod probe;
pub mod process;

pub use error::{DaemonError, Result};
pub use probe::{find_interface, interface_present, wait_ready, Probe, ReadyPoll};
pub use process::{run_capture, DaemonHandle, DaemonSpec};
