//! Typed per-stage outcomes, plus the two small unconditional stages that
//! don't warrant a module of their own.

use crate::error::Result;
use crate::io;
use crate::paths::Paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// StageReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    Skipped,
    Warn,
    Failed,
}

/// Outcome of one bootstrap stage. Fatal setup errors are not reports —
/// those propagate as [`crate::BootError`] and abort the run.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub status: StageStatus,
    pub detail: String,
}

impl StageReport {
    pub fn ok(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Ok,
            detail: detail.into(),
        }
    }

    pub fn skipped(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            detail: detail.into(),
        }
    }

    pub fn warn(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Warn,
            detail: detail.into(),
        }
    }

    pub fn failed(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Log-directory initializer
// ---------------------------------------------------------------------------

/// Create the log tree. Leaf stage, runs first; failure is fatal since
/// nothing downstream may log without it.
pub fn create_log_dirs(paths: &Paths) -> Result<StageReport> {
    io::ensure_dir(&paths.log_dir)?;
    io::ensure_dir(&paths.commands_dir())?;
    io::ensure_dir(&paths.services_dir())?;
    Ok(StageReport::ok("log-dirs", "log directories ready"))
}

// ---------------------------------------------------------------------------
// Command-logging hook installer
// ---------------------------------------------------------------------------

const HOOK_START: &str = "# >>> yoloboot command log >>>";
const HOOK_END: &str = "# <<< yoloboot command log <<<";

/// Install the shell hook that appends every interactive command to the
/// current command log. The managed block in `.bashrc` is replaced in place
/// on each run so the hook always points at this invocation's log file.
pub fn install_command_log_hook(
    paths: &Paths,
    enabled: bool,
    command_log: &Path,
) -> Result<StageReport> {
    if !enabled {
        return Ok(StageReport::skipped(
            "command-log",
            "ENABLE_COMMAND_LOGGING not set",
        ));
    }
    let block = format!(
        "{HOOK_START}\n\
         export PROMPT_COMMAND='history -a; tail -n 1 \"$HISTFILE\" >> \"{}\"'\n\
         {HOOK_END}",
        command_log.display()
    );
    io::upsert_marked_block(&paths.bashrc(), HOOK_START, HOOK_END, &block)?;
    Ok(StageReport::ok(
        "command-log",
        format!("interactive commands logged to {}", command_log.display()),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
