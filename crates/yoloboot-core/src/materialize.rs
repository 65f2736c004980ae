//! Configuration materializer: seeds the user config directory from the
//! bundled template tree on first run.
//!
//! The copy is non-destructive (missing files only), so a container killed
//! mid-copy self-heals on the next start and a user-edited file is never
//! overwritten. The config directory itself is the bootstrap marker.

use crate::error::{BootError, Result};
use crate::io;
use crate::paths::Paths;
use crate::stage::StageReport;

#[derive(Debug, PartialEq)]
pub enum MaterializeOutcome {
    FirstRun { copied: usize, linked: usize },
    /// Marker present. `healed` counts files a partial prior copy left
    /// missing; normally zero.
    Reused { healed: usize },
}

pub fn materialize(paths: &Paths) -> Result<MaterializeOutcome> {
    let config_dir = paths.config_dir();
    let first_run = !config_dir.exists();

    if !paths.templates.is_dir() {
        if first_run {
            return Err(BootError::TemplatesMissing(paths.templates.clone()));
        }
        // Nothing to heal from, but the environment is already set up.
        return Ok(MaterializeOutcome::Reused { healed: 0 });
    }

    let copied = io::copy_missing(&paths.templates, &config_dir)?;

    // Hook scripts must be executable regardless of how they arrived.
    let hooks_dir = paths.hooks_dir();
    if hooks_dir.is_dir() {
        for entry in std::fs::read_dir(&hooks_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "sh") {
                io::make_executable(&path)?;
            }
        }
    }

    // Expose bundled helper scripts on the search path.
    let mut linked = 0;
    let bundled_bin = paths.bundled_bin_dir();
    if bundled_bin.is_dir() {
        let helper_bin = paths.helper_bin_dir();
        for entry in std::fs::read_dir(&bundled_bin)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                io::make_executable(&entry.path())?;
                if io::link_into(&entry.path(), &helper_bin)? {
                    linked += 1;
                }
            }
        }
    }

    if first_run {
        Ok(MaterializeOutcome::FirstRun {
            copied: copied.len(),
            linked,
        })
    } else {
        Ok(MaterializeOutcome::Reused {
            healed: copied.len(),
        })
    }
}

impl MaterializeOutcome {
    pub fn report(&self) -> StageReport {
        match self {
            MaterializeOutcome::FirstRun { copied, linked } => StageReport::ok(
                "materialize",
                format!("first run: {copied} files copied, {linked} helpers linked"),
            ),
            MaterializeOutcome::Reused { healed: 0 } => {
                StageReport::ok("materialize", "using existing configuration")
            }
            MaterializeOutcome::Reused { healed } => StageReport::warn(
                "materialize",
                format!("using existing configuration, restored {healed} missing files"),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
