//! The bootstrap sequence. Runs once per container start, before control is
//! handed to the interactive shell.
//!
//! Stage severity is explicit: log directories, materialization, and git
//! identity abort the run on error (nothing downstream is safe without
//! them); the command-log hook and the four service activators never do.

use crate::output;
use anyhow::Context;
use yoloboot_core::{
    gitident, materialize, services, stage, BootConfig, Paths, SafetyLog, StageReport,
};

pub fn run(json: bool) -> anyhow::Result<()> {
    let started = chrono::Utc::now();
    let paths = Paths::from_env().context("failed to resolve filesystem roots")?;
    let config = BootConfig::from_env();
    let mut reports: Vec<StageReport> = Vec::new();

    // Log directories first: every later stage appends to the safety log.
    let report = stage::create_log_dirs(&paths).context("failed to create log directories")?;
    let safety = SafetyLog::new(paths.safety_log());
    record(&safety, report, &mut reports, json);

    // Materialize templates before git identity — the hook path set below
    // points into the materialized hooks directory.
    let outcome =
        materialize::materialize(&paths).context("configuration materialization failed")?;
    record(&safety, outcome.report(), &mut reports, json);

    let report = gitident::configure(
        &paths,
        config.web_terminal_enabled(),
        &mut gitident::TerminalPrompt,
    )
    .context("git identity configuration failed")?;
    record(&safety, report, &mut reports, json);

    let command_log = paths.command_log(started);
    let report = match stage::install_command_log_hook(&paths, config.command_logging, &command_log)
    {
        Ok(report) => report,
        // A broken .bashrc hook is an inconvenience, not a reason to abort.
        Err(e) => StageReport::warn("command-log", format!("hook not installed: {e}")),
    };
    record(&safety, report, &mut reports, json);

    let rt = tokio::runtime::Runtime::new()?;
    for report in rt.block_on(services::activate_all(&paths, &config)) {
        record(&safety, report, &mut reports, json);
    }

    if json {
        output::print_json(&reports)?;
    }
    Ok(())
}

fn record(safety: &SafetyLog, report: StageReport, reports: &mut Vec<StageReport>, json: bool) {
    if !json {
        output::banner(&report);
    }
    if let Err(e) = safety.append(&report) {
        tracing::warn!("failed to append safety log record: {e}");
    }
    reports.push(report);
}
