//! Web terminal activator: ttyd attached to a persistent tmux session, so
//! a browser reconnect lands in the same shell.

use crate::config::{ServiceConfig, WebTerminalConfig};
use crate::paths::{default_net_dir, Paths};
use crate::stage::StageReport;
use daemon_host::{wait_ready, DaemonHandle, DaemonSpec, Probe, ReadyPoll};
use std::time::Duration;

pub const STAGE: &str = "web-terminal";

const STARTUP_WINDOW: Duration = Duration::from_secs(2);

pub async fn activate(paths: &Paths, cfg: &ServiceConfig<WebTerminalConfig>) -> StageReport {
    let cfg = match super::gated(STAGE, cfg, "WEBTERMINAL_ENABLED not set") {
        Ok(cfg) => cfg,
        Err(report) => return report,
    };
    match launch(paths, cfg).await {
        Ok(report) => report,
        Err(e) => StageReport::failed(STAGE, e.to_string()),
    }
}

async fn launch(paths: &Paths, cfg: &WebTerminalConfig) -> daemon_host::Result<StageReport> {
    let mut spec = DaemonSpec::new(STAGE, "ttyd", paths.service_log(STAGE))
        .args(["-p".to_string(), cfg.port.to_string()]);
    if let Some(auth) = &cfg.auth {
        spec = spec.args(["-c".to_string(), format!("{}:{}", auth.user, auth.pass)]);
    }
    // -W: writable; the rest attaches to (or creates) the shared session.
    let spec = spec.args(["-W", "tmux", "new", "-A", "-s", "main"]);

    let mut handle = DaemonHandle::spawn(&spec)?;
    wait_ready(
        &mut handle,
        &Probe::ProcessAlive,
        &ReadyPoll::with_deadline(STARTUP_WINDOW),
        default_net_dir(),
    )
    .await?;
    handle.detach();

    let url = format!("http://localhost:{}", cfg.port);
    Ok(if cfg.auth.is_some() {
        StageReport::ok(STAGE, format!("web terminal at {url}, authentication enabled"))
    } else {
        StageReport::warn(
            STAGE,
            format!("web terminal at {url} without authentication"),
        )
    })
}
