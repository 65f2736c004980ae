//! Cloudflare tunnel activator.
//!
//! Token-based and config-file-based invocations are both supported; the
//! token form wins when both are configured. The tunnel endpoint is
//! negotiated on Cloudflare's side, so there is no address to report —
//! liveness is the process surviving its startup window.

use crate::config::{CloudflaredConfig, ServiceConfig, TunnelSource};
use crate::paths::{default_net_dir, Paths};
use crate::stage::StageReport;
use daemon_host::{wait_ready, DaemonHandle, DaemonSpec, Probe, ReadyPoll};
use std::time::Duration;

pub const STAGE: &str = "cloudflared";

const STARTUP_WINDOW: Duration = Duration::from_secs(2);

pub async fn activate(paths: &Paths, cfg: &ServiceConfig<CloudflaredConfig>) -> StageReport {
    let cfg = match super::gated(
        STAGE,
        cfg,
        "CLOUDFLARED_TUNNEL_TOKEN / CLOUDFLARED_CONFIG not set",
    ) {
        Ok(cfg) => cfg,
        Err(report) => return report,
    };
    match launch(paths, cfg).await {
        Ok(report) => report,
        Err(e) => StageReport::failed(STAGE, e.to_string()),
    }
}

async fn launch(paths: &Paths, cfg: &CloudflaredConfig) -> daemon_host::Result<StageReport> {
    let mut spec = DaemonSpec::new(STAGE, "cloudflared", paths.service_log(STAGE))
        .args(["tunnel", "--no-autoupdate"]);

    if let TunnelSource::ConfigFile(name) = &cfg.source {
        let config_path = paths.cloudflared_dir().join(name);
        if !config_path.is_file() {
            return Ok(StageReport::failed(
                STAGE,
                format!("cloudflared config not found: {}", config_path.display()),
            ));
        }
        spec = spec.args([
            "--config".to_string(),
            config_path.to_string_lossy().into_owned(),
        ]);
    }

    if let Some(port) = cfg.metrics_port {
        spec = spec.args(["--metrics".to_string(), format!("127.0.0.1:{port}")]);
    }

    spec = spec.arg("run");
    if let TunnelSource::Token(token) = &cfg.source {
        spec = spec.args(["--token".to_string(), token.clone()]);
    }

    let mut handle = DaemonHandle::spawn(&spec)?;
    wait_ready(
        &mut handle,
        &Probe::ProcessAlive,
        &ReadyPoll::with_deadline(STARTUP_WINDOW),
        default_net_dir(),
    )
    .await?;
    handle.detach();

    let detail = match cfg.metrics_port {
        Some(port) => format!("tunnel active, metrics on 127.0.0.1:{port}"),
        None => "tunnel active".to_string(),
    };
    Ok(StageReport::ok(STAGE, detail))
}
