//! Tailscale activator: userspace-networking daemon plus a join command.
//!
//! `tailscaled` runs without elevated privileges (`--tun=userspace-networking`),
//! then `tailscale up` joins the tailnet with the configured auth key and
//! hostname. The assigned address is polled for a short window; a node that
//! joined but has no address yet is a warning, not a failure — assignment
//! may complete after the orchestrator moves on.

use crate::config::{ServiceConfig, TailscaleConfig};
use crate::paths::{default_net_dir, Paths};
use crate::stage::StageReport;
use daemon_host::{run_capture, wait_ready, DaemonHandle, DaemonSpec, Probe, ReadyPoll};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;

pub const STAGE: &str = "tailscale";

const STARTUP_WINDOW: Duration = Duration::from_secs(2);
const ADDRESS_DEADLINE: Duration = Duration::from_secs(5);
const ADDRESS_INTERVAL: Duration = Duration::from_millis(250);

pub async fn activate(paths: &Paths, cfg: &ServiceConfig<TailscaleConfig>) -> StageReport {
    let cfg = match super::gated(STAGE, cfg, "TS_AUTHKEY not set") {
        Ok(cfg) => cfg,
        Err(report) => return report,
    };
    match launch(paths, cfg).await {
        Ok(report) => report,
        Err(e) => StageReport::failed(STAGE, e.to_string()),
    }
}

async fn launch(paths: &Paths, cfg: &TailscaleConfig) -> daemon_host::Result<StageReport> {
    let state_dir = paths.tailscale_state_dir();
    std::fs::create_dir_all(&state_dir)?;

    let spec = DaemonSpec::new(STAGE, "tailscaled", paths.service_log(STAGE))
        .arg("--tun=userspace-networking")
        .args([
            "--statedir".to_string(),
            state_dir.to_string_lossy().into_owned(),
        ]);

    let mut handle = DaemonHandle::spawn(&spec)?;
    wait_ready(
        &mut handle,
        &Probe::ProcessAlive,
        &ReadyPoll::with_deadline(STARTUP_WINDOW),
        default_net_dir(),
    )
    .await?;
    handle.detach();

    let mut up_args = vec![
        "up".to_string(),
        "--auth-key".to_string(),
        cfg.auth_key.clone(),
        "--hostname".to_string(),
        cfg.hostname.clone(),
        format!("--accept-dns={}", cfg.accept_dns),
    ];
    up_args.extend(cfg.extra_args.iter().cloned());
    run_capture("tailscale up", "tailscale", &up_args).await?;

    Ok(match poll_address().await {
        Some(addr) => StageReport::ok(
            STAGE,
            format!("joined as {}, address {addr}", cfg.hostname),
        ),
        None => StageReport::warn(
            STAGE,
            format!("joined as {}, address not assigned yet", cfg.hostname),
        ),
    })
}

/// Poll `tailscale ip -4` until an address shows up or the window closes.
async fn poll_address() -> Option<String> {
    let started = Instant::now();
    loop {
        if let Ok(out) = run_capture("tailscale ip", "tailscale", &["ip".to_string(), "-4".to_string()]).await {
            if let Some(addr) = extract_ipv4(&out) {
                return Some(addr.to_string());
            }
        }
        if started.elapsed() >= ADDRESS_DEADLINE {
            return None;
        }
        tokio::time::sleep(ADDRESS_INTERVAL).await;
    }
}

static IPV4_RE: OnceLock<Regex> = OnceLock::new();

fn ipv4_re() -> &'static Regex {
    IPV4_RE.get_or_init(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap())
}

pub(crate) fn extract_ipv4(text: &str) -> Option<&str> {
    ipv4_re().find(text).map(|m| m.as_str())
}
