//! OpenVPN activator.
//!
//! Validates the named profile inside the read-only mount, optionally
//! writes a transient credentials file (owner-only permissions, removed on
//! every failure path), and launches the daemon. Readiness is the
//! appearance of a `tun`/`tap` interface, which can take a while on slow
//! links — this probe gets the longest deadline of the four services.

use crate::config::{BasicAuth, OpenVpnConfig, ServiceConfig};
use crate::paths::{default_net_dir, Paths};
use crate::services::tailscale::extract_ipv4;
use crate::stage::StageReport;
use daemon_host::{find_interface, run_capture, wait_ready, DaemonHandle, DaemonSpec, Probe, ReadyPoll};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub const STAGE: &str = "openvpn";

const INTERFACE_DEADLINE: Duration = Duration::from_secs(15);

pub async fn activate(paths: &Paths, cfg: &ServiceConfig<OpenVpnConfig>) -> StageReport {
    let cfg = match super::gated(STAGE, cfg, "OPENVPN_CONFIG not set") {
        Ok(cfg) => cfg,
        Err(report) => return report,
    };

    let config_path = paths.vpn_config(&cfg.config_name);
    if !config_path.is_file() {
        // No launch attempt and no credentials file for a dangling profile.
        return StageReport::failed(
            STAGE,
            format!("OpenVPN config not found: {}", config_path.display()),
        );
    }

    let credentials = match &cfg.auth {
        None => None,
        Some(auth) => {
            let path = paths.openvpn_credentials();
            if let Err(e) = write_credentials(&path, auth) {
                return StageReport::failed(
                    STAGE,
                    format!("failed to write credentials file: {e}"),
                );
            }
            Some(path)
        }
    };

    match launch(paths, &config_path, credentials.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            // The secret must not outlive a failed activation.
            if let Some(path) = &credentials {
                let _ = std::fs::remove_file(path);
            }
            StageReport::failed(STAGE, e.to_string())
        }
    }
}

async fn launch(
    paths: &Paths,
    config_path: &Path,
    credentials: Option<&Path>,
) -> daemon_host::Result<StageReport> {
    let mut spec = DaemonSpec::new(STAGE, "openvpn", paths.service_log(STAGE)).args([
        "--config".to_string(),
        config_path.to_string_lossy().into_owned(),
        "--auth-nocache".to_string(),
    ]);
    if let Some(credentials) = credentials {
        spec = spec.args([
            "--auth-user-pass".to_string(),
            credentials.to_string_lossy().into_owned(),
        ]);
    }

    let mut handle = DaemonHandle::spawn(&spec)?;
    let net_dir = default_net_dir();
    wait_ready(
        &mut handle,
        &Probe::InterfacePrefix("tun".to_string()),
        &ReadyPoll::with_deadline(INTERFACE_DEADLINE),
        net_dir,
    )
    .await?;
    handle.detach();

    // Interface is up; the address may still be mid-negotiation.
    let interface = find_interface(net_dir, "tun").unwrap_or_else(|| "tun0".to_string());
    Ok(match interface_address(&interface).await {
        Some(addr) => StageReport::ok(
            STAGE,
            format!("connected on {interface}, address {addr}"),
        ),
        None => StageReport::warn(
            STAGE,
            format!("interface {interface} up, address pending"),
        ),
    })
}

async fn interface_address(interface: &str) -> Option<String> {
    let out = run_capture(
        "ip addr",
        "ip",
        &[
            "-4".to_string(),
            "addr".to_string(),
            "show".to_string(),
            "dev".to_string(),
            interface.to_string(),
        ],
    )
    .await
    .ok()?;
    extract_ipv4(&out).map(str::to_string)
}

/// Write `user\npass\n` with owner-only permissions. The restrictive mode
/// is applied at creation and re-applied afterwards in case the file
/// already existed with looser bits.
fn write_credentials(path: &Path, auth: &BasicAuth) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut options = std::fs::OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut f = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    writeln!(f, "{}", auth.user)?;
    writeln!(f, "{}", auth.pass)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
