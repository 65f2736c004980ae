//! Best-effort view of the four optional services: whether the environment
//! enables them, and what the system looks like right now.

use crate::output;
use serde::Serialize;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use yoloboot_core::config::{ServiceConfig, TunnelSource};
use yoloboot_core::services::{cloudflared, openvpn, tailscale, web_terminal};
use yoloboot_core::{BootConfig, Paths};

#[derive(Debug, Serialize)]
struct ServiceRow {
    service: &'static str,
    enabled: bool,
    state: String,
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let paths = Paths::from_env()?;
    let config = BootConfig::from_env();
    let rows = collect(&paths, &config);

    if json {
        output::print_json(&rows)?;
    } else {
        output::print_table(
            &["SERVICE", "ENABLED", "STATE"],
            rows.iter()
                .map(|r| {
                    vec![
                        r.service.to_string(),
                        if r.enabled { "yes" } else { "no" }.to_string(),
                        r.state.clone(),
                    ]
                })
                .collect(),
        );
    }
    Ok(())
}

fn collect(paths: &Paths, config: &BootConfig) -> Vec<ServiceRow> {
    let web_terminal = match &config.web_terminal {
        ServiceConfig::Disabled => disabled_row(web_terminal::STAGE),
        ServiceConfig::Malformed { reason } => malformed_row(web_terminal::STAGE, reason),
        ServiceConfig::Enabled(wt) => ServiceRow {
            service: web_terminal::STAGE,
            enabled: true,
            state: if port_listening(wt.port) {
                format!("listening on {}", wt.port)
            } else {
                format!("not listening on {}", wt.port)
            },
        },
    };

    let tailscale = match &config.tailscale {
        ServiceConfig::Disabled => disabled_row(tailscale::STAGE),
        ServiceConfig::Malformed { reason } => malformed_row(tailscale::STAGE, reason),
        ServiceConfig::Enabled(_) => ServiceRow {
            service: tailscale::STAGE,
            enabled: true,
            state: tailscale_state(),
        },
    };

    let openvpn = match &config.openvpn {
        ServiceConfig::Disabled => disabled_row(openvpn::STAGE),
        ServiceConfig::Malformed { reason } => malformed_row(openvpn::STAGE, reason),
        ServiceConfig::Enabled(vpn) => ServiceRow {
            service: openvpn::STAGE,
            enabled: true,
            state: if daemon_host::interface_present(yoloboot_core::paths::default_net_dir(), "tun")
            {
                "tun interface up".to_string()
            } else if paths.vpn_config(&vpn.config_name).is_file() {
                "no tun interface".to_string()
            } else {
                format!("profile missing: {}", vpn.config_name)
            },
        },
    };

    let cloudflared = match &config.cloudflared {
        ServiceConfig::Disabled => disabled_row(cloudflared::STAGE),
        ServiceConfig::Malformed { reason } => malformed_row(cloudflared::STAGE, reason),
        ServiceConfig::Enabled(cf) => ServiceRow {
            service: cloudflared::STAGE,
            enabled: true,
            // The tunnel endpoint lives on Cloudflare's side; without a
            // metrics port there is nothing local to probe.
            state: match (cf.metrics_port, &cf.source) {
                (Some(port), _) if port_listening(port) => {
                    format!("metrics listening on {port}")
                }
                (Some(port), _) => format!("metrics not listening on {port}"),
                (None, TunnelSource::Token(_)) => "unknown (token tunnel)".to_string(),
                (None, TunnelSource::ConfigFile(_)) => "unknown (config tunnel)".to_string(),
            },
        },
    };

    vec![web_terminal, tailscale, openvpn, cloudflared]
}

fn disabled_row(service: &'static str) -> ServiceRow {
    ServiceRow {
        service,
        enabled: false,
        state: "-".to_string(),
    }
}

fn malformed_row(service: &'static str, reason: &str) -> ServiceRow {
    ServiceRow {
        service,
        enabled: true,
        state: format!("misconfigured: {reason}"),
    }
}

fn port_listening(port: u16) -> bool {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    TcpStream::connect_timeout(&addr, Duration::from_millis(300)).is_ok()
}

fn tailscale_state() -> String {
    let output = std::process::Command::new("tailscale")
        .args(["ip", "-4"])
        .output();
    match output {
        Err(_) => "tailscale not installed".to_string(),
        Ok(out) if !out.status.success() => "daemon not reachable".to_string(),
        Ok(out) => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            match stdout.lines().next() {
                Some(addr) if !addr.trim().is_empty() => {
                    format!("address {}", addr.trim())
                }
                _ => "no address assigned".to_string(),
            }
        }
    }
}
