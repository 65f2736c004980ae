//! Environment diagnostics: is this container able to run the bootstrap
//! and the services the environment asks for?

use crate::output;
use serde::Serialize;
use std::net::TcpListener;
use yoloboot_core::config::ServiceConfig;
use yoloboot_core::{BootConfig, Paths};

#[derive(Debug, Serialize)]
struct Check {
    name: String,
    passed: bool,
    /// Required checks fail the command; optional ones only inform.
    required: bool,
    recommendation: String,
}

impl Check {
    fn new(name: &str, passed: bool, required: bool, recommendation: &str) -> Self {
        Self {
            name: name.to_string(),
            passed,
            required,
            recommendation: recommendation.to_string(),
        }
    }
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let paths = Paths::from_env()?;
    let config = BootConfig::from_env();
    let checks = collect(&paths, &config);

    if json {
        output::print_json(&checks)?;
    } else {
        output::print_table(
            &["CHECK", "STATUS", "RECOMMENDATION"],
            checks
                .iter()
                .map(|c| {
                    vec![
                        c.name.clone(),
                        if c.passed { "pass" } else { "FAIL" }.to_string(),
                        if c.passed {
                            "-".to_string()
                        } else {
                            c.recommendation.clone()
                        },
                    ]
                })
                .collect(),
        );
    }

    let failed_required = checks.iter().filter(|c| !c.passed && c.required).count();
    if failed_required > 0 {
        anyhow::bail!("{failed_required} required check(s) failed");
    }
    Ok(())
}

fn collect(paths: &Paths, config: &BootConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(Check::new(
        "git on PATH",
        binary_present("git"),
        true,
        "install git in the image",
    ));
    checks.push(Check::new(
        "template directory present",
        paths.templates.is_dir() || paths.config_dir().is_dir(),
        true,
        "mount the template bundle or re-build the image",
    ));
    checks.push(Check::new(
        "home directory writable",
        home_writable(paths),
        true,
        "fix ownership of the home volume",
    ));

    if let ServiceConfig::Enabled(wt) = &config.web_terminal {
        checks.push(Check::new(
            "ttyd on PATH",
            binary_present("ttyd"),
            true,
            "install ttyd or unset WEBTERMINAL_ENABLED",
        ));
        checks.push(Check::new(
            "tmux on PATH",
            binary_present("tmux"),
            true,
            "install tmux or unset WEBTERMINAL_ENABLED",
        ));
        checks.push(Check::new(
            &format!("port {} available", wt.port),
            port_bindable(wt.port),
            false,
            "another process holds the port (or the web terminal is already running)",
        ));
    }

    if config.tailscale.is_enabled() {
        checks.push(Check::new(
            "tailscaled on PATH",
            binary_present("tailscaled"),
            true,
            "install tailscale or unset TS_AUTHKEY",
        ));
        checks.push(Check::new(
            "tailscale on PATH",
            binary_present("tailscale"),
            true,
            "install tailscale or unset TS_AUTHKEY",
        ));
    }

    if let ServiceConfig::Enabled(vpn) = &config.openvpn {
        checks.push(Check::new(
            "openvpn on PATH",
            binary_present("openvpn"),
            true,
            "install openvpn or unset OPENVPN_CONFIG",
        ));
        checks.push(Check::new(
            &format!("profile {} present", vpn.config_name),
            paths.vpn_config(&vpn.config_name).is_file(),
            true,
            "mount the profile into the VPN config directory",
        ));
    }

    if config.cloudflared.is_enabled() {
        checks.push(Check::new(
            "cloudflared on PATH",
            binary_present("cloudflared"),
            true,
            "install cloudflared or unset its variables",
        ));
    }

    checks
}

fn binary_present(binary: &str) -> bool {
    which::which(binary).is_ok()
}

fn home_writable(paths: &Paths) -> bool {
    let probe = paths.home.join(".yoloboot-doctor");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

fn port_bindable(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> BootConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BootConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn base_checks_only_when_nothing_enabled() {
        let dir = TempDir::new().unwrap();
        let mut paths = Paths::rooted(dir.path().join("home"));
        paths.templates = dir.path().join("templates");
        std::fs::create_dir_all(&paths.home).unwrap();
        std::fs::create_dir_all(&paths.templates).unwrap();

        let checks = collect(&paths, &lookup(&[]));
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.required));
    }

    #[test]
    fn enabled_services_add_checks() {
        let dir = TempDir::new().unwrap();
        let mut paths = Paths::rooted(dir.path().join("home"));
        paths.vpn_config_dir = dir.path().join("vpn");
        std::fs::create_dir_all(&paths.home).unwrap();

        let checks = collect(
            &paths,
            &lookup(&[
                ("WEBTERMINAL_ENABLED", "true"),
                ("OPENVPN_CONFIG", "office.ovpn"),
            ]),
        );
        assert!(checks.iter().any(|c| c.name.contains("ttyd")));
        assert!(checks.iter().any(|c| c.name.contains("office.ovpn")));
        // The missing profile must be flagged.
        let profile = checks
            .iter()
            .find(|c| c.name.contains("office.ovpn"))
            .unwrap();
        assert!(!profile.passed);
    }

    #[test]
    fn missing_template_dir_fails_unless_already_materialized() {
        let dir = TempDir::new().unwrap();
        let mut paths = Paths::rooted(dir.path().join("home"));
        paths.templates = dir.path().join("nope");
        std::fs::create_dir_all(&paths.home).unwrap();

        let checks = collect(&paths, &lookup(&[]));
        let templates = checks
            .iter()
            .find(|c| c.name.contains("template"))
            .unwrap();
        assert!(!templates.passed);

        // An already-materialized config dir satisfies the check.
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        let checks = collect(&paths, &lookup(&[]));
        let templates = checks
            .iter()
            .find(|c| c.name.contains("template"))
            .unwrap();
        assert!(templates.passed);
    }
}
