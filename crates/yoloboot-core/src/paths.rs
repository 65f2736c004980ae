use crate::error::{BootError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Filesystem contract
// ---------------------------------------------------------------------------

/// User configuration directory under `$HOME`; its existence is the
/// bootstrap marker — present means first-run setup already happened.
pub const CONFIG_DIR_NAME: &str = ".claude-yolo";

pub const DEFAULT_TEMPLATES_DIR: &str = "/opt/yoloboot/templates";
pub const DEFAULT_VPN_CONFIG_DIR: &str = "/etc/openvpn/client";
pub const DEFAULT_LOG_DIR: &str = "/workspace/logs";
pub const DEFAULT_HOST_GITCONFIG: &str = "/host/.gitconfig";

pub const SAFETY_LOG_FILE: &str = "safety.log";
pub const COMMANDS_DIR: &str = "commands";
pub const SERVICES_DIR: &str = "services";

// Environment overrides, used by tests and non-standard container layouts.
pub const ENV_HOME: &str = "YOLOBOOT_HOME";
pub const ENV_TEMPLATES: &str = "YOLOBOOT_TEMPLATES";
pub const ENV_VPN_DIR: &str = "YOLOBOOT_VPN_DIR";
pub const ENV_LOG_DIR: &str = "YOLOBOOT_LOG_DIR";
pub const ENV_HOST_GITCONFIG: &str = "YOLOBOOT_HOST_GITCONFIG";

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Resolved filesystem roots for one orchestrator run.
///
/// Built once at startup; stages receive this by reference instead of
/// re-reading ambient environment state mid-execution.
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub templates: PathBuf,
    pub vpn_config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub host_gitconfig: PathBuf,
}

impl Paths {
    /// Resolve roots from the environment, falling back to the container
    /// defaults. Fails only if no home directory can be determined.
    pub fn from_env() -> Result<Self> {
        let home = match std::env::var_os(ENV_HOME) {
            Some(h) => PathBuf::from(h),
            None => home::home_dir().ok_or(BootError::HomeNotFound)?,
        };
        let mut paths = Self::rooted(home);
        if let Some(p) = std::env::var_os(ENV_TEMPLATES) {
            paths.templates = PathBuf::from(p);
        }
        if let Some(p) = std::env::var_os(ENV_VPN_DIR) {
            paths.vpn_config_dir = PathBuf::from(p);
        }
        if let Some(p) = std::env::var_os(ENV_LOG_DIR) {
            paths.log_dir = PathBuf::from(p);
        }
        if let Some(p) = std::env::var_os(ENV_HOST_GITCONFIG) {
            paths.host_gitconfig = PathBuf::from(p);
        }
        Ok(paths)
    }

    /// Default container layout for a given home directory.
    pub fn rooted(home: PathBuf) -> Self {
        Self {
            home,
            templates: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            vpn_config_dir: PathBuf::from(DEFAULT_VPN_CONFIG_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            host_gitconfig: PathBuf::from(DEFAULT_HOST_GITCONFIG),
        }
    }

    /// Bootstrap marker and destination of materialized templates.
    pub fn config_dir(&self) -> PathBuf {
        self.home.join(CONFIG_DIR_NAME)
    }

    /// Git hook scripts installed by the materializer.
    pub fn hooks_dir(&self) -> PathBuf {
        self.config_dir().join("hooks")
    }

    /// Bundled helper scripts shipped with the templates.
    pub fn bundled_bin_dir(&self) -> PathBuf {
        self.config_dir().join("bin")
    }

    /// Where helper scripts are symlinked onto the search path.
    pub fn helper_bin_dir(&self) -> PathBuf {
        self.home.join(".local/bin")
    }

    pub fn gitconfig(&self) -> PathBuf {
        self.home.join(".gitconfig")
    }

    pub fn bashrc(&self) -> PathBuf {
        self.home.join(".bashrc")
    }

    pub fn safety_log(&self) -> PathBuf {
        self.log_dir.join(SAFETY_LOG_FILE)
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.log_dir.join(COMMANDS_DIR)
    }

    /// Per-invocation command log, named after the bootstrap start time.
    pub fn command_log(&self, started: DateTime<Utc>) -> PathBuf {
        self.commands_dir()
            .join(format!("commands-{}.log", started.format("%Y%m%d-%H%M%S")))
    }

    pub fn services_dir(&self) -> PathBuf {
        self.log_dir.join(SERVICES_DIR)
    }

    pub fn service_log(&self, service: &str) -> PathBuf {
        self.services_dir().join(format!("{service}.log"))
    }

    /// Named OpenVPN profile inside the read-only mount.
    pub fn vpn_config(&self, filename: &str) -> PathBuf {
        self.vpn_config_dir.join(filename)
    }

    /// Transient OpenVPN credentials file (owner-only permissions).
    pub fn openvpn_credentials(&self) -> PathBuf {
        self.config_dir().join("openvpn.auth")
    }

    /// Materialized cloudflared configuration files.
    pub fn cloudflared_dir(&self) -> PathBuf {
        self.config_dir().join("cloudflared")
    }

    pub fn tailscale_state_dir(&self) -> PathBuf {
        self.home.join(".local/state/tailscaled")
    }
}

/// `/sys/class/net` unless overridden; injected into interface probes so
/// tests can point them at a fabricated directory.
pub fn default_net_dir() -> &'static Path {
    Path::new("/sys/class/net")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let paths = Paths::rooted(PathBuf::from("/home/dev"));
        assert_eq!(
            paths.config_dir(),
            PathBuf::from("/home/dev/.claude-yolo")
        );
        assert_eq!(
            paths.hooks_dir(),
            PathBuf::from("/home/dev/.claude-yolo/hooks")
        );
        assert_eq!(
            paths.helper_bin_dir(),
            PathBuf::from("/home/dev/.local/bin")
        );
        assert_eq!(
            paths.safety_log(),
            PathBuf::from("/workspace/logs/safety.log")
        );
        assert_eq!(
            paths.service_log("tailscale"),
            PathBuf::from("/workspace/logs/services/tailscale.log")
        );
        assert_eq!(
            paths.vpn_config("office.ovpn"),
            PathBuf::from("/etc/openvpn/client/office.ovpn")
        );
    }

    #[test]
    fn command_log_is_timestamped() {
        let paths = Paths::rooted(PathBuf::from("/home/dev"));
        let t = chrono::DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            paths.command_log(t),
            PathBuf::from("/workspace/logs/commands/commands-20260301-093000.log")
        );
    }
}
