//! Optional service activators.
//!
//! Four structurally identical units — web terminal, Tailscale, OpenVPN,
//! cloudflared — each gated purely on environment-variable presence. They
//! are independent: a failure in one is reported and the next is still
//! attempted, and no ordering between them carries meaning.

pub mod cloudflared;
pub mod openvpn;
pub mod tailscale;
pub mod web_terminal;

use crate::config::{BootConfig, ServiceConfig};
use crate::paths::Paths;
use crate::stage::StageReport;

pub const SERVICE_NAMES: [&str; 4] = [
    web_terminal::STAGE,
    tailscale::STAGE,
    openvpn::STAGE,
    cloudflared::STAGE,
];

/// Run all four activators in sequence. Never fails as a whole: per-service
/// problems come back as `Failed` reports.
pub async fn activate_all(paths: &Paths, config: &BootConfig) -> Vec<StageReport> {
    vec![
        web_terminal::activate(paths, &config.web_terminal).await,
        tailscale::activate(paths, &config.tailscale).await,
        openvpn::activate(paths, &config.openvpn).await,
        cloudflared::activate(paths, &config.cloudflared).await,
    ]
}

/// Shared gate handling: turn `Disabled`/`Malformed` into their reports so
/// each activator only writes the `Enabled` path.
fn gated<'a, T>(
    stage: &'static str,
    cfg: &'a ServiceConfig<T>,
    absent_detail: &str,
) -> Result<&'a T, StageReport> {
    match cfg {
        ServiceConfig::Disabled => Err(StageReport::skipped(stage, absent_detail)),
        ServiceConfig::Malformed { reason } => Err(StageReport::failed(stage, reason.clone())),
        ServiceConfig::Enabled(cfg) => Ok(cfg),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageStatus;
    use tempfile::TempDir;

    fn test_paths(dir: &TempDir) -> Paths {
        let mut paths = Paths::rooted(dir.path().join("home"));
        paths.log_dir = dir.path().join("logs");
        paths.vpn_config_dir = dir.path().join("vpn");
        std::fs::create_dir_all(&paths.vpn_config_dir).unwrap();
        paths
    }

    fn lookup(vars: &[(&str, &str)]) -> BootConfig {
        let map: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BootConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[tokio::test]
    async fn all_skipped_when_nothing_enabled() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        let reports = activate_all(&paths, &lookup(&[])).await;

        assert_eq!(reports.len(), 4);
        for report in &reports {
            assert_eq!(report.status, StageStatus::Skipped, "{}", report.stage);
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        // OpenVPN references a profile that does not exist in the mount.
        let config = lookup(&[("OPENVPN_CONFIG", "missing.ovpn")]);

        let reports = activate_all(&paths, &config).await;
        assert_eq!(reports.len(), 4, "every activator must be attempted");

        let openvpn = reports.iter().find(|r| r.stage == openvpn::STAGE).unwrap();
        assert_eq!(openvpn.status, StageStatus::Failed);
        assert!(openvpn.detail.contains("missing.ovpn"));

        let cloudflared = reports
            .iter()
            .find(|r| r.stage == cloudflared::STAGE)
            .unwrap();
        assert_eq!(cloudflared.status, StageStatus::Skipped);
    }

    #[tokio::test]
    async fn malformed_value_fails_only_its_own_service() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        let config = lookup(&[
            ("WEBTERMINAL_ENABLED", "true"),
            ("WEBTERMINAL_PORT", "not-a-port"),
        ]);

        let reports = activate_all(&paths, &config).await;
        let wt = reports
            .iter()
            .find(|r| r.stage == web_terminal::STAGE)
            .unwrap();
        assert_eq!(wt.status, StageStatus::Failed);
        assert!(wt.detail.contains("WEBTERMINAL_PORT"));

        for report in reports.iter().filter(|r| r.stage != web_terminal::STAGE) {
            assert_eq!(report.status, StageStatus::Skipped);
        }
    }

    #[test]
    fn gate_maps_disabled_and_malformed_to_reports() {
        let disabled: ServiceConfig<u16> = ServiceConfig::Disabled;
        let report = gated("web-terminal", &disabled, "FOO not set").unwrap_err();
        assert_eq!(report.status, StageStatus::Skipped);
        assert_eq!(report.detail, "FOO not set");

        let malformed: ServiceConfig<u16> = ServiceConfig::Malformed {
            reason: "FOO is not a valid port".to_string(),
        };
        let report = gated("web-terminal", &malformed, "FOO not set").unwrap_err();
        assert_eq!(report.status, StageStatus::Failed);

        let enabled: ServiceConfig<u16> = ServiceConfig::Enabled(7681);
        assert_eq!(gated("web-terminal", &enabled, "FOO not set").unwrap(), &7681);
    }
}
